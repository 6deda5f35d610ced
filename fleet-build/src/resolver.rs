//! Inclusion filter and override resolution.

use std::collections::{BTreeMap, BTreeSet};

use fleet_core::{FleetConfig, ProjectDescriptor, ProjectName, RegistryClient};

use crate::error::BuildError;

/// Decides which projects are in scope and where their metadata comes from.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    include: BTreeSet<ProjectName>,
    overrides: BTreeMap<ProjectName, ProjectDescriptor>,
}

impl Resolver {
    pub fn new(
        include: BTreeSet<ProjectName>,
        overrides: BTreeMap<ProjectName, ProjectDescriptor>,
    ) -> Self {
        Self { include, overrides }
    }

    pub fn from_config(config: &FleetConfig) -> Self {
        Self::new(config.include.clone(), config.override_descriptors())
    }

    /// Pure lookup; callers must consult this before any I/O for `name`.
    pub fn should_process(&self, name: &ProjectName) -> bool {
        self.include.contains(name)
    }

    /// Override entry verbatim if one exists, otherwise the registry's
    /// detail. Either way the result must carry repo, daemon and version.
    pub fn resolve(
        &self,
        name: &ProjectName,
        registry: &dyn RegistryClient,
    ) -> Result<ProjectDescriptor, BuildError> {
        let descriptor = match self.overrides.get(name) {
            Some(pinned) => {
                tracing::debug!(project = %name, "using pinned override");
                pinned.clone()
            }
            None => registry.fetch_project_detail(name)?,
        };
        match descriptor.missing_field() {
            Some(field) => Err(BuildError::IncompleteMetadata {
                project: name.clone(),
                field,
            }),
            None => Ok(descriptor),
        }
    }
}
