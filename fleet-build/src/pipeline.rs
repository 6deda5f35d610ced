//! Fleet build entrypoint used by the CLI.
//!
//! For every registry-listed project, in sorted order:
//! inclusion filter → resolve → materialize → dispatch. A failure in any
//! stage is logged and recorded, and the loop moves on. Only the initial
//! listing fetch (and creating the output directory) can fail the run; an
//! unreadable manifest is set aside and rebuilt from scratch.

use std::fmt;

use fleet_core::{FleetConfig, ProjectDescriptor, ProjectName, RegistryClient};

use crate::dispatcher::{ArchReport, ArchResult, BuildCommand, Dispatcher};
use crate::error::{io_err, BuildError};
use crate::manifest::Manifest;
use crate::materializer::{Materializer, SourceControl};
use crate::process::CommandRunner;
use crate::resolver::Resolver;

/// Pipeline stage a project failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Clone,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => write!(f, "resolve"),
            Stage::Clone => write!(f, "clone"),
        }
    }
}

#[derive(Debug)]
pub enum ProjectOutcome {
    /// Not in the inclusion set; no I/O was done for it.
    Filtered,
    Failed { stage: Stage, error: BuildError },
    Processed {
        descriptor: ProjectDescriptor,
        architectures: Vec<ArchReport>,
    },
}

#[derive(Debug)]
pub struct ProjectReport {
    pub name: ProjectName,
    pub outcome: ProjectOutcome,
}

/// Everything a run did, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub host_os: String,
    pub projects: Vec<ProjectReport>,
}

impl RunReport {
    /// Projects that passed the inclusion filter.
    pub fn in_scope(&self) -> impl Iterator<Item = &ProjectReport> {
        self.projects
            .iter()
            .filter(|p| !matches!(p.outcome, ProjectOutcome::Filtered))
    }

    pub fn arch_results(&self) -> impl Iterator<Item = (&ProjectName, &ArchReport)> {
        self.projects.iter().flat_map(|p| match &p.outcome {
            ProjectOutcome::Processed { architectures, .. } => {
                architectures.iter().map(|a| (&p.name, a)).collect::<Vec<_>>()
            }
            _ => Vec::new(),
        })
    }

    pub fn built_count(&self) -> usize {
        self.arch_results()
            .filter(|(_, a)| matches!(a.result, ArchResult::Built { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        let project_failures = self
            .projects
            .iter()
            .filter(|p| matches!(p.outcome, ProjectOutcome::Failed { .. }))
            .count();
        let arch_failures = self
            .arch_results()
            .filter(|(_, a)| matches!(a.result, ArchResult::Failed(_)))
            .count();
        project_failures + arch_failures
    }
}

/// External collaborators of a run.
pub struct Collaborators<'a> {
    pub registry: &'a dyn RegistryClient,
    pub source: &'a dyn SourceControl,
    pub runner: &'a dyn CommandRunner,
}

/// Run the fleet build for `host_os`.
///
/// `config` paths must already be resolved (see
/// [`FleetConfig::resolve_paths`]).
pub fn run(
    config: &FleetConfig,
    host_os: &str,
    collaborators: &Collaborators<'_>,
    dry_run: bool,
) -> Result<RunReport, BuildError> {
    let mut names = collaborators.registry.fetch_all_project_names()?;
    names.sort();
    names.dedup();

    if !dry_run {
        std::fs::create_dir_all(&config.output_dir).map_err(|e| io_err(&config.output_dir, e))?;
    }
    let mut manifest = Manifest::load_or_reset(&config.output_dir, !dry_run)?;

    let resolver = Resolver::from_config(config);
    let materializer = Materializer::new(&config.work_dir, collaborators.source);
    let configurations = config.targets.configurations_for(host_os);
    if configurations.is_empty() {
        tracing::warn!("no target architectures configured for host OS '{host_os}'");
    }
    let dispatcher = Dispatcher {
        runner: collaborators.runner,
        configurations: &configurations,
        build_output_dir: &config.build_output_dir,
        timeout: config.build_timeout(),
        dry_run,
    };

    let mut report = RunReport {
        host_os: host_os.to_string(),
        projects: Vec::with_capacity(names.len()),
    };

    for name in names {
        let outcome = process_project(
            &name,
            config,
            collaborators.registry,
            &resolver,
            &materializer,
            &dispatcher,
            &mut manifest,
        );
        report.projects.push(ProjectReport { name, outcome });
    }

    Ok(report)
}

fn process_project(
    name: &ProjectName,
    config: &FleetConfig,
    registry: &dyn RegistryClient,
    resolver: &Resolver,
    materializer: &Materializer<'_>,
    dispatcher: &Dispatcher<'_>,
    manifest: &mut Manifest,
) -> ProjectOutcome {
    if !resolver.should_process(name) {
        tracing::debug!(project = %name, "not included, skipping");
        return ProjectOutcome::Filtered;
    }

    let descriptor = match resolver.resolve(name, registry) {
        Ok(d) => d,
        Err(error) => {
            tracing::warn!(project = %name, "{error}");
            return ProjectOutcome::Failed {
                stage: Stage::Resolve,
                error,
            };
        }
    };

    let checkout = if dispatcher.dry_run {
        materializer.checkout_dir(&descriptor)
    } else {
        match materializer.ensure_cloned(&descriptor) {
            Ok(dir) => dir,
            Err(error) => {
                tracing::warn!(project = %name, "{error}");
                return ProjectOutcome::Failed {
                    stage: Stage::Clone,
                    error,
                };
            }
        }
    };

    let command = BuildCommand::detect(&config.override_script_path(name));
    let architectures = dispatcher.build(&descriptor, &checkout, &command, manifest);
    ProjectOutcome::Processed {
        descriptor,
        architectures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandSpec, ProcessError};
    use fleet_core::RegistryError;
    use std::path::Path;
    use tempfile::TempDir;

    struct DownRegistry;

    impl RegistryClient for DownRegistry {
        fn fetch_all_project_names(&self) -> Result<Vec<ProjectName>, RegistryError> {
            Err(RegistryError::Network {
                url: "test://".into(),
                detail: "connection refused".into(),
            })
        }

        fn fetch_project_detail(
            &self,
            _name: &ProjectName,
        ) -> Result<ProjectDescriptor, RegistryError> {
            unreachable!("listing failed first")
        }
    }

    struct NoSource;

    impl SourceControl for NoSource {
        fn clone_repo(&self, _: &str, _: &str, _: &Path) -> Result<(), String> {
            unreachable!()
        }
    }

    struct NoRunner;

    impl CommandRunner for NoRunner {
        fn run(&self, _: &CommandSpec) -> Result<(), ProcessError> {
            unreachable!()
        }
    }

    #[test]
    fn listing_failure_fails_the_run() {
        let work = TempDir::new().unwrap();
        let config = FleetConfig {
            work_dir: work.path().to_path_buf(),
            ..FleetConfig::default()
        }
        .resolve_paths();
        let collaborators = Collaborators {
            registry: &DownRegistry,
            source: &NoSource,
            runner: &NoRunner,
        };
        let err = run(&config, "linux", &collaborators, false).unwrap_err();
        assert!(matches!(err, BuildError::Registry(RegistryError::Network { .. })));
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Resolve.to_string(), "resolve");
        assert_eq!(Stage::Clone.to_string(), "clone");
    }
}
