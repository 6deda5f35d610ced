//! `fleet.yaml` — run configuration.
//!
//! # Resolution
//!
//! Built-in defaults ← optional YAML file ← CLI flags. Relative directories
//! are resolved against `work_dir`; nothing in the run depends on the
//! process's current directory after [`FleetConfig::resolve_paths`].
//!
//! ```yaml
//! registry_url: https://chains.cosmos.directory/
//! include: [juno, osmosis]
//! overrides:
//!   juno:
//!     daemon_name: junod
//!     git_repo: https://github.com/CosmosContracts/juno
//!     recommended_version: v3.1.0
//! targets:
//!   linux: [amd64]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::DEFAULT_REGISTRY_URL;
use crate::target::TargetMatrix;
use crate::types::{ProjectDescriptor, ProjectName};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "fleet.yaml";

const DEFAULT_INCLUDE: &[&str] = &[
    "agoric",
    "akash",
    "bitsong",
    "bostrom",
    "cerberus",
    "cheqd",
    "cosmoshub",
    "cryptoorgchain",
    "desmos",
    "fetchhub",
    "gravitybridge",
    "juno",
    "lumnetwork",
    "osmosis",
    "persistence",
    "regen",
    "rizon",
    "secretnetwork",
    "sentinel",
    "stargaze",
    "terra",
    "umee",
];

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// A pinned override entry. The map key supplies the project name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub daemon_name: String,
    pub git_repo: String,
    pub recommended_version: String,
}

impl OverrideEntry {
    pub fn to_descriptor(&self, name: &ProjectName) -> ProjectDescriptor {
        ProjectDescriptor {
            name: name.clone(),
            daemon_name: self.daemon_name.clone(),
            git_repo: self.git_repo.clone(),
            recommended_version: self.recommended_version.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub registry_url: String,
    /// Projects eligible for processing; everything else is skipped before
    /// any I/O.
    pub include: BTreeSet<ProjectName>,
    pub overrides: BTreeMap<ProjectName, OverrideEntry>,
    pub targets: TargetMatrix,
    /// Directory holding one checkout per project.
    pub work_dir: PathBuf,
    /// Shared artifact directory, relative to `work_dir` unless absolute.
    pub output_dir: PathBuf,
    /// Per-project build scripts, relative to `work_dir` unless absolute.
    pub override_dir: PathBuf,
    /// Extension of override scripts, without the dot.
    pub override_ext: String,
    /// Where the build tool leaves its binary, relative to the checkout.
    pub build_output_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub clone_timeout_secs: u64,
    pub build_timeout_secs: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            ProjectName::from("juno"),
            OverrideEntry {
                daemon_name: "junod".to_string(),
                git_repo: "https://github.com/CosmosContracts/juno".to_string(),
                recommended_version: "v3.1.0".to_string(),
            },
        );
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            include: DEFAULT_INCLUDE.iter().map(|n| ProjectName::from(*n)).collect(),
            overrides,
            targets: TargetMatrix::default(),
            work_dir: PathBuf::from("."),
            output_dir: PathBuf::from("release-builds"),
            override_dir: PathBuf::from("../override-build-files"),
            override_ext: "sh".to_string(),
            build_output_dir: PathBuf::from("build"),
            http_timeout_secs: 30,
            clone_timeout_secs: 600,
            build_timeout_secs: 3600,
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

impl FleetConfig {
    /// Load `path`. A missing file is an error; see [`FleetConfig::load_or_default`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: FleetConfig =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry_url.trim().is_empty() {
            return Err(ConfigError::Invalid("registry_url is empty".into()));
        }
        for (os, archs) in &self.targets.0 {
            if archs.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "target OS '{os}' lists no architectures"
                )));
            }
        }
        for (name, entry) in &self.overrides {
            if let Some(field) = entry.to_descriptor(name).missing_field() {
                return Err(ConfigError::Invalid(format!(
                    "override for '{name}' has an empty {field}"
                )));
            }
        }
        if self.override_ext.starts_with('.') {
            return Err(ConfigError::Invalid(
                "override_ext must not start with '.'".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // 3. Derived values
    // -----------------------------------------------------------------------

    /// Rebase relative `output_dir` and `override_dir` onto `work_dir`.
    pub fn resolve_paths(mut self) -> Self {
        if self.output_dir.is_relative() {
            self.output_dir = self.work_dir.join(&self.output_dir);
        }
        if self.override_dir.is_relative() {
            self.override_dir = self.work_dir.join(&self.override_dir);
        }
        self
    }

    /// Every override as the descriptor it pins.
    pub fn override_descriptors(&self) -> BTreeMap<ProjectName, ProjectDescriptor> {
        self.overrides
            .iter()
            .map(|(name, entry)| (name.clone(), entry.to_descriptor(name)))
            .collect()
    }

    /// `{override_dir}/{name}.{override_ext}`
    pub fn override_script_path(&self, name: &ProjectName) -> PathBuf {
        self.override_dir
            .join(format!("{}.{}", name.0, self.override_ext))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
