//! Host OS → architecture matrix.
//!
//! Only the current host's row is ever built: the build tool runs natively
//! on the target OS, so foreign-OS rows are never attempted in a run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered architectures per OS, using the build tool's names
/// (`linux`, `darwin`, `windows`; `amd64`, `arm64`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetMatrix(pub BTreeMap<String, Vec<String>>);

impl Default for TargetMatrix {
    fn default() -> Self {
        let mut m = BTreeMap::new();
        m.insert("linux".to_string(), vec!["amd64".to_string()]);
        m.insert(
            "darwin".to_string(),
            vec!["amd64".to_string(), "arm64".to_string()],
        );
        m.insert("windows".to_string(), vec!["amd64".to_string()]);
        Self(m)
    }
}

impl TargetMatrix {
    /// Architectures for `os`, in declaration order. Unknown OS → empty.
    pub fn architectures_for(&self, os: &str) -> &[String] {
        self.0.get(os).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Per-host configurations for one run.
    pub fn configurations_for(&self, os: &str) -> Vec<BuildConfiguration> {
        self.architectures_for(os)
            .iter()
            .map(|arch| BuildConfiguration::new(os, arch.as_str()))
            .collect()
    }
}

/// The running host's OS in build-tool naming.
pub fn host_os() -> &'static str {
    build_tool_os(std::env::consts::OS)
}

/// Maps Rust's `std::env::consts::OS` values to build-tool names.
pub fn build_tool_os(rust_os: &str) -> &str {
    match rust_os {
        "macos" => "darwin",
        other => other,
    }
}

/// One (OS, architecture) pair handed to a single build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub os: String,
    pub arch: String,
}

impl BuildConfiguration {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Environment selectors added on top of the inherited environment.
    pub fn env_vars(&self) -> [(&'static str, &str); 2] {
        [("GOOS", self.os.as_str()), ("GOARCH", self.arch.as_str())]
    }
}
