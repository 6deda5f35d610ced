//! Artifact naming.
//!
//! Output files are named `{daemon}-{os}-{arch}-{version}{ext}`. The name is
//! only used for humans and for recognising artifacts from older runs; the
//! authoritative existence check lives in the build manifest, which is keyed
//! by [`ArtifactKey`] field-by-field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::target::BuildConfiguration;
use crate::types::ProjectDescriptor;

/// Identity of one built binary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub daemon: String,
    pub os: String,
    pub arch: String,
    pub version: String,
}

impl ArtifactKey {
    pub fn new(
        daemon: impl Into<String>,
        os: impl Into<String>,
        arch: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            daemon: daemon.into(),
            os: os.into(),
            arch: arch.into(),
            version: version.into(),
        }
    }

    pub fn for_build(descriptor: &ProjectDescriptor, config: &BuildConfiguration) -> Self {
        Self::new(
            descriptor.daemon_name.as_str(),
            config.os.as_str(),
            config.arch.as_str(),
            descriptor.recommended_version.as_str(),
        )
    }

    /// `{daemon}-{os}-{arch}-{version}` without extension.
    pub fn prefix(&self) -> String {
        format!("{}-{}-{}-{}", self.daemon, self.os, self.arch, self.version)
    }

    pub fn file_name(&self, extension: &str) -> String {
        name_for(&self.daemon, &self.os, &self.arch, &self.version, extension)
    }

    /// Whether `file_name` is this artifact's name, bare or followed by a
    /// single extension whose first character is not a digit. `v1.2` and
    /// `v10` never match a key for `v1`.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let prefix = self.prefix();
        match file_name.strip_prefix(prefix.as_str()) {
            Some("") => true,
            Some(rest) => rest
                .strip_prefix('.')
                .filter(|ext| !ext.contains('.'))
                .and_then(|ext| ext.chars().next())
                .is_some_and(|c| !c.is_ascii_digit()),
            None => false,
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}, {})",
            self.daemon, self.version, self.os, self.arch
        )
    }
}

/// `name_for("gaiad", "linux", "amd64", "v1.2.3", ".exe")` →
/// `"gaiad-linux-amd64-v1.2.3.exe"`.
pub fn name_for(daemon: &str, os: &str, arch: &str, version: &str, extension: &str) -> String {
    format!("{daemon}-{os}-{arch}-{version}{extension}")
}

/// Extension of the final path element including the leading dot, or `""`.
/// `"gaiad.exe"` → `".exe"`, `"gaiad"` → `""`, `"a.tar.gz"` → `".gz"`.
pub fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) => &file_name[idx..],
        None => "",
    }
}
