//! Error types for fleet-build.

use std::path::PathBuf;

use thiserror::Error;

use fleet_core::{DescriptorField, ProjectName, RegistryError};

/// Everything that can go wrong while processing one project (or one
/// architecture of it). None of these abort the run on their own.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Registry fetch or decode failure.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The resolved descriptor lacks a field the build needs.
    #[error("no {field} found for {project}")]
    IncompleteMetadata {
        project: ProjectName,
        field: DescriptorField,
    },

    /// The clone exited non-zero, timed out, or could not be spawned.
    #[error("git clone failed for {project} ({url}): {detail}")]
    Clone {
        project: ProjectName,
        url: String,
        detail: String,
    },

    /// The build command exited non-zero, timed out, or could not be spawned.
    #[error("build failed for {project} ({os}, {arch}): {detail}")]
    Build {
        project: ProjectName,
        os: String,
        arch: String,
        detail: String,
    },

    /// The build tool's output contract was violated: it must leave exactly
    /// one file behind.
    #[error("{project}: expected exactly one binary in {dir}, found {found}")]
    AmbiguousOutput {
        project: ProjectName,
        dir: PathBuf,
        found: usize,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest JSON serialization/deserialization error.
    #[error("manifest JSON error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Convenience constructor for [`BuildError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BuildError {
    BuildError::Io {
        path: path.into(),
        source,
    }
}
