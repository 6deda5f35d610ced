//! Error types for fleet-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the project registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Transport failure, timeout, or a non-success HTTP status.
    #[error("network error fetching {url}: {detail}")]
    Network { url: String, detail: String },

    /// The registry answered but the payload did not decode.
    #[error("malformed registry payload from {url}: {detail}")]
    Decode { url: String, detail: String },
}

/// Failures loading or validating `fleet.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
