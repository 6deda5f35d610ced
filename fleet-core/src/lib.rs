//! Fleet core library — domain types, registry client, config, naming.
//!
//! - [`types`] — project identity and descriptors
//! - [`registry`] — [`RegistryClient`] and its HTTP implementation
//! - [`config`] — `fleet.yaml`, overrides, inclusion set
//! - [`target`] — host OS → architecture matrix
//! - [`artifact`] — canonical artifact names

pub mod artifact;
pub mod config;
pub mod error;
pub mod registry;
pub mod target;
pub mod types;

pub use artifact::{name_for, ArtifactKey};
pub use config::{FleetConfig, OverrideEntry};
pub use error::{ConfigError, RegistryError};
pub use registry::{HttpRegistry, RegistryClient};
pub use target::{BuildConfiguration, TargetMatrix};
pub use types::{DescriptorField, ProjectDescriptor, ProjectName};
