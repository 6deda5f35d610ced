//! # fleet-build
//!
//! Build orchestration: override resolution, checkout materialization,
//! per-architecture dispatch, and the artifact manifest.
//!
//! Call [`pipeline::run`] to process every registry-listed project once.

pub mod dispatcher;
pub mod error;
pub mod manifest;
pub mod materializer;
pub mod pipeline;
pub mod process;
pub mod resolver;

pub use dispatcher::{ArchReport, ArchResult, BuildCommand};
pub use error::BuildError;
pub use manifest::{ArtifactRecord, Manifest};
pub use materializer::{GitCli, Materializer, SourceControl};
pub use pipeline::{run, Collaborators, ProjectOutcome, ProjectReport, RunReport, Stage};
pub use process::{CommandRunner, CommandSpec, ProcessError, SystemRunner};
pub use resolver::Resolver;
