//! Per-architecture build dispatch for one project.
//!
//! ## `build` — per architecture, in matrix order
//!
//! 1. Skip if the artifact is already recorded / present.
//! 2. Run the override script if one exists, otherwise `make build`, with
//!    `GOOS`/`GOARCH` added to the inherited environment.
//! 3. Non-zero exit → record the failure, continue with the next arch.
//! 4. The build output directory must hold exactly one regular file.
//! 5. Move it into the shared output directory under its canonical name,
//!    keeping its extension, and record it in the manifest.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fleet_core::artifact::extension_of;
use fleet_core::{ArtifactKey, BuildConfiguration, ProjectDescriptor, ProjectName};

use crate::error::{io_err, BuildError};
use crate::manifest::Manifest;
use crate::process::{CommandRunner, CommandSpec};

/// Outcome of one (OS, architecture) attempt.
#[derive(Debug)]
pub enum ArchResult {
    /// Artifact moved into the output directory.
    Built { file: PathBuf },
    /// An artifact for this tuple already existed; nothing was run.
    AlreadyBuilt,
    /// Dry run: this tuple would have been built.
    WouldBuild,
    Failed(BuildError),
}

#[derive(Debug)]
pub struct ArchReport {
    pub config: BuildConfiguration,
    pub result: ArchResult,
}

/// How the build for a project is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildCommand {
    /// `make build` in the checkout.
    Make,
    /// A per-project script run with no arguments.
    Script(PathBuf),
}

impl BuildCommand {
    /// Script if `script` exists on disk, otherwise `make build`.
    pub fn detect(script: &Path) -> Self {
        if script.is_file() {
            BuildCommand::Script(script.to_path_buf())
        } else {
            BuildCommand::Make
        }
    }

    fn spec(&self, checkout: &Path, config: &BuildConfiguration, timeout: Duration) -> CommandSpec {
        let spec = match self {
            BuildCommand::Make => CommandSpec::new("make", checkout, timeout).arg("build"),
            BuildCommand::Script(path) => CommandSpec::new(path, checkout, timeout),
        };
        config
            .env_vars()
            .into_iter()
            .fold(spec, |spec, (k, v)| spec.env(k, v))
    }
}

/// Builds one project for every configuration of the current host.
pub struct Dispatcher<'a> {
    pub runner: &'a dyn CommandRunner,
    pub configurations: &'a [BuildConfiguration],
    /// Relative to the checkout.
    pub build_output_dir: &'a Path,
    pub timeout: Duration,
    pub dry_run: bool,
}

impl Dispatcher<'_> {
    /// Runs every configuration. Stops early only when the build tool's
    /// output contract is violated.
    pub fn build(
        &self,
        descriptor: &ProjectDescriptor,
        checkout: &Path,
        command: &BuildCommand,
        manifest: &mut Manifest,
    ) -> Vec<ArchReport> {
        if let BuildCommand::Script(path) = command {
            tracing::info!(project = %descriptor.name, "found override {}", path.display());
        }

        let mut reports = Vec::with_capacity(self.configurations.len());
        for config in self.configurations {
            let result = self.build_one(descriptor, checkout, command, config, manifest);
            let stop = matches!(result, ArchResult::Failed(BuildError::AmbiguousOutput { .. }));
            reports.push(ArchReport {
                config: config.clone(),
                result,
            });
            if stop {
                break;
            }
        }
        reports
    }

    fn build_one(
        &self,
        descriptor: &ProjectDescriptor,
        checkout: &Path,
        command: &BuildCommand,
        config: &BuildConfiguration,
        manifest: &mut Manifest,
    ) -> ArchResult {
        let key = ArtifactKey::for_build(descriptor, config);
        match manifest.artifact_exists(&key) {
            Ok(true) => {
                tracing::info!("{} {key} exists, skipping", descriptor.name);
                return ArchResult::AlreadyBuilt;
            }
            Ok(false) => {}
            Err(e) => return ArchResult::Failed(e),
        }

        if self.dry_run {
            tracing::info!("[dry-run] would build {} {key}", descriptor.name);
            return ArchResult::WouldBuild;
        }

        tracing::info!("building {} {key}", descriptor.name);
        let spec = command.spec(checkout, config, self.timeout);
        if let Err(e) = self.runner.run(&spec) {
            let err = BuildError::Build {
                project: descriptor.name.clone(),
                os: config.os.clone(),
                arch: config.arch.clone(),
                detail: e.to_string(),
            };
            tracing::warn!("{err}");
            return ArchResult::Failed(err);
        }

        match self.collect(&descriptor.name, checkout, &key, manifest) {
            Ok(file) => {
                tracing::info!("wrote {}", file.display());
                ArchResult::Built { file }
            }
            Err(err @ BuildError::AmbiguousOutput { .. }) => {
                tracing::error!(project = %descriptor.name, "{err}");
                ArchResult::Failed(err)
            }
            Err(err) => {
                tracing::warn!(project = %descriptor.name, "{err}");
                ArchResult::Failed(err)
            }
        }
    }

    /// Steps 4 and 5: take the single output file and file it away.
    fn collect(
        &self,
        project: &ProjectName,
        checkout: &Path,
        key: &ArtifactKey,
        manifest: &mut Manifest,
    ) -> Result<PathBuf, BuildError> {
        let out_dir = checkout.join(self.build_output_dir);
        let produced = single_output(project, &out_dir)?;
        let file_name = produced
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target_name = key.file_name(extension_of(&file_name));
        let target = manifest.dir().join(&target_name);

        move_file(&produced, &target)?;
        manifest.record(key.clone(), &target_name)?;
        manifest.save()?;
        Ok(target)
    }
}

/// The one regular file in `dir`. Subdirectories are not counted. A missing
/// dir, no files, or several files are all [`BuildError::AmbiguousOutput`].
pub fn single_output(project: &ProjectName, dir: &Path) -> Result<PathBuf, BuildError> {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(rd) => rd
            .map(|e| e.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| io_err(dir, e))?
            .into_iter()
            .filter(|p| p.is_file())
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(io_err(dir, e)),
    };
    if entries.len() != 1 {
        return Err(BuildError::AmbiguousOutput {
            project: project.clone(),
            dir: dir.to_path_buf(),
            found: entries.len(),
        });
    }
    Ok(entries.remove(0))
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<(), BuildError> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(|e| io_err(to, e))?;
    std::fs::remove_file(from).map_err(|e| io_err(from, e))?;
    Ok(())
}
