//! Repository materialization: one checkout directory per project.
//!
//! A directory named after the project means "already materialized". The
//! checked-out ref is not compared against the descriptor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fleet_core::ProjectDescriptor;

use crate::error::BuildError;
use crate::process::{CommandRunner, CommandSpec};

/// Source control seam: clone `url` at `reference` into `dest`.
pub trait SourceControl {
    fn clone_repo(&self, url: &str, reference: &str, dest: &Path) -> Result<(), String>;
}

/// `git clone --depth 1 --branch <ref> <url> <dest>` through a [`CommandRunner`].
pub struct GitCli<'r> {
    runner: &'r dyn CommandRunner,
    timeout: Duration,
}

impl<'r> GitCli<'r> {
    pub fn new(runner: &'r dyn CommandRunner, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    fn spec(&self, url: &str, reference: &str, dest: &Path) -> CommandSpec {
        let cwd = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        CommandSpec::new("git", cwd, self.timeout)
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--branch")
            .arg(reference)
            .arg(url)
            .arg(dest.to_string_lossy())
    }
}

impl SourceControl for GitCli<'_> {
    fn clone_repo(&self, url: &str, reference: &str, dest: &Path) -> Result<(), String> {
        self.runner
            .run(&self.spec(url, reference, dest))
            .map_err(|e| e.to_string())
    }
}

/// Ensures `<work_dir>/<project>` exists.
pub struct Materializer<'a> {
    work_dir: &'a Path,
    source: &'a dyn SourceControl,
}

impl<'a> Materializer<'a> {
    pub fn new(work_dir: &'a Path, source: &'a dyn SourceControl) -> Self {
        Self { work_dir, source }
    }

    pub fn checkout_dir(&self, descriptor: &ProjectDescriptor) -> PathBuf {
        self.work_dir.join(&descriptor.name.0)
    }

    /// Clone once; later calls are no-ops. Returns the checkout directory.
    pub fn ensure_cloned(&self, descriptor: &ProjectDescriptor) -> Result<PathBuf, BuildError> {
        let dir = self.checkout_dir(descriptor);
        if dir.exists() {
            tracing::debug!(project = %descriptor.name, "checkout exists, not cloning");
            if !dir.join(".git").exists() {
                tracing::warn!(
                    project = %descriptor.name,
                    "{} exists but is not a git checkout",
                    dir.display()
                );
            }
            return Ok(dir);
        }

        let url = descriptor.clone_url();
        tracing::info!(
            project = %descriptor.name,
            version = %descriptor.recommended_version,
            "cloning {url}"
        );
        if let Err(detail) = self
            .source
            .clone_repo(&url, &descriptor.recommended_version, &dir)
        {
            // A killed or failed clone can leave a partial tree; it must not
            // pass for a checkout on the next run.
            if dir.exists() {
                if let Err(e) = std::fs::remove_dir_all(&dir) {
                    tracing::warn!(
                        project = %descriptor.name,
                        "could not remove partial checkout {}: {e}",
                        dir.display()
                    );
                }
            }
            return Err(BuildError::Clone {
                project: descriptor.name.clone(),
                url,
                detail,
            });
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use fleet_core::ProjectName;
    use tempfile::TempDir;

    use super::*;
    use crate::process::ProcessError;

    /// Creates `dest` on every call; fails the first `failures` calls after
    /// leaving a half-written tree behind.
    #[derive(Default)]
    struct RecordingSource {
        clones: RefCell<Vec<(String, String, PathBuf)>>,
        failures: usize,
    }

    impl SourceControl for RecordingSource {
        fn clone_repo(&self, url: &str, reference: &str, dest: &Path) -> Result<(), String> {
            let mut clones = self.clones.borrow_mut();
            clones.push((url.to_string(), reference.to_string(), dest.to_path_buf()));
            std::fs::create_dir_all(dest).map_err(|e| e.to_string())?;
            if clones.len() <= self.failures {
                std::fs::write(dest.join("README"), b"partial").map_err(|e| e.to_string())?;
                return Err("exit status: 128".into());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        specs: RefCell<Vec<CommandSpec>>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, spec: &CommandSpec) -> Result<(), ProcessError> {
            self.specs.borrow_mut().push(spec.clone());
            Ok(())
        }
    }

    fn descriptor() -> ProjectDescriptor {
        ProjectDescriptor {
            name: ProjectName::from("alpha"),
            daemon_name: "alphad".into(),
            git_repo: "https://example.com/org/alpha/".into(),
            recommended_version: "v1.0".into(),
        }
    }

    #[test]
    fn second_call_is_a_no_op() {
        let work = TempDir::new().unwrap();
        let source = RecordingSource::default();
        let m = Materializer::new(work.path(), &source);

        let first = m.ensure_cloned(&descriptor()).expect("first");
        let second = m.ensure_cloned(&descriptor()).expect("second");
        assert_eq!(first, second);
        assert_eq!(first, work.path().join("alpha"));
        assert_eq!(source.clones.borrow().len(), 1);
    }

    #[test]
    fn clone_uses_normalized_url_and_pinned_ref() {
        let work = TempDir::new().unwrap();
        let source = RecordingSource::default();
        Materializer::new(work.path(), &source)
            .ensure_cloned(&descriptor())
            .expect("clone");
        let clones = source.clones.borrow();
        assert_eq!(clones[0].0, "https://example.com/org/alpha.git");
        assert_eq!(clones[0].1, "v1.0");
    }

    #[test]
    fn failed_clone_is_clone_error() {
        let work = TempDir::new().unwrap();
        let source = RecordingSource {
            failures: 1,
            ..Default::default()
        };
        let err = Materializer::new(work.path(), &source)
            .ensure_cloned(&descriptor())
            .unwrap_err();
        assert!(matches!(err, BuildError::Clone { .. }), "got: {err}");
        assert!(err.to_string().contains("alpha.git"));
    }

    #[test]
    fn failed_clone_leaves_nothing_behind_and_is_retried() {
        let work = TempDir::new().unwrap();
        let source = RecordingSource {
            failures: 1,
            ..Default::default()
        };
        let m = Materializer::new(work.path(), &source);

        assert!(m.ensure_cloned(&descriptor()).is_err());
        assert!(!work.path().join("alpha").exists());

        let dir = m.ensure_cloned(&descriptor()).expect("second attempt");
        assert!(dir.is_dir());
        assert!(!dir.join("README").exists());
        assert_eq!(source.clones.borrow().len(), 2);
    }

    #[test]
    fn git_cli_shallow_clones_at_ref() {
        let runner = RecordingRunner::default();
        let git = GitCli::new(&runner, Duration::from_secs(60));
        git.clone_repo("https://example.com/a.git", "v2", Path::new("/work/a"))
            .expect("clone");
        let specs = runner.specs.borrow();
        assert_eq!(specs[0].program, PathBuf::from("git"));
        assert_eq!(
            specs[0].args,
            ["clone", "--depth", "1", "--branch", "v2", "https://example.com/a.git", "/work/a"]
        );
        assert_eq!(specs[0].cwd, PathBuf::from("/work"));
    }
}
