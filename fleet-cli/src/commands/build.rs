//! The build run itself (the default `fleet` invocation).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use fleet_build::{
    pipeline, ArchResult, Collaborators, GitCli, ProjectOutcome, RunReport, SystemRunner,
};
use fleet_core::{target::host_os, FleetConfig, HttpRegistry, ProjectName};

use super::ConfigArgs;

/// Arguments for a build run.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Only process these projects (repeatable or comma-separated);
    /// replaces the configured inclusion set.
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub include: Vec<String>,

    /// Registry base URL.
    #[arg(long, value_name = "URL")]
    pub registry_url: Option<String>,

    /// Directory of per-project override build scripts.
    #[arg(long, value_name = "DIR")]
    pub override_dir: Option<PathBuf>,

    /// Report what would be built without cloning or building.
    #[arg(long)]
    pub dry_run: bool,
}

impl BuildArgs {
    pub fn run(self, config_args: &ConfigArgs) -> Result<()> {
        let config = self.apply(config_args.load()?)?;
        let os = host_os();

        let registry = HttpRegistry::new(config.registry_url.clone(), config.http_timeout());
        let runner = SystemRunner;
        let git = GitCli::new(&runner, config.clone_timeout());
        let collaborators = Collaborators {
            registry: &registry,
            source: &git,
            runner: &runner,
        };

        let report = pipeline::run(&config, os, &collaborators, self.dry_run)
            .with_context(|| format!("fleet build failed against {}", config.registry_url))?;
        tracing::info!(
            built = report.built_count(),
            failed = report.failed_count(),
            dry_run = self.dry_run,
            "fleet run finished"
        );
        print_report(&report, self.dry_run);
        Ok(())
    }

    fn apply(&self, mut config: FleetConfig) -> Result<FleetConfig> {
        if !self.include.is_empty() {
            config.include = self
                .include
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(ProjectName::from)
                .collect();
        }
        if let Some(url) = &self.registry_url {
            config.registry_url = url.clone();
        }
        if let Some(dir) = &self.override_dir {
            config.override_dir = dir.clone();
        }
        config.validate().context("invalid configuration")?;
        Ok(config.resolve_paths())
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let in_scope: Vec<_> = report.in_scope().collect();
    if in_scope.is_empty() {
        println!("{prefix}No included projects were listed by the registry.");
        return;
    }

    for project in in_scope {
        match &project.outcome {
            ProjectOutcome::Filtered => {}
            ProjectOutcome::Failed { stage, error } => {
                println!("{prefix}{} '{}' — {stage} failed: {error}", "✗".red(), project.name);
            }
            ProjectOutcome::Processed {
                descriptor,
                architectures,
            } => {
                println!(
                    "{prefix}{} '{}' {}",
                    "✓".green(),
                    project.name,
                    descriptor.recommended_version
                );
                if architectures.is_empty() {
                    println!("  ·  no targets for {}", report.host_os);
                }
                for arch in architectures {
                    let target = format!("{}/{}", arch.config.os, arch.config.arch);
                    match &arch.result {
                        ArchResult::Built { file } => {
                            println!("  ✎  {target} → {}", file.display())
                        }
                        ArchResult::AlreadyBuilt => println!("  ·  {target} already built"),
                        ArchResult::WouldBuild => println!("  ~  {target} would build"),
                        ArchResult::Failed(e) => println!("  {}  {target}: {e}", "✗".red()),
                    }
                }
            }
        }
    }

    println!(
        "\n{prefix}{} built, {} failed",
        report.built_count(),
        report.failed_count()
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn include_flag_replaces_config_set() {
        let args = BuildArgs {
            include: vec!["alpha".into(), " beta ".into(), "".into()],
            ..Default::default()
        };
        let config = args.apply(FleetConfig::default()).expect("apply");
        let names: Vec<_> = config.include.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, ["alpha", "beta"]);
    }

    #[test]
    fn empty_registry_url_is_rejected() {
        let args = BuildArgs {
            registry_url: Some(String::new()),
            ..Default::default()
        };
        assert!(args.apply(FleetConfig::default()).is_err());
    }

    #[test]
    fn default_timeouts_survive_apply() {
        let config = BuildArgs::default()
            .apply(FleetConfig::default())
            .expect("apply");
        assert_eq!(config.build_timeout(), Duration::from_secs(3600));
    }
}
