pub mod build;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fleet_core::{config::DEFAULT_CONFIG_FILE, FleetConfig};

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to a fleet.yaml (defaults to ./fleet.yaml if present).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding one checkout per project.
    #[arg(long, global = true, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Shared artifact directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl ConfigArgs {
    /// Config file + flags, with every directory made absolute.
    pub fn load(&self) -> Result<FleetConfig> {
        let mut config = match &self.config {
            Some(path) => FleetConfig::load(path)
                .with_context(|| format!("failed to load config '{}'", path.display()))?,
            None => FleetConfig::load_or_default(&PathBuf::from(DEFAULT_CONFIG_FILE))
                .context("failed to load fleet.yaml")?,
        };
        if let Some(dir) = &self.work_dir {
            config.work_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if config.work_dir.is_relative() {
            let cwd = std::env::current_dir().context("cannot resolve current directory")?;
            config.work_dir = cwd.join(&config.work_dir);
        }
        tracing::debug!(
            work_dir = %config.work_dir.display(),
            registry = %config.registry_url,
            "configuration loaded"
        );
        Ok(config)
    }
}
