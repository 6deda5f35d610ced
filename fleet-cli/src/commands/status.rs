//! `fleet status`: artifacts recorded in the output directory.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use fleet_build::{ArtifactRecord, Manifest};

use super::ConfigArgs;

/// Arguments for `fleet status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show artifacts for this daemon.
    #[arg(long)]
    pub daemon: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusJson {
    output_dir: String,
    artifacts: Vec<ArtifactJson>,
}

#[derive(Serialize)]
struct ArtifactJson {
    #[serde(flatten)]
    record: ArtifactRecord,
    present: bool,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "daemon")]
    daemon: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "target")]
    target: String,
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "built")]
    built: String,
}

impl StatusArgs {
    pub fn run(self, config_args: &ConfigArgs) -> Result<()> {
        let config = config_args.load()?.resolve_paths();
        let manifest = Manifest::load(&config.output_dir).with_context(|| {
            format!(
                "failed to read manifest in {}",
                config.output_dir.display()
            )
        })?;

        let artifacts: Vec<ArtifactJson> = manifest
            .records()
            .filter(|r| self.daemon.as_ref().map_or(true, |d| r.key.daemon == *d))
            .map(|r| ArtifactJson {
                present: manifest.dir().join(&r.file).is_file(),
                record: r.clone(),
            })
            .collect();

        if self.json {
            let payload = StatusJson {
                output_dir: config.output_dir.display().to_string(),
                artifacts,
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }

        print_table(&artifacts);
        Ok(())
    }
}

fn print_table(artifacts: &[ArtifactJson]) {
    if artifacts.is_empty() {
        println!("No artifacts recorded yet. Run `fleet` to build.");
        return;
    }

    let rows = artifacts.iter().map(|a| StatusTableRow {
        daemon: a.record.key.daemon.clone(),
        version: a.record.key.version.clone(),
        target: format!("{}/{}", a.record.key.os, a.record.key.arch),
        file: if a.present {
            a.record.file.clone()
        } else {
            format!("{} (missing)", a.record.file).red().to_string()
        },
        built: a.record.built_at.format("%Y-%m-%d %H:%M").to_string(),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let missing = artifacts.iter().filter(|a| !a.present).count();
    if missing > 0 {
        println!(
            "{}",
            format!("{missing} recorded artifact(s) missing on disk").yellow()
        );
    }
}
