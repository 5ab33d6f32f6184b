//! upload-file CLI tool

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Result;
use clap::Parser;
use upload_file::config::UploadConfig;
use upload_file::observability::{self, LogFormat, ObservabilityConfig};
use upload_file_cli_lib::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    observability::init_with(
        &ObservabilityConfig::new(cli.log_filter()).with_format(LogFormat::Compact),
    )?;

    tracing::debug!(
        command = cli.command.name(),
        config = ?cli.config,
        "starting upload-file"
    );

    let config = match &cli.config {
        Some(path) => UploadConfig::load_from(path)?,
        None => UploadConfig::load()?,
    };
    tracing::debug!(
        default_disk = %config.default_disk,
        disks = config.disks.len(),
        "configuration loaded"
    );

    match cli.command {
        Commands::Upload(cmd) => {
            cmd.execute(config).await?;
        }
        Commands::Types(cmd) => cmd.execute(&config)?,
        Commands::Infer(cmd) => cmd.execute(&config)?,
    }

    Ok(())
}
