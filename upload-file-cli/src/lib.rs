//! upload-file CLI library

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::{InferCommand, TypesCommand, UploadCommand};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "upload-file")]
#[command(version)]
#[command(about = "Upload files to configured disks", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./upload_file.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter for the requested verbosity
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info,upload_file=info",
            2 => "info,upload_file=debug",
            _ => "trace",
        }
    }
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a file, URL or stdin to a disk
    Upload(UploadCommand),
    /// List the configured aggregate types
    Types(TypesCommand),
    /// Show which aggregate type a MIME type and extension resolve to
    Infer(InferCommand),
}

impl Commands {
    /// Subcommand name, for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload",
            Self::Types(_) => "types",
            Self::Infer(_) => "infer",
        }
    }
}
