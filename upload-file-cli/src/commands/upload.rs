//! Upload command

use anyhow::{Context, Result};
use clap::Args;
use console::{style, Emoji};
use std::path::PathBuf;
use upload_file::duplicate::DuplicatePolicy;
use upload_file::prelude::{FileUploader, PendingUpload, ResolvedFile, SourceInput, UploadConfig};
use upload_file::storage::Visibility;

static SUCCESS: Emoji = Emoji("✓", "√");

/// Source argument meaning "read standard input"
pub const STDIN: &str = "-";

/// Upload a file
#[derive(Debug, Clone, Args)]
pub struct UploadCommand {
    /// Local path, http(s) URL, or `-` for stdin
    pub source: String,

    /// Target disk (defaults to `default_disk`)
    #[arg(short, long)]
    pub disk: Option<String>,

    /// Target directory on the disk
    #[arg(short = 'C', long, default_value = "")]
    pub directory: String,

    /// Filename without extension
    #[arg(short = 'n', long)]
    pub filename: Option<String>,

    /// Name the file after the SHA-256 of its contents
    #[arg(long, conflicts_with = "filename")]
    pub hash: bool,

    /// What to do when the destination exists (error, increment, replace, update)
    #[arg(long)]
    pub on_duplicate: Option<DuplicatePolicy>,

    /// Maximum size in bytes (0 = unlimited)
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Allowed MIME types, comma separated
    #[arg(long = "allow-mime", value_delimiter = ',')]
    pub allowed_mime_types: Vec<String>,

    /// Allowed extensions, comma separated
    #[arg(long = "allow-ext", value_delimiter = ',')]
    pub allowed_extensions: Vec<String>,

    /// Allowed aggregate types, comma separated
    #[arg(long = "allow-type", value_delimiter = ',')]
    pub allowed_aggregate_types: Vec<String>,

    /// Require MIME type and extension to agree
    #[arg(long)]
    pub strict: bool,

    /// Accept files matching no aggregate type
    #[arg(long)]
    pub allow_unrecognized: bool,

    /// Write the file as public
    #[arg(long, conflicts_with = "private")]
    pub public: bool,

    /// Write the file as private
    #[arg(long)]
    pub private: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl UploadCommand {
    /// Source input for the `source` argument
    #[must_use]
    pub fn source_input(&self) -> SourceInput {
        if self.source == STDIN {
            SourceInput::reader(tokio::io::stdin())
        } else if self.source.contains("://") {
            SourceInput::Text(self.source.clone())
        } else {
            SourceInput::Path(PathBuf::from(&self.source))
        }
    }

    /// Applies the command line options to a pending upload
    ///
    /// Options left unset keep the configured defaults.
    #[must_use]
    pub fn apply<'a>(&self, mut pending: PendingUpload<'a>) -> PendingUpload<'a> {
        if let Some(disk) = &self.disk {
            pending = pending.to_disk(disk.clone());
        }
        if !self.directory.is_empty() {
            pending = pending.to_directory(&self.directory);
        }
        if let Some(filename) = &self.filename {
            pending = pending.use_filename(filename);
        }
        if self.hash {
            pending = pending.use_hash_for_filename();
        }
        if let Some(policy) = self.on_duplicate {
            pending = pending.on_duplicate(policy);
        }
        if let Some(max) = self.max_size {
            pending = pending.set_maximum_size(max);
        }
        if !self.allowed_mime_types.is_empty() {
            pending = pending.set_allowed_mime_types(&self.allowed_mime_types);
        }
        if !self.allowed_extensions.is_empty() {
            pending = pending.set_allowed_extensions(&self.allowed_extensions);
        }
        if !self.allowed_aggregate_types.is_empty() {
            pending = pending.set_allowed_aggregate_types(&self.allowed_aggregate_types);
        }
        if self.strict {
            pending = pending.set_strict_type_checking(true);
        }
        if self.allow_unrecognized {
            pending = pending.set_allow_unrecognized_types(true);
        }
        if self.public {
            pending = pending.with_visibility(Visibility::Public);
        } else if self.private {
            pending = pending.with_visibility(Visibility::Private);
        }
        pending
    }

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if the disks cannot be mounted or the upload fails
    pub async fn execute(&self, config: UploadConfig) -> Result<ResolvedFile> {
        let uploader = FileUploader::from_config(config).context("Failed to set up disks")?;
        let pending = self.apply(uploader.from_source(self.source_input()));

        let file = pending
            .upload()
            .await
            .with_context(|| format!("Failed to upload {}", self.source))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&file)?);
        } else {
            print_summary(&file);
        }

        Ok(file)
    }
}

fn print_summary(file: &ResolvedFile) {
    println!(
        "{} {} {}",
        SUCCESS,
        style("Uploaded").green().bold(),
        style(format!("{}:{}", file.disk, file.path)).cyan()
    );
    println!("  {:<10} {}", style("type").dim(), file.aggregate_type);
    println!("  {:<10} {}", style("mime").dim(), file.mime_type);
    println!("  {:<10} {} bytes", style("size").dim(), file.size);
    println!("  {:<10} {}", style("location").dim(), file.absolute_path);
    if let Some(url) = &file.url {
        println!("  {:<10} {}", style("url").dim(), style(url).underlined());
    }
}
