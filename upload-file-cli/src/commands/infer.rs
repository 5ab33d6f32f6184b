//! Aggregate type inference check

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;
use upload_file::aggregate::{TypeResolver, TYPE_OTHER};
use upload_file::config::UploadConfig;

/// Resolve an aggregate type without uploading anything
#[derive(Debug, Clone, Args)]
pub struct InferCommand {
    /// MIME type, e.g. `image/png`
    #[arg(short, long, default_value = "")]
    pub mime: String,

    /// Extension, e.g. `png`
    #[arg(short, long, default_value = "")]
    pub extension: String,

    /// Require MIME type and extension to agree
    #[arg(long)]
    pub strict: bool,

    /// Resolve unknown files to `other` instead of failing
    #[arg(long)]
    pub allow_unrecognized: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// What a MIME type and extension resolve to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inference {
    /// Types recognizing the MIME type
    pub by_mime_type: Vec<String>,
    /// Types recognizing the extension
    pub by_extension: Vec<String>,
    /// Resolved type, or `None` when resolution fails
    pub aggregate_type: Option<String>,
    /// Why resolution failed
    pub error: Option<String>,
}

impl InferCommand {
    /// Runs the inference against the configured registry and policy
    #[must_use]
    pub fn infer(&self, config: &UploadConfig) -> Inference {
        let registry = config.type_registry();
        let mut policy = config.type_policy();
        policy.strict_type_checking |= self.strict;
        policy.allow_unrecognized_types |= self.allow_unrecognized;

        let (aggregate_type, error) =
            match TypeResolver::new(&registry, &policy).resolve(&self.mime, &self.extension) {
                Ok(name) => (Some(name), None),
                Err(e) => (None, Some(e.to_string())),
            };

        Inference {
            by_mime_type: to_owned_names(registry.types_for_mime_type(&self.mime)),
            by_extension: to_owned_names(registry.types_for_extension(&self.extension)),
            aggregate_type,
            error,
        }
    }

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if the type cannot be resolved
    pub fn execute(&self, config: &UploadConfig) -> Result<()> {
        let inference = self.infer(config);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&inference)?);
        } else {
            println!("  {:<12} {}", style("mime type").dim(), inference.by_mime_type.join(", "));
            println!("  {:<12} {}", style("extension").dim(), inference.by_extension.join(", "));
            if let Some(name) = &inference.aggregate_type {
                let shown = if name == TYPE_OTHER {
                    style(name.as_str()).yellow()
                } else {
                    style(name.as_str()).green().bold()
                };
                println!("  {:<12} {shown}", style("resolved").dim());
            }
        }

        match inference.error {
            Some(error) => anyhow::bail!(error),
            None => Ok(()),
        }
    }
}

fn to_owned_names(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}
