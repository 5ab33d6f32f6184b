//! Aggregate type listing

use anyhow::Result;
use clap::Args;
use console::style;
use upload_file::aggregate::{AggregateTypeDefinition, TypeRegistry};
use upload_file::config::UploadConfig;

/// List aggregate types
#[derive(Debug, Clone, Default, Args)]
pub struct TypesCommand {
    /// Print the definitions as JSON
    #[arg(long)]
    pub json: bool,
}

impl TypesCommand {
    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails
    pub fn execute(&self, config: &UploadConfig) -> Result<()> {
        let registry = config.type_registry();
        if self.json {
            let definitions: Vec<&AggregateTypeDefinition> = registry.iter().collect();
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        } else {
            print!("{}", render(&registry));
        }
        Ok(())
    }
}

/// One block per type, in resolution order
#[must_use]
pub fn render(registry: &TypeRegistry) -> String {
    let mut out = String::new();
    for definition in registry.iter() {
        out.push_str(&format!("{}\n", style(&definition.name).bold()));
        out.push_str(&format!("  extensions: {}\n", definition.extensions.join(", ")));
        out.push_str(&format!("  mime types: {}\n", definition.mime_types.join(", ")));
    }
    out
}
