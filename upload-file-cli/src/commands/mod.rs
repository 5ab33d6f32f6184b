//! CLI command implementations

pub mod infer;
pub mod types;
pub mod upload;

pub use infer::InferCommand;
pub use types::TypesCommand;
pub use upload::UploadCommand;
