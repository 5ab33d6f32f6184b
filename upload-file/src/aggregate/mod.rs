//! Aggregate file types
//!
//! An aggregate type groups MIME types and extensions under one name
//! (`image`, `pdf`, `archive`, ...). Every upload is assigned exactly one
//! aggregate type, inferred from its MIME type and extension by a
//! [`TypeResolver`] over an ordered [`TypeRegistry`].

mod registry;
mod resolver;

pub use registry::{
    default_definitions, normalize_extension, normalize_mime, AggregateTypeDefinition,
    TypeRegistry, TYPE_OTHER,
};
pub use resolver::{TypePolicy, TypeResolver};
