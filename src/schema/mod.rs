//! Schema types, catalogs and the version registry.
//!
//! This module defines the field specification types, the JSON catalog
//! parser, the built-in catalog, and the registry that fills version gaps
//! by inheriting the nearest earlier declaration.

mod catalog;
mod parser;
mod registry;
mod types;

pub use catalog::{SchemaCatalog, BUILTIN_CATALOG};
pub use parser::parse_catalog;
pub use registry::{SchemaRegistry, VersionSchemas};
pub use types::*;
