//! Error types for RT data decoding

use std::fmt;
use thiserror::Error;

use crate::schema::{SchemaTable, VersionKey};

/// Errors raised while building or querying schemas
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A version has no earlier declaration to inherit from
    #[error("Schemas incomplete for version {version}: no earlier {table} to inherit from")]
    Incomplete {
        version: VersionKey,
        table: SchemaTable,
    },
    /// Version outside the populated registry range
    #[error("Unknown version {0}: no schema registered")]
    UnknownVersion(VersionKey),
    /// Catalog parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Structurally valid catalog with inconsistent content
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Errors raised while decoding bytes against a schema
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Byte order or sentinel could not be established
    #[error("Format error: {0}")]
    Format(String),
    /// A count or flag reference could not be resolved
    #[error("Cannot resolve '{path}' for field '{field}': {message}")]
    Resolution {
        field: String,
        path: String,
        message: String,
    },
    /// Stream ended inside a field
    #[error(
        "Truncated file: field '{field}' needs {needed} bytes at offset {offset}, only {available} available"
    )]
    Truncated {
        field: String,
        offset: u64,
        needed: u64,
        available: u64,
    },
}

/// Errors that can occur with data sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// File system error
    #[error("File system error: {0}")]
    FileSystemError(String),
    /// Path not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Part of the file being decoded when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Byte order sentinel and version words
    Preamble,
    Header,
    /// Zero-based line of sight index
    LineOfSight(usize),
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Preamble => f.write_str("preamble"),
            Region::Header => f.write_str("header"),
            Region::LineOfSight(index) => write!(f, "line of sight {}", index),
        }
    }
}

/// Top-level reader error type
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Source error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Decode error within a region of the file
    #[error("Decode error in {region}: {source}")]
    Decode {
        region: Region,
        #[source]
        source: DecodeError,
    },

    /// Bytes left over after the last line of sight
    #[error("{remaining} trailing bytes at offset {offset} after the last line of sight")]
    TrailingData { offset: u64, remaining: u64 },
}

impl ReaderError {
    pub(crate) fn decode(region: Region, source: DecodeError) -> Self {
        ReaderError::Decode { region, source }
    }

    /// The underlying decode error, if this is one.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            ReaderError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The region being decoded, if this is a decode error.
    pub fn region(&self) -> Option<Region> {
        match self {
            ReaderError::Decode { region, .. } => Some(*region),
            _ => None,
        }
    }
}

/// Out-of-range access to a line of sight or cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Index {index} is out of bounds for length {len}")]
pub struct IndexError {
    pub index: usize,
    pub len: usize,
}
