//! RT file reader components
//!
//! This module provides the decoding side of the crate: byte order and
//! version probing, reference path resolution, the schema-driven record
//! decoder, and the header and line-of-sight decoders built on it.

mod config;
pub mod cursor;
mod header;
mod los;
pub mod preamble;
pub mod record_decoder;
pub mod resolve;
pub mod value;

pub use config::{ReaderConfig, TrailingData, DEFAULT_RECORD_COUNT_FIELD};
pub use cursor::{ByteCursor, Endianness};
pub use header::{materialize_flags, Header, HeaderDecoder, HeaderFlags, FLAG_PREFIX};
pub use los::{Cell, LineOfSight, LineOfSightDecoder};
pub use preamble::{read_preamble, Preamble, PREAMBLE_SIZE, SENTINEL};
pub use record_decoder::{RecordDecode, RecordDecoder};
pub use resolve::{FieldResolver, Lookup, ResolutionContext, ResolvedField, Scope};
pub use value::{Column, DecodedState, Scalar, Value};
