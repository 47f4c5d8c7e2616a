//! Reader for RT radiative-transfer output files
//!
//! RT files hold a 1024-byte header followed by a run of variable-length
//! line-of-sight records. Their layout changed across format versions, so
//! decoding is driven by a registry of per-version schemas: the file's
//! byte order and version are probed first, then the matching header and
//! record schemas are walked field by field. Field counts, element widths
//! and presence may all depend on values decoded earlier in the file.
//!
//! ```no_run
//! let data = rtdata::load("rt_los.dat")?;
//! let header = data.header();
//! println!("version {}, z = {:?}", header.version(), header.redshift());
//! let los = data.get(0)?;
//! for cell in los.cells() {
//!     println!("R = {:?}, T = {:?}", cell.r, cell.t);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod dataset;
pub mod error;
pub mod reader;
pub mod schema;
pub mod source;

// Re-export main types
pub use dataset::{load, Dataset, LoadState, RtFile};
pub use error::{DecodeError, IndexError, ReaderError, Region, SchemaError, SourceError};
pub use reader::{
    Cell, Column, DecodedState, Endianness, Header, HeaderFlags, LineOfSight, ReaderConfig,
    Scalar, TrailingData, Value,
};
pub use schema::{SchemaCatalog, SchemaRegistry, VersionKey, VersionSchemas};
pub use source::{BoxedSource, LocalSource, MemorySource, StreamSource};
