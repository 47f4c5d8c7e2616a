//! StreamSource trait definition
//!
//! Provides a unified blocking interface for reading RT file bytes.

use bytes::Bytes;

use crate::error::SourceError;

/// Abstraction over byte sources with range reads.
///
/// RT files are decoded in a single linear pass, so a load reads the whole
/// source once through [`read_from`](StreamSource::read_from). Range reads
/// serve header-only loads, which never touch the line-of-sight region.
pub trait StreamSource: Send + Sync {
    /// Read `length` bytes starting at `offset`.
    ///
    /// Fewer bytes are returned when the source ends first.
    ///
    /// # Errors
    /// Returns `SourceError` if the offset is beyond the end of the source
    /// or the underlying read fails.
    fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError>;

    /// Total size of the source in bytes.
    fn size(&self) -> Result<u64, SourceError>;

    /// Read everything from `offset` to the end of the source.
    fn read_from(&self, offset: u64) -> Result<Bytes, SourceError>;
}

/// A boxed StreamSource for dynamic dispatch
pub type BoxedSource = Box<dyn StreamSource>;

impl StreamSource for BoxedSource {
    fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError> {
        (**self).read_range(offset, length)
    }

    fn size(&self) -> Result<u64, SourceError> {
        (**self).size()
    }

    fn read_from(&self, offset: u64) -> Result<Bytes, SourceError> {
        (**self).read_from(offset)
    }
}
