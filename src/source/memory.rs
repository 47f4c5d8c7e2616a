//! In-memory source

use bytes::Bytes;

use super::traits::StreamSource;
use crate::error::SourceError;

/// A source over bytes already in memory.
///
/// Reads are zero-copy slices of the underlying buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl StreamSource for MemorySource {
    fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError> {
        let len = self.data.len();
        let start = usize::try_from(offset)
            .ok()
            .filter(|&start| start <= len)
            .ok_or_else(|| {
                SourceError::FileSystemError(format!(
                    "Offset {} is beyond buffer size {}",
                    offset, len
                ))
            })?;
        let end = start.saturating_add(length).min(len);
        Ok(self.data.slice(start..end))
    }

    fn size(&self) -> Result<u64, SourceError> {
        Ok(self.data.len() as u64)
    }

    fn read_from(&self, offset: u64) -> Result<Bytes, SourceError> {
        match usize::try_from(offset) {
            Ok(start) if start < self.data.len() => Ok(self.data.slice(start..)),
            _ => Ok(Bytes::new()),
        }
    }
}
