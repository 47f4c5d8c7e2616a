//! Local filesystem source implementation

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytes::Bytes;

use super::traits::StreamSource;
use crate::error::SourceError;

/// A data source for reading from the local filesystem.
///
/// The file handle is closed when the source is dropped.
pub struct LocalSource {
    /// The file handle behind a mutex so reads can seek
    file: Mutex<File>,
    /// Path to the file (for error reporting)
    path: PathBuf,
    /// Cached file size
    file_size: u64,
}

impl LocalSource {
    /// Open a local file for reading.
    ///
    /// # Errors
    /// Returns `SourceError::NotFound` if the file doesn't exist.
    /// Returns `SourceError::PermissionDenied` if access is denied.
    /// Returns `SourceError::FileSystemError` for other I/O errors.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|e| open_error(&path, e))?;
        let file_size = file
            .metadata()
            .map_err(|e| {
                SourceError::FileSystemError(format!(
                    "Failed to get metadata for {}: {}",
                    path.display(),
                    e
                ))
            })?
            .len();

        Ok(Self {
            file: Mutex::new(file),
            path,
            file_size,
        })
    }

    /// Get the path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_error(path: &Path, e: io::Error) -> SourceError {
    match e.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
        io::ErrorKind::PermissionDenied => {
            SourceError::PermissionDenied(path.display().to_string())
        }
        _ => SourceError::FileSystemError(format!("{}: {}", path.display(), e)),
    }
}

impl StreamSource for LocalSource {
    fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError> {
        if offset > self.file_size {
            return Err(SourceError::FileSystemError(format!(
                "Offset {} is beyond file size {} for {}",
                offset,
                self.file_size,
                self.path.display()
            )));
        }

        let available = usize::try_from(self.file_size - offset).unwrap_or(usize::MAX);
        let actual_length = length.min(available);

        let mut file = self.file.lock().map_err(|_| {
            SourceError::FileSystemError(format!(
                "File handle for {} is poisoned",
                self.path.display()
            ))
        })?;

        file.seek(SeekFrom::Start(offset)).map_err(|e| {
            SourceError::FileSystemError(format!(
                "Failed to seek to offset {} in {}: {}",
                offset,
                self.path.display(),
                e
            ))
        })?;

        let mut buffer = vec![0u8; actual_length];
        file.read_exact(&mut buffer).map_err(|e| {
            SourceError::FileSystemError(format!(
                "Failed to read {} bytes at offset {} from {}: {}",
                actual_length,
                offset,
                self.path.display(),
                e
            ))
        })?;

        Ok(Bytes::from(buffer))
    }

    fn size(&self) -> Result<u64, SourceError> {
        Ok(self.file_size)
    }

    fn read_from(&self, offset: u64) -> Result<Bytes, SourceError> {
        if offset >= self.file_size {
            return Ok(Bytes::new());
        }
        let length = usize::try_from(self.file_size - offset).map_err(|_| {
            SourceError::FileSystemError(format!(
                "{} is too large to read into memory",
                self.path.display()
            ))
        })?;
        self.read_range(offset, length)
    }
}

impl std::fmt::Debug for LocalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSource")
            .field("path", &self.path)
            .field("file_size", &self.file_size)
            .finish()
    }
}
