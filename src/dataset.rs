//! Whole-file decoding.
//!
//! A load is one linear pass over the file: probe the byte order and
//! version, resolve that version's schemas, decode the header at offset 0,
//! then decode `N_LOS` back-to-back lines of sight. Any failure aborts the
//! load; no partially decoded [`Dataset`] is ever returned.
//!
//! [`RtFile`] wraps the same steps in an explicit
//! `Unloaded → HeaderLoaded → Loaded` handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::error::{DecodeError, IndexError, ReaderError, Region, SchemaError};
use crate::reader::{
    read_preamble, ByteCursor, Header, HeaderDecoder, LineOfSight, LineOfSightDecoder,
    Preamble, ReaderConfig, RecordDecode, RecordDecoder, TrailingData, PREAMBLE_SIZE,
};
use crate::schema::{CountSpec, FlagSpec, Schema, SchemaRegistry, VersionSchemas, WidthSpec};
use crate::source::{LocalSource, MemorySource, StreamSource};

/// Load the RT file at `path` with the default configuration.
///
/// # Example
/// ```no_run
/// let data = rtdata::load("output/rt_los_0001.dat")?;
/// println!("{} lines of sight, version {}", data.len(), data.header().version());
/// for los in &data {
///     println!("{} cells", los.n_cells());
/// }
/// # Ok::<(), rtdata::ReaderError>(())
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset, ReaderError> {
    Dataset::load(path)
}

/// A fully decoded RT file: the header and every line of sight in file
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    path: Option<PathBuf>,
    header: Arc<Header>,
    lines: Vec<LineOfSight>,
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        Self::load_with_config(path, &ReaderConfig::default())
    }

    /// Load a file with a custom configuration.
    ///
    /// The file is closed before this returns, on success or failure.
    pub fn load_with_config<P: AsRef<Path>>(
        path: P,
        config: &ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let source = LocalSource::open(path)?;
        decode_dataset(&source, Some(path.to_path_buf()), config)
    }

    /// Decode a file image already in memory.
    pub fn from_bytes(data: impl Into<Bytes>, config: &ReaderConfig) -> Result<Self, ReaderError> {
        decode_dataset(&MemorySource::new(data), None, config)
    }

    /// Decode from any byte source.
    pub fn from_source<S: StreamSource + ?Sized>(
        source: &S,
        config: &ReaderConfig,
    ) -> Result<Self, ReaderError> {
        decode_dataset(source, None, config)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Path the dataset was loaded from, if it came from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of lines of sight.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line of sight at `index`.
    ///
    /// # Errors
    /// `IndexError` if `index >= len()`.
    pub fn get(&self, index: usize) -> Result<&LineOfSight, IndexError> {
        self.lines.get(index).ok_or(IndexError {
            index,
            len: self.lines.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineOfSight> {
        self.lines.iter()
    }

    pub fn lines(&self) -> &[LineOfSight] {
        &self.lines
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a LineOfSight;
    type IntoIter = std::slice::Iter<'a, LineOfSight>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Progress of an [`RtFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    HeaderLoaded,
    Loaded,
}

/// Handle to an RT file on disk that can be loaded in stages.
///
/// Every load re-runs byte order detection and version probing. A failed
/// load leaves the handle `Unloaded`.
#[derive(Debug)]
pub struct RtFile {
    path: PathBuf,
    config: ReaderConfig,
    header: Option<Arc<Header>>,
    dataset: Option<Dataset>,
}

impl RtFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config: ReaderConfig::default(),
            header: None,
            dataset: None,
        }
    }

    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn state(&self) -> LoadState {
        match (&self.header, &self.dataset) {
            (_, Some(_)) => LoadState::Loaded,
            (Some(_), None) => LoadState::HeaderLoaded,
            (None, None) => LoadState::Unloaded,
        }
    }

    /// Read only the preamble and header.
    ///
    /// Discards any previously loaded lines of sight.
    pub fn load_header(&mut self) -> Result<&Header, ReaderError> {
        self.reset();
        let source = LocalSource::open(&self.path)?;
        let header = decode_header_only(&source, Some(self.path.clone()), &self.config)?;
        Ok(&**self.header.insert(Arc::new(header)))
    }

    /// Read the whole file.
    pub fn load(&mut self) -> Result<&Dataset, ReaderError> {
        self.reset();
        let source = LocalSource::open(&self.path)?;
        let dataset = decode_dataset(&source, Some(self.path.clone()), &self.config)?;
        self.header = Some(Arc::clone(&dataset.header));
        Ok(&*self.dataset.insert(dataset))
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_deref()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn into_dataset(self) -> Option<Dataset> {
        self.dataset
    }

    fn reset(&mut self) {
        self.header = None;
        self.dataset = None;
    }
}

/// Probe the preamble and look up the schemas for its version.
fn resolve_version(
    cursor: &mut ByteCursor<'_>,
    registry: &SchemaRegistry,
) -> Result<(Preamble, VersionSchemas), ReaderError> {
    let preamble =
        read_preamble(cursor).map_err(|e| ReaderError::decode(Region::Preamble, e))?;
    if !registry.supports(preamble.version) {
        return Err(SchemaError::UnknownVersion(preamble.version).into());
    }
    let schemas = registry.resolve(preamble.version)?;
    Ok((preamble, schemas))
}

fn decode_header(
    cursor: &mut ByteCursor<'_>,
    preamble: Preamble,
    schemas: &VersionSchemas,
    path: Option<PathBuf>,
    decoder: &RecordDecoder,
) -> Result<Header, ReaderError> {
    cursor.set_order(preamble.endianness);
    cursor.set_position(0);
    HeaderDecoder::new(&schemas.header, &schemas.flags, preamble.version)
        .with_path(path)
        .with_decoder(decoder.clone())
        .decode(cursor)
        .map_err(|e| ReaderError::decode(Region::Header, e))
}

/// Read the preamble and header without touching the line-of-sight region
/// when the header has a fixed size.
fn decode_header_only<S: StreamSource + ?Sized>(
    source: &S,
    path: Option<PathBuf>,
    config: &ReaderConfig,
) -> Result<Header, ReaderError> {
    let registry = config.registry()?;
    let probe = source.read_range(0, PREAMBLE_SIZE)?;
    let (preamble, schemas) = resolve_version(&mut ByteCursor::new(&probe), &registry)?;

    let data = match fixed_size(&schemas.header) {
        Some(len) => source.read_range(0, len)?,
        None => source.read_from(0)?,
    };
    let decoder = config.record_decoder();
    decode_header(&mut ByteCursor::new(&data), preamble, &schemas, path, &decoder)
}

fn decode_dataset<S: StreamSource + ?Sized>(
    source: &S,
    path: Option<PathBuf>,
    config: &ReaderConfig,
) -> Result<Dataset, ReaderError> {
    let registry = config.registry()?;
    let data = source.read_from(0)?;
    let mut cursor = ByteCursor::new(&data);

    let (preamble, schemas) = resolve_version(&mut cursor, &registry)?;
    let decoder = config.record_decoder();
    let header = Arc::new(decode_header(
        &mut cursor,
        preamble,
        &schemas,
        path.clone(),
        &decoder,
    )?);

    let n_los = header.count(&config.record_count_field).ok_or_else(|| {
        ReaderError::decode(
            Region::Header,
            DecodeError::Resolution {
                field: "lines of sight".to_string(),
                path: config.record_count_field.clone(),
                message: "header has no non-negative integer count".to_string(),
            },
        )
    })?;
    debug!(
        version = %preamble.version,
        n_los,
        header_size = header.size(),
        "Decoding lines of sight"
    );

    let los_decoder =
        LineOfSightDecoder::new(&schemas.record, Arc::clone(&header)).with_decoder(decoder);
    // Never reserve from the on-disk count.
    let mut lines = Vec::new();
    for index in 0..n_los {
        trace!(index, offset = cursor.position(), "Decoding line of sight");
        let los = los_decoder
            .decode(&mut cursor)
            .map_err(|e| ReaderError::decode(Region::LineOfSight(index), e))?;
        lines.push(los);
    }

    if !cursor.is_at_end() {
        let offset = cursor.position();
        let remaining = cursor.remaining() as u64;
        match config.trailing_data {
            TrailingData::Ignore => {
                warn!(offset, remaining, "Ignoring trailing bytes after last line of sight")
            }
            TrailingData::Reject => {
                return Err(ReaderError::TrailingData { offset, remaining });
            }
        }
    }

    Ok(Dataset {
        path,
        header,
        lines,
    })
}

/// Byte size of a schema whose layout does not depend on decoded values.
fn fixed_size(schema: &Schema) -> Option<usize> {
    schema.iter().try_fold(0usize, |total, field| {
        let present = match field.flag {
            FlagSpec::Literal(present) => present,
            FlagSpec::Path(_) => return None,
        };
        if !present {
            return Some(total);
        }
        match (&field.width, &field.count) {
            (WidthSpec::Fixed(ty), CountSpec::Literal(n)) => {
                total.checked_add(ty.width().checked_mul(*n)?)
            }
            _ => None,
        }
    })
}
