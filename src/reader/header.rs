//! RT file header decoding
//!
//! The header region starts at offset 0 and repeats the preamble words
//! (sentinel, major and minor version) followed by version-specific
//! fields. After decoding, on-disk flags are merged with the version's
//! default flags so every header carries a complete flag set, including
//! flags that older formats never stored.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DecodeError, ReaderError};
use crate::reader::cursor::{ByteCursor, Endianness};
use crate::reader::record_decoder::{RecordDecode, RecordDecoder};
use crate::reader::resolve::{Lookup, Scope};
use crate::reader::value::{DecodedState, Value};
use crate::schema::{FlagSet, Schema, VersionKey};

/// Prefix identifying header fields that are flags.
pub const FLAG_PREFIX: &str = "flag_";

/// A decoded RT header.
///
/// Contains the file version and byte order, every non-internal header
/// field, and the materialized flag set. Lines of sight hold it behind an
/// `Arc` as shared, read-only resolution context.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    path: Option<PathBuf>,
    version: VersionKey,
    endianness: Endianness,
    fields: DecodedState,
    flags: FlagSet,
    size: u64,
}

impl Header {
    /// Load only the header of the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        let mut file = crate::dataset::RtFile::new(path);
        let header = file.load_header()?.clone();
        Ok(header)
    }

    /// Path of the file this header was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn version(&self) -> VersionKey {
        self.version
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Size of the header region in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Non-internal header fields in on-disk order.
    pub fn fields(&self) -> &DecodedState {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Complete flag set: on-disk values where present, defaults otherwise.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    /// Typed view of the documented flags.
    pub fn header_flags(&self) -> HeaderFlags {
        HeaderFlags::from_flags(&self.flags)
    }

    /// Non-negative integer field as a count.
    pub fn count(&self, name: &str) -> Option<usize> {
        self.get(name)?.as_scalar()?.as_count()
    }

    /// Nominal cells per line of sight. Newer formats store a per-line
    /// count; prefer [`LineOfSight::n_cells`](crate::reader::LineOfSight::n_cells).
    pub fn n_cells(&self) -> Option<usize> {
        self.count("N_cells")
    }

    /// Number of lines of sight in the file.
    pub fn n_los(&self) -> Option<usize> {
        self.count("N_LOS")
    }

    pub fn expansion_factor(&self) -> Option<f64> {
        self.scalar_f64("expansion_factor")
    }

    pub fn redshift(&self) -> Option<f64> {
        self.scalar_f64("redshift")
    }

    pub fn time(&self) -> Option<f64> {
        self.scalar_f64("time")
    }

    fn scalar_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_scalar().map(|s| s.as_f64())
    }
}

impl Scope for Header {
    /// Flags take precedence so flag paths always see materialized values.
    fn lookup(&self, name: &str) -> Option<Lookup<'_>> {
        match self.flags.get(name) {
            Some(&flag) => Some(Lookup::Flag(flag)),
            None => self.fields.get(name).map(Lookup::Value),
        }
    }
}

/// The documented header flags.
///
/// Rates, velocities, Ncols, refinements and single precision are stored
/// on disk from version 3.9; Dold, dR, n and tau exist only as version
/// defaults. Flags missing from the set read as false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderFlags {
    /// Rates are present
    pub rates: bool,
    /// Velocities are present
    pub velocities: bool,
    /// The 12-element `Ncols` block is present
    pub ncols: bool,
    /// Cell refinement indices (AMR) are present
    pub refinements: bool,
    /// Floats are single precision (otherwise double)
    pub single: bool,
    /// `Dold` is present
    pub dold: bool,
    /// `dR` is present
    pub dr: bool,
    /// `n` (n_H + n_He) is present
    pub n: bool,
    /// `tau_H1` is present
    pub tau: bool,
}

impl HeaderFlags {
    pub fn from_flags(flags: &FlagSet) -> Self {
        let get = |name: &str| flags.get(name).copied().unwrap_or(false);
        Self {
            rates: get("flag_rates"),
            velocities: get("flag_velocities"),
            ncols: get("flag_Ncols"),
            refinements: get("flag_refinements"),
            single: get("flag_single"),
            dold: get("flag_Dold"),
            dr: get("flag_dR"),
            n: get("flag_n"),
            tau: get("flag_tau"),
        }
    }
}

/// Merge on-disk flags over version defaults; read values win.
pub fn materialize_flags(defaults: &FlagSet, fields: &DecodedState) -> FlagSet {
    let mut flags = defaults.clone();
    for (name, value) in fields.iter() {
        if !name.starts_with(FLAG_PREFIX) {
            continue;
        }
        if let Some(scalar) = value.as_scalar() {
            flags.insert(name.to_string(), scalar.is_truthy());
        }
    }
    flags
}

/// Decodes the header region for one version.
#[derive(Debug)]
pub struct HeaderDecoder<'s> {
    schema: &'s Schema,
    defaults: &'s FlagSet,
    version: VersionKey,
    path: Option<PathBuf>,
    decoder: RecordDecoder,
}

impl<'s> HeaderDecoder<'s> {
    pub fn new(schema: &'s Schema, defaults: &'s FlagSet, version: VersionKey) -> Self {
        Self {
            schema,
            defaults,
            version,
            path: None,
            decoder: RecordDecoder::new(),
        }
    }

    /// Record the path of the file being decoded.
    pub fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.path = path;
        self
    }

    pub fn with_decoder(mut self, decoder: RecordDecoder) -> Self {
        self.decoder = decoder;
        self
    }
}

impl RecordDecode for HeaderDecoder<'_> {
    type Output = Header;

    /// Decode from the cursor's position, which must be the start of the
    /// file, using the cursor's byte order.
    fn decode(&self, cursor: &mut ByteCursor<'_>) -> Result<Header, DecodeError> {
        let start = cursor.position();
        let fields = self.decoder.decode(self.schema, cursor, None)?;
        let flags = materialize_flags(self.defaults, &fields);
        let size = cursor.position() - start;

        debug!(
            version = %self.version,
            fields = fields.len(),
            flags = flags.len(),
            size,
            "Decoded header"
        );

        Ok(Header {
            path: self.path.clone(),
            version: self.version,
            endianness: cursor.order(),
            fields,
            flags,
            size,
        })
    }
}
