//! Line-of-sight records.
//!
//! A line of sight is one variable-length record read after the header.
//! Its fields resolve paths against the shared [`Header`] and against the
//! fields already read for the same line of sight.

use std::sync::Arc;

use tracing::trace;

use crate::error::{DecodeError, IndexError};
use crate::reader::cursor::ByteCursor;
use crate::reader::header::Header;
use crate::reader::record_decoder::{RecordDecode, RecordDecoder};
use crate::reader::resolve::Scope;
use crate::reader::value::{DecodedState, Value};
use crate::schema::Schema;

/// One decoded line of sight.
#[derive(Debug, Clone, PartialEq)]
pub struct LineOfSight {
    header: Arc<Header>,
    fields: DecodedState,
    offset: u64,
    size: u64,
}

impl LineOfSight {
    /// The header this line of sight was decoded against.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Non-internal fields in on-disk order.
    pub fn fields(&self) -> &DecodedState {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    /// Byte offset of this record in the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size of this record in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Cells along this line of sight: the record's own `N_cells` when
    /// stored, otherwise the header's.
    pub fn n_cells(&self) -> usize {
        self.count("N_cells")
            .or_else(|| self.header.n_cells())
            .unwrap_or(0)
    }

    /// Index of this line of sight's cell in the simulation, if stored.
    pub fn cell_index(&self) -> Option<usize> {
        self.count("cell")
    }

    /// A field's elements widened to f64.
    pub fn values_f64(&self, name: &str) -> Option<Vec<f64>> {
        self.get(name).map(Value::to_f64_vec)
    }

    /// Copy the per-cell quantities at `index`.
    ///
    /// # Errors
    /// `IndexError` if `index >= n_cells()`.
    pub fn cell(&self, index: usize) -> Result<Cell, IndexError> {
        let len = self.n_cells();
        if index >= len {
            return Err(IndexError { index, len });
        }

        let at = |name: &str| self.get(name).and_then(|v| v.get_f64(index));
        let dr = if self.header.header_flags().dr {
            at("dR")
        } else {
            None
        };

        Ok(Cell {
            r: at("R"),
            dr,
            d: at("D"),
            entropy: at("entropy"),
            t: at("T"),
            n_h: at("n_H"),
            n_he: at("n_He"),
            x_h1: at("x_H1"),
            x_h2: at("x_H2"),
            x_he1: at("x_He1"),
            x_he2: at("x_He2"),
            x_he3: at("x_He3"),
        })
    }

    /// Every cell in order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.n_cells()).filter_map(move |i| self.cell(i).ok())
    }

    fn count(&self, name: &str) -> Option<usize> {
        self.get(name)?.as_scalar()?.as_count()
    }
}

/// Per-cell quantities copied out of a line of sight.
///
/// A quantity the file version does not store is `None`, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    /// Radius [m]
    pub r: Option<f64>,
    /// Width [m]
    pub dr: Option<f64>,
    /// Density [kg/m^3]
    pub d: Option<f64>,
    /// Entropy [J/K]
    pub entropy: Option<f64>,
    /// Temperature [K]
    pub t: Option<f64>,
    /// Hydrogen number density [m^-3]
    pub n_h: Option<f64>,
    /// Helium number density [m^-3]
    pub n_he: Option<f64>,
    /// HI fraction
    pub x_h1: Option<f64>,
    /// HII fraction
    pub x_h2: Option<f64>,
    /// HeI fraction
    pub x_he1: Option<f64>,
    /// HeII fraction
    pub x_he2: Option<f64>,
    /// HeIII fraction
    pub x_he3: Option<f64>,
}

/// Decodes consecutive line-of-sight records against a shared header.
#[derive(Debug)]
pub struct LineOfSightDecoder<'s> {
    schema: &'s Schema,
    header: Arc<Header>,
    decoder: RecordDecoder,
}

impl<'s> LineOfSightDecoder<'s> {
    pub fn new(schema: &'s Schema, header: Arc<Header>) -> Self {
        Self {
            schema,
            header,
            decoder: RecordDecoder::new(),
        }
    }

    pub fn with_decoder(mut self, decoder: RecordDecoder) -> Self {
        self.decoder = decoder;
        self
    }
}

impl RecordDecode for LineOfSightDecoder<'_> {
    type Output = LineOfSight;

    fn decode(&self, cursor: &mut ByteCursor<'_>) -> Result<LineOfSight, DecodeError> {
        let offset = cursor.position();
        let header: &dyn Scope = &*self.header;
        let fields = self.decoder.decode(self.schema, cursor, Some(header))?;
        let size = cursor.position() - offset;
        trace!(offset, size, fields = fields.len(), "Decoded line of sight");

        Ok(LineOfSight {
            header: Arc::clone(&self.header),
            fields,
            offset,
            size,
        })
    }
}
