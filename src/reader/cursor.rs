//! Positioned byte cursor with runtime byte order.
//!
//! All numeric reads go through [`ByteCursor`], which checks that a whole
//! field is available before consuming anything, so a truncated field is
//! never partially decoded.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::DecodeError;
use crate::reader::value::Column;
use crate::schema::NumericType;

/// Byte order of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Byte order of the running host.
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }

    pub fn swapped(self) -> Self {
        match self {
            Endianness::Little => Endianness::Big,
            Endianness::Big => Endianness::Little,
        }
    }

    pub fn is_native(self) -> bool {
        self == Self::native()
    }

    /// Interpret four bytes as a signed integer in this order.
    pub fn read_i32(self, bytes: &[u8]) -> i32 {
        match self {
            Endianness::Little => LittleEndian::read_i32(bytes),
            Endianness::Big => BigEndian::read_i32(bytes),
        }
    }
}

/// Cursor over an in-memory file image.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    order: Endianness,
}

impl<'a> ByteCursor<'a> {
    /// Cursor at offset 0 using native byte order.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            order: Endianness::native(),
        }
    }

    pub fn with_order(mut self, order: Endianness) -> Self {
        self.order = order;
        self
    }

    pub fn order(&self) -> Endianness {
        self.order
    }

    pub fn set_order(&mut self, order: Endianness) {
        self.order = order;
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Move to an absolute offset, clamped to the end of the data.
    pub fn set_position(&mut self, pos: u64) {
        self.pos = usize::try_from(pos)
            .unwrap_or(usize::MAX)
            .min(self.data.len());
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Total length of the underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Look at bytes from an absolute offset without moving the cursor.
    pub fn peek_at(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        self.data.get(offset..end)
    }

    /// Consume exactly `len` bytes for `field`.
    pub fn take(&mut self, field: &str, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(self.truncated(field, len as u64));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_i32(&mut self, field: &str) -> Result<i32, DecodeError> {
        let order = self.order;
        self.take(field, 4).map(|bytes| order.read_i32(bytes))
    }

    /// Read `count` elements of `ty` for `field`.
    ///
    /// Consumes exactly `count * ty.width()` bytes, or nothing on error.
    pub fn read_column(
        &mut self,
        field: &str,
        ty: NumericType,
        count: usize,
    ) -> Result<Column, DecodeError> {
        let Some(len) = count.checked_mul(ty.width()) else {
            return Err(self.truncated(field, u64::MAX));
        };
        let bytes = self.take(field, len)?;
        Ok(match self.order {
            Endianness::Little => decode_column::<LittleEndian>(bytes, ty, count),
            Endianness::Big => decode_column::<BigEndian>(bytes, ty, count),
        })
    }

    fn truncated(&self, field: &str, needed: u64) -> DecodeError {
        DecodeError::Truncated {
            field: field.to_string(),
            offset: self.position(),
            needed,
            available: self.remaining() as u64,
        }
    }
}

/// `bytes` must hold exactly `count` elements of `ty`.
fn decode_column<B: ByteOrder>(bytes: &[u8], ty: NumericType, count: usize) -> Column {
    match ty {
        NumericType::Int32 => {
            let mut values = vec![0i32; count];
            B::read_i32_into(bytes, &mut values);
            Column::I32(values)
        }
        NumericType::Int64 => {
            let mut values = vec![0i64; count];
            B::read_i64_into(bytes, &mut values);
            Column::I64(values)
        }
        NumericType::UInt32 => {
            let mut values = vec![0u32; count];
            B::read_u32_into(bytes, &mut values);
            Column::U32(values)
        }
        NumericType::UInt64 => {
            let mut values = vec![0u64; count];
            B::read_u64_into(bytes, &mut values);
            Column::U64(values)
        }
        NumericType::Float32 => {
            let mut values = vec![0f32; count];
            B::read_f32_into(bytes, &mut values);
            Column::F32(values)
        }
        NumericType::Float64 => {
            let mut values = vec![0f64; count];
            B::read_f64_into(bytes, &mut values);
            Column::F64(values)
        }
    }
}
