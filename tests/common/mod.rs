//! Synthetic RT file builder shared by the integration tests.
//!
//! Files are assembled word by word in a chosen byte order following the
//! built-in 2.3, 3.2, 3.6 and 3.9 layouts. Every float column gets deterministic,
//! exactly representable values so decoded data can be compared against
//! [`value`].

#![allow(dead_code)]

use rtdata::Endianness;

pub const HEADER_SIZE: usize = 1024;

/// Record columns present in every 3.9 line of sight, in file order.
pub const ALWAYS_309: &[&str] = &[
    "R", "dR", "D", "entropy", "T", "n_H", "x_H1", "x_H2", "n_He", "x_He1", "x_He2", "x_He3",
    "Ncol_H1", "Ncol_He1", "Ncol_He2",
];

/// Columns gated on `flag_rates` in 3.9.
pub const RATES_309: &[&str] = &[
    "G", "G_H1", "G_He1", "G_He2", "gamma_H1", "gamma_He1", "gamma_He2", "L", "L_H1", "L_He1",
    "L_He2", "L_eH", "L_C", "E_H1", "E_He1", "E_He2",
];

/// Columns gated on `flag_velocities` in 3.9.
pub const VELOCITIES_309: &[&str] = &["v_z", "v_x"];

/// Double precision columns of a 2.3 line of sight, in file order.
pub const COLUMNS_203: &[&str] = &[
    "G", "n", "T", "L", "n_H", "x_H1", "x_H2", "n_He", "x_He1", "x_He2", "x_He3", "R", "D",
    "tau_H1", "G_H1", "G_He1", "G_He2", "gamma_H1", "gamma_He1", "gamma_He2", "L_H1", "L_He1",
    "L_He2", "L_eH", "L_C", "E_H1", "E_He1", "E_He2", "Ncol_H1", "Ncol_He1", "Ncol_He2", "v_z",
    "v_x", "entropy",
];

/// Deferred-width columns of a 3.2 line of sight, in file order.
pub const COLUMNS_302: &[&str] = &[
    "R", "D", "Dold", "entropy", "T", "tau_H1", "n", "n_H", "x_H1", "x_H2", "n_He", "x_He1",
    "x_He2", "x_He3", "G", "G_H1", "G_He1", "G_He2", "gamma_H1", "gamma_He1", "gamma_He2", "L",
    "L_H1", "L_He1", "L_He2", "L_eH", "L_C", "E_H1", "E_He1", "E_He2", "Ncol_H1", "Ncol_He1",
    "Ncol_He2", "v_z", "v_x",
];

/// Deferred-width columns of a 3.6 line of sight, in file order.
pub const COLUMNS_306: &[&str] = &[
    "R", "D", "Dold", "entropy", "T", "tau_H1", "n", "n_H", "x_H1", "x_H2", "n_He", "x_He1",
    "x_He2", "x_He3", "Ncol_H1", "Ncol_He1", "Ncol_He2", "v_z", "v_x",
];

/// Deterministic value of `field` at `cell` in line of sight `los`.
pub fn value(los: usize, field: &str, cell: usize) -> f64 {
    let seed = field.bytes().fold(0usize, |acc, b| (acc * 31 + b as usize) % 1000);
    (los * 100_000 + seed * 100 + cell) as f64 + 0.25
}

/// Byte sink writing words in a fixed order.
pub struct Writer {
    order: Endianness,
    buf: Vec<u8>,
}

macro_rules! put {
    ($self:ident, $v:expr) => {
        match $self.order {
            Endianness::Little => $self.buf.extend_from_slice(&$v.to_le_bytes()),
            Endianness::Big => $self.buf.extend_from_slice(&$v.to_be_bytes()),
        }
    };
}

impl Writer {
    pub fn new(order: Endianness) -> Self {
        Self {
            order,
            buf: Vec::new(),
        }
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        put!(self, v);
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        put!(self, v);
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        put!(self, v);
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        put!(self, v);
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        put!(self, v);
        self
    }

    /// Write a deferred-width float.
    pub fn float(&mut self, single: bool, v: f64) -> &mut Self {
        if single {
            self.f32(v as f32)
        } else {
            self.f64(v)
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// On-disk flags of a 3.9 header.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags309 {
    pub rates: bool,
    pub velocities: bool,
    pub ncols: bool,
    pub refinements: bool,
    pub single: bool,
}

impl Flags309 {
    pub fn all() -> Self {
        Self {
            rates: true,
            velocities: true,
            ncols: true,
            refinements: true,
            single: true,
        }
    }
}

/// A synthetic 3.9 file.
#[derive(Debug, Clone)]
pub struct File309 {
    pub order: Endianness,
    pub flags: Flags309,
    pub header_n_cells: i32,
    /// Cells per line of sight; its length is `N_LOS`.
    pub cells: Vec<usize>,
    pub expansion_factor: f32,
    pub redshift: f32,
    pub time: f32,
}

impl File309 {
    pub fn new(order: Endianness, flags: Flags309, cells: Vec<usize>) -> Self {
        Self {
            order,
            flags,
            header_n_cells: cells.iter().copied().max().unwrap_or(0) as i32,
            cells,
            expansion_factor: 0.125,
            redshift: 7.0,
            time: 1.5e15,
        }
    }

    /// Number of bytes one line of sight with `n` cells occupies.
    pub fn record_size(&self, n: usize) -> usize {
        let width = if self.flags.single { 4 } else { 8 };
        let mut columns = ALWAYS_309.len();
        if self.flags.rates {
            columns += RATES_309.len();
        }
        if self.flags.velocities {
            columns += VELOCITIES_309.len();
        }
        let mut size = 3 * 8 + columns * n * width;
        if self.flags.ncols {
            size += 12 * width;
        }
        if self.flags.refinements {
            size += n * 8;
        }
        size
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new(self.order);
        self.write_header(&mut w);
        w.into_bytes()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new(self.order);
        self.write_header(&mut w);
        for (los, &n) in self.cells.iter().enumerate() {
            self.write_los(&mut w, los, n);
        }
        w.into_bytes()
    }

    fn write_header(&self, w: &mut Writer) {
        let f = self.flags;
        w.i32(1).i32(3).i32(9);
        w.i32(self.header_n_cells).i32(self.cells.len() as i32);
        for flag in [f.rates, f.velocities, f.ncols, f.refinements, f.single] {
            w.i32(flag as i32);
        }
        for _ in 0..118 {
            w.i32(0);
        }
        w.f32(self.expansion_factor).f32(self.redshift).f32(self.time);
        for _ in 0..125 {
            w.f32(0.0);
        }
        debug_assert_eq!(w.len(), HEADER_SIZE);
    }

    fn write_los(&self, w: &mut Writer, los: usize, n: usize) {
        let single = self.flags.single;
        let size = self.record_size(n) as u64;
        w.u64(n as u64).u64(los as u64 * 7).u64(size);

        let mut columns: Vec<&str> = ALWAYS_309.to_vec();
        if self.flags.rates {
            columns.extend_from_slice(RATES_309);
        }
        if self.flags.velocities {
            columns.extend_from_slice(VELOCITIES_309);
        }
        for name in columns {
            for cell in 0..n {
                w.float(single, value(los, name, cell));
            }
        }
        if self.flags.ncols {
            for i in 0..12 {
                w.float(single, value(los, "Ncols", i));
            }
        }
        if self.flags.refinements {
            for cell in 0..n {
                w.i64(cell as i64 - 1);
            }
        }
    }
}

/// A synthetic 2.3 file: `n_los` lines of sight with `n_cells` cells each.
pub fn file_203(order: Endianness, n_cells: usize, n_los: usize) -> Vec<u8> {
    let mut w = Writer::new(order);
    w.i32(1).i32(2).i32(3).i32(n_cells as i32).i32(n_los as i32);
    for _ in 0..251 {
        w.i32(0);
    }
    for los in 0..n_los {
        for name in COLUMNS_203 {
            for cell in 0..n_cells {
                w.f64(value(los, name, cell));
            }
        }
        for cell in 0..n_cells {
            w.i64(cell as i64);
        }
        w.i32(los as i32 + 100);
        w.i32(n_cells as i32);
    }
    w.into_bytes()
}

/// Header-only image for an arbitrary version word pair.
pub fn header_with_version(order: Endianness, major: i32, minor: i32) -> Vec<u8> {
    let mut w = Writer::new(order);
    w.i32(1).i32(major).i32(minor);
    for _ in 3..256 {
        w.i32(0);
    }
    w.into_bytes()
}

/// Deferred-width columns for a 3.x file laid out like 3.2 (minor 2..=5)
/// or 3.6 (minor 6..=8).
pub fn columns_3x(minor: i32) -> &'static [&'static str] {
    if minor < 6 {
        COLUMNS_302
    } else {
        COLUMNS_306
    }
}

/// Bytes in one 3.2/3.6 style line of sight with `n` cells. Both layouts
/// default to double precision.
pub fn record_size_3x(minor: i32, n: usize) -> usize {
    12 + (columns_3x(minor).len() * n + 12) * 8 + 8 * n
}

/// A synthetic 3.2..=3.8 file. The header uses the 2.3 layout and each
/// line of sight stores its own `N_cells`, so `header_n_cells` can differ
/// from every record's count.
pub fn file_3x(order: Endianness, minor: i32, header_n_cells: i32, cells: &[usize]) -> Vec<u8> {
    let mut w = Writer::new(order);
    w.i32(1).i32(3).i32(minor).i32(header_n_cells).i32(cells.len() as i32);
    for _ in 0..251 {
        w.i32(0);
    }
    for (los, &n) in cells.iter().enumerate() {
        w.i32(n as i32)
            .i32(los as i32 * 7)
            .i32(record_size_3x(minor, n) as i32);
        for name in columns_3x(minor) {
            for cell in 0..n {
                w.f64(value(los, name, cell));
            }
        }
        for i in 0..12 {
            w.f64(value(los, "Ncols", i));
        }
        for cell in 0..n {
            w.i64(cell as i64 + 1);
        }
    }
    w.into_bytes()
}
