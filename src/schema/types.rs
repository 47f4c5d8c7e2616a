//! Schema types for versioned RT data files.
//!
//! A schema is an ordered list of [`FieldSpec`]s. Each field carries a
//! width (a concrete numeric type or a deferred float width), a repeat
//! count and a presence flag; counts and flags may be literals or
//! [`RefPath`]s that are only resolved at decode time.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Largest minor version representable in the zero-padded map key.
pub const MAX_MINOR: u32 = 99;

/// A file format version, ordered by `(major, minor)`.
///
/// The derived ordering is equivalent to lexicographic ordering of the
/// zero-padded key returned by [`VersionKey::key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    pub major: u32,
    pub minor: u32,
}

impl VersionKey {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The fixed-width key used by the schema catalog, e.g. `"0309"`.
    pub fn key(&self) -> String {
        format!("{:02}{:02}", self.major, self.minor)
    }

    /// Parse a catalog key of the form `MMmm`.
    pub fn from_key(key: &str) -> Result<Self, SchemaError> {
        let invalid = || {
            SchemaError::ParseError(format!(
                "Invalid version key '{}': expected four digits",
                key
            ))
        };
        if key.len() != 4 || !key.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let major = key[..2].parse().map_err(|_| invalid())?;
        let minor = key[2..].parse().map_err(|_| invalid())?;
        Ok(Self { major, minor })
    }

    /// Every version from `self` up to and including `max`.
    ///
    /// Minor versions run over the full padded range before rolling over
    /// into the next major version.
    pub fn range_inclusive(self, max: VersionKey) -> impl Iterator<Item = VersionKey> {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next.filter(|v| *v <= max)?;
            next = if current.minor < MAX_MINOR {
                Some(VersionKey::new(current.major, current.minor + 1))
            } else {
                current
                    .major
                    .checked_add(1)
                    .map(|major| VersionKey::new(major, 0))
            };
            Some(current)
        })
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionKey {
    type Err = SchemaError;

    /// Accepts either `"3.9"` or the padded key `"0309"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((major, minor)) => {
                let parse = |part: &str| {
                    part.trim().parse::<u32>().map_err(|_| {
                        SchemaError::ParseError(format!("Invalid version '{}'", s))
                    })
                };
                Ok(Self::new(parse(major)?, parse(minor)?))
            }
            None => Self::from_key(s),
        }
    }
}

impl From<(u32, u32)> for VersionKey {
    fn from((major, minor): (u32, u32)) -> Self {
        Self::new(major, minor)
    }
}

/// A concrete fixed-width numeric storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    /// 32-bit signed integer (`i4`).
    Int32,
    /// 64-bit signed integer (`i8`).
    Int64,
    /// 32-bit unsigned integer (`u4`).
    UInt32,
    /// 64-bit unsigned integer (`u8`).
    UInt64,
    /// 32-bit IEEE 754 float (`f4`).
    Float32,
    /// 64-bit IEEE 754 float (`f8`).
    Float64,
}

impl NumericType {
    /// Size of one element in bytes.
    pub fn width(&self) -> usize {
        match self {
            NumericType::Int32 | NumericType::UInt32 | NumericType::Float32 => 4,
            NumericType::Int64 | NumericType::UInt64 | NumericType::Float64 => 8,
        }
    }

    /// The catalog code for this type.
    pub fn code(&self) -> &'static str {
        match self {
            NumericType::Int32 => "i4",
            NumericType::Int64 => "i8",
            NumericType::UInt32 => "u4",
            NumericType::UInt64 => "u8",
            NumericType::Float32 => "f4",
            NumericType::Float64 => "f8",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "i4" => Some(NumericType::Int32),
            "i8" => Some(NumericType::Int64),
            "u4" => Some(NumericType::UInt32),
            "u8" => Some(NumericType::UInt64),
            "f4" => Some(NumericType::Float32),
            "f8" => Some(NumericType::Float64),
            _ => None,
        }
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Storage width of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthSpec {
    /// Fixed type, independent of the precision flag.
    Fixed(NumericType),
    /// Float whose width is picked at decode time: `f4` when the
    /// precision flag is set, `f8` otherwise.
    Deferred,
}

impl WidthSpec {
    /// Catalog code `"f"` denotes a deferred width.
    pub fn from_code(code: &str) -> Option<Self> {
        if code == "f" {
            return Some(WidthSpec::Deferred);
        }
        NumericType::from_code(code).map(WidthSpec::Fixed)
    }
}

/// A dotted lookup chain such as `header.N_cells`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefPath {
    segments: Vec<String>,
}

impl RefPath {
    pub fn parse(path: &str) -> Result<Self, SchemaError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(SchemaError::ParseError(format!(
                "Invalid reference path '{}'",
                path
            )));
        }
        Ok(Self { segments })
    }

    /// Build a path from already split segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Number of elements stored for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountSpec {
    Literal(usize),
    Path(RefPath),
}

/// Whether a field is present on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagSpec {
    Literal(bool),
    Path(RefPath),
}

impl Default for FlagSpec {
    fn default() -> Self {
        FlagSpec::Literal(true)
    }
}

/// One field of a schema, in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub width: WidthSpec,
    pub count: CountSpec,
    pub flag: FlagSpec,
}

impl FieldSpec {
    /// Create an always-present field.
    pub fn new(name: impl Into<String>, width: WidthSpec, count: CountSpec) -> Self {
        Self {
            name: name.into(),
            width,
            count,
            flag: FlagSpec::default(),
        }
    }

    /// Gate this field on a presence flag.
    pub fn with_flag(mut self, flag: FlagSpec) -> Self {
        self.flag = flag;
        self
    }

    /// Internal fields are consumed from the stream but never exposed.
    pub fn is_internal(&self) -> bool {
        is_internal_name(&self.name)
    }
}

/// Names with a leading underscore are decoded but not exposed.
pub fn is_internal_name(name: &str) -> bool {
    name.starts_with('_')
}

/// Ordered field list for one decodable region.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declared order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Flag name to boolean value.
pub type FlagSet = BTreeMap<String, bool>;

/// The three independently inherited catalog tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTable {
    Header,
    Flags,
    Record,
}

impl fmt::Display for SchemaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaTable::Header => "header schema",
            SchemaTable::Flags => "default flags",
            SchemaTable::Record => "record schema",
        };
        f.write_str(name)
    }
}
