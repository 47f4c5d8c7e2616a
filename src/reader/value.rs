//! Decoded value model.
//!
//! Every decoded field is either a single [`Scalar`] or a fixed-length
//! [`Column`] of one numeric type. A [`DecodedState`] keeps the fields of
//! one region in the order they were read.

use std::collections::HashMap;

use crate::schema::{is_internal_name, NumericType};

/// A single decoded number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    pub fn numeric_type(&self) -> NumericType {
        match self {
            Scalar::I32(_) => NumericType::Int32,
            Scalar::I64(_) => NumericType::Int64,
            Scalar::U32(_) => NumericType::UInt32,
            Scalar::U64(_) => NumericType::UInt64,
            Scalar::F32(_) => NumericType::Float32,
            Scalar::F64(_) => NumericType::Float64,
        }
    }

    /// Widen to f64. 64-bit integers beyond 2^53 lose precision.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::I32(v) => v as f64,
            Scalar::I64(v) => v as f64,
            Scalar::U32(v) => v as f64,
            Scalar::U64(v) => v as f64,
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
        }
    }

    /// Integer value as an element count; `None` for floats and negatives.
    pub fn as_count(&self) -> Option<usize> {
        match *self {
            Scalar::I32(v) => usize::try_from(v).ok(),
            Scalar::I64(v) => usize::try_from(v).ok(),
            Scalar::U32(v) => usize::try_from(v).ok(),
            Scalar::U64(v) => usize::try_from(v).ok(),
            Scalar::F32(_) | Scalar::F64(_) => None,
        }
    }

    /// Integer value as i64; `None` for floats and out-of-range u64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::I32(v) => Some(v as i64),
            Scalar::I64(v) => Some(v),
            Scalar::U32(v) => Some(v as i64),
            Scalar::U64(v) => i64::try_from(v).ok(),
            Scalar::F32(_) | Scalar::F64(_) => None,
        }
    }

    /// Nonzero values are true.
    pub fn is_truthy(&self) -> bool {
        match *self {
            Scalar::I32(v) => v != 0,
            Scalar::I64(v) => v != 0,
            Scalar::U32(v) => v != 0,
            Scalar::U64(v) => v != 0,
            Scalar::F32(v) => v != 0.0,
            Scalar::F64(v) => v != 0.0,
        }
    }
}

/// A decoded sequence of one numeric type.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    I32(Vec<i32>),
    I64(Vec<i64>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Column {
    /// An empty column of the given type.
    pub fn empty(ty: NumericType) -> Self {
        match ty {
            NumericType::Int32 => Column::I32(Vec::new()),
            NumericType::Int64 => Column::I64(Vec::new()),
            NumericType::UInt32 => Column::U32(Vec::new()),
            NumericType::UInt64 => Column::U64(Vec::new()),
            NumericType::Float32 => Column::F32(Vec::new()),
            NumericType::Float64 => Column::F64(Vec::new()),
        }
    }

    pub fn numeric_type(&self) -> NumericType {
        match self {
            Column::I32(_) => NumericType::Int32,
            Column::I64(_) => NumericType::Int64,
            Column::U32(_) => NumericType::UInt32,
            Column::U64(_) => NumericType::UInt64,
            Column::F32(_) => NumericType::Float32,
            Column::F64(_) => NumericType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::I32(v) => v.len(),
            Column::I64(v) => v.len(),
            Column::U32(v) => v.len(),
            Column::U64(v) => v.len(),
            Column::F32(v) => v.len(),
            Column::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            Column::I32(v) => v.get(index).copied().map(Scalar::I32),
            Column::I64(v) => v.get(index).copied().map(Scalar::I64),
            Column::U32(v) => v.get(index).copied().map(Scalar::U32),
            Column::U64(v) => v.get(index).copied().map(Scalar::U64),
            Column::F32(v) => v.get(index).copied().map(Scalar::F32),
            Column::F64(v) => v.get(index).copied().map(Scalar::F64),
        }
    }

    /// All elements widened to f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Column::I32(v) => v.iter().map(|&x| x as f64).collect(),
            Column::I64(v) => v.iter().map(|&x| x as f64).collect(),
            Column::U32(v) => v.iter().map(|&x| x as f64).collect(),
            Column::U64(v) => v.iter().map(|&x| x as f64).collect(),
            Column::F32(v) => v.iter().map(|&x| x as f64).collect(),
            Column::F64(v) => v.clone(),
        }
    }
}

/// A decoded field: one element is stored as a scalar, anything else as a
/// column (including the empty column for a zero count).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Array(Column),
}

impl Value {
    /// Collapse a single-element column into a scalar.
    pub fn from_column(column: Column) -> Self {
        match (column.len(), column.get(0)) {
            (1, Some(scalar)) => Value::Scalar(scalar),
            _ => Value::Array(column),
        }
    }

    pub fn numeric_type(&self) -> NumericType {
        match self {
            Value::Scalar(s) => s.numeric_type(),
            Value::Array(c) => c.numeric_type(),
        }
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Array(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::Array(_) => None,
        }
    }

    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Value::Scalar(_) => None,
            Value::Array(c) => Some(c),
        }
    }

    /// Element `index`, treating a scalar as a one-element sequence.
    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            Value::Scalar(s) if index == 0 => Some(*s),
            Value::Scalar(_) => None,
            Value::Array(c) => c.get(index),
        }
    }

    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.get(index).map(|s| s.as_f64())
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Value::Scalar(s) => vec![s.as_f64()],
            Value::Array(c) => c.to_f64_vec(),
        }
    }
}

/// Fields of one region, in read order, with lookup by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedState {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl DecodedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field; a repeated name replaces the earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Drop internal (underscore-prefixed) fields, keeping order.
    pub fn into_exposed(self) -> Self {
        let mut exposed = Self::new();
        for (name, value) in self.entries {
            if !is_internal_name(&name) {
                exposed.insert(name, value);
            }
        }
        exposed
    }
}
