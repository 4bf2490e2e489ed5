//! Labeled, column-oriented result frames
//!
//! A [`Frame`] is a named collection of equal-length [`Field`]s. Each field
//! carries its own label set and a typed column of values. This is the
//! generic multi-frame representation the execution engine's sub-results
//! decode into, and also the shape handed to renderers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Label set identifying one instance (one time series)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Create an empty label set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a label value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no labels
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate labels in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Canonical form: `k1=v1, k2=v2` in key order. Two label sets are the same
/// instance exactly when their canonical forms are equal.
impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    NullableFloat64,
    Float64,
    NullableInt64,
    Int64,
    NullableBool,
    Bool,
    NullableString,
    String,
    Time,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::NullableFloat64 => "nullable_float64",
            FieldType::Float64 => "float64",
            FieldType::NullableInt64 => "nullable_int64",
            FieldType::Int64 => "int64",
            FieldType::NullableBool => "nullable_bool",
            FieldType::Bool => "bool",
            FieldType::NullableString => "nullable_string",
            FieldType::String => "string",
            FieldType::Time => "time",
        };
        f.write_str(name)
    }
}

/// Typed column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValues {
    NullableFloat64 { values: Vec<Option<f64>> },
    Float64 { values: Vec<f64> },
    NullableInt64 { values: Vec<Option<i64>> },
    Int64 { values: Vec<i64> },
    NullableBool { values: Vec<Option<bool>> },
    Bool { values: Vec<bool> },
    NullableString { values: Vec<Option<String>> },
    String { values: Vec<String> },
    /// Epoch milliseconds
    Time { values: Vec<i64> },
}

impl FieldValues {
    /// Value type of the column
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValues::NullableFloat64 { .. } => FieldType::NullableFloat64,
            FieldValues::Float64 { .. } => FieldType::Float64,
            FieldValues::NullableInt64 { .. } => FieldType::NullableInt64,
            FieldValues::Int64 { .. } => FieldType::Int64,
            FieldValues::NullableBool { .. } => FieldType::NullableBool,
            FieldValues::Bool { .. } => FieldType::Bool,
            FieldValues::NullableString { .. } => FieldType::NullableString,
            FieldValues::String { .. } => FieldType::String,
            FieldValues::Time { .. } => FieldType::Time,
        }
    }

    /// Number of values in the column
    pub fn len(&self) -> usize {
        match self {
            FieldValues::NullableFloat64 { values } => values.len(),
            FieldValues::Float64 { values } => values.len(),
            FieldValues::NullableInt64 { values } => values.len(),
            FieldValues::Int64 { values } | FieldValues::Time { values } => values.len(),
            FieldValues::NullableBool { values } => values.len(),
            FieldValues::Bool { values } => values.len(),
            FieldValues::NullableString { values } => values.len(),
            FieldValues::String { values } => values.len(),
        }
    }

    /// Whether the column is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single labeled column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    #[serde(default)]
    pub name: String,
    /// Instance labels
    #[serde(default)]
    pub labels: Labels,
    /// Typed values
    #[serde(flatten)]
    pub values: FieldValues,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, labels: Labels, values: FieldValues) -> Self {
        Self {
            name: name.into(),
            labels,
            values,
        }
    }

    /// Value type of the field
    pub fn field_type(&self) -> FieldType {
        self.values.field_type()
    }

    /// Number of rows in the field
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the field has no rows
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric value at `idx`, `None` for nulls, out-of-range indexes and
    /// non-numeric columns
    pub fn float_at(&self, idx: usize) -> Option<f64> {
        match &self.values {
            FieldValues::NullableFloat64 { values } => values.get(idx).copied().flatten(),
            FieldValues::Float64 { values } => values.get(idx).copied(),
            FieldValues::NullableInt64 { values } => values.get(idx).copied().flatten().map(|v| v as f64),
            FieldValues::Int64 { values } => values.get(idx).map(|v| *v as f64),
            _ => None,
        }
    }
}

/// A named collection of equal-length fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame name
    #[serde(default)]
    pub name: String,
    /// Columns
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Frame {
    /// Create a new frame
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Number of rows, taken from the first field
    pub fn row_len(&self) -> usize {
        self.fields.first().map_or(0, Field::len)
    }
}

/// Ordered list of frames
pub type Frames = Vec<Frame>;
