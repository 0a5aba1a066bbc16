//! Typed field values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The field mapping of an entity.
///
/// A `BTreeMap` keeps field order stable, so two copies of the same
/// entity compare and print identically.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single field value.
///
/// The set of variants is closed: integers, doubles, strings and string
/// lists cover every workload, and each variant has explicit comparison
/// rules in the predicate evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Signed 64-bit integer.
    Integer(i64),
    /// Double-precision float.
    Double(f64),
    /// UTF-8 text.
    Text(String),
    /// A list of strings, queried with `CONTAINS`.
    TextList(Vec<String>),
}

impl FieldValue {
    /// Returns the name of this value's type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "integer",
            FieldValue::Double(_) => "double",
            FieldValue::Text(_) => "text",
            FieldValue::TextList(_) => "text list",
        }
    }

    /// Returns true for `Integer` and `Double`.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Integer(_) | FieldValue::Double(_))
    }

    /// Returns true if both values have the same variant.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Converts a numeric value to `f64`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Gets this value as an integer, if it is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets this value as text, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Gets this value as a string list, if it is one.
    #[must_use]
    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::TextList(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Double(d) => write!(f, "{d}"),
            FieldValue::Text(s) => write!(f, "{s:?}"),
            FieldValue::TextList(items) => write!(f, "{items:?}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(d: f64) -> Self {
        FieldValue::Double(d)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::TextList(items)
    }
}
