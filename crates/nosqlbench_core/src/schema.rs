//! Field metadata passed to `register`.

use crate::value::FieldValue;
use serde::{Deserialize, Serialize};

/// Declared type of a registered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    /// Text values.
    String,
    /// 64-bit integers.
    Long,
    /// Double-precision floats.
    Double,
}

impl FieldType {
    /// Returns true if `value` is of this declared type.
    #[must_use]
    pub fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldType::String, FieldValue::Text(_))
                | (FieldType::Long, FieldValue::Integer(_))
                | (FieldType::Double, FieldValue::Double(_))
        )
    }
}

/// Kind of secondary index an adapter should build for a field.
///
/// Only meaningful to backends that maintain indexes; the in-memory
/// store ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexType {
    /// Equality lookups.
    Single,
    /// Ordered range scans.
    Range,
    /// Full-text search.
    Fulltext,
}

/// A field registered for an entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Declared value type.
    pub field_type: FieldType,
    /// Requested index.
    pub index_type: IndexType,
}

impl FieldDefinition {
    /// Creates a field definition.
    pub fn new(name: impl Into<String>, field_type: FieldType, index_type: IndexType) -> Self {
        Self {
            name: name.into(),
            field_type,
            index_type,
        }
    }
}
