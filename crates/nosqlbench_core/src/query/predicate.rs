//! Predicate evaluation against entity fields.

use crate::error::{CoreError, CoreResult};
use crate::value::{FieldValue, Fields};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryOperator {
    /// Structural equality.
    Equals,
    /// Negated structural equality.
    NotEquals,
    /// Field `>` value (numeric, same type).
    Greater,
    /// Field `>=` value (numeric, same type).
    GreaterEquals,
    /// Field `<` value (numeric, same type).
    Lesser,
    /// Field `<=` value (numeric, same type).
    LesserEquals,
    /// Field text contains value text.
    Like,
    /// Field list contains value.
    Contains,
}

impl QueryOperator {
    /// Returns true for the four numeric ordering operators.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::Greater | Self::GreaterEquals | Self::Lesser | Self::LesserEquals
        )
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::Greater => "GREATER",
            Self::GreaterEquals => "GREATER_EQUALS",
            Self::Lesser => "LESSER",
            Self::LesserEquals => "LESSER_EQUALS",
            Self::Like => "LIKE",
            Self::Contains => "CONTAINS",
        };
        f.write_str(name)
    }
}

/// A single `field operator value` comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPredicate {
    /// Name of the field to test.
    pub field: String,
    /// Comparison operator.
    pub operator: QueryOperator,
    /// Value to compare against.
    pub value: FieldValue,
}

impl QueryPredicate {
    /// Creates a predicate.
    pub fn new(
        field: impl Into<String>,
        operator: QueryOperator,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, QueryOperator::Equals, value)
    }

    /// `field != value`
    pub fn not_equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, QueryOperator::NotEquals, value)
    }

    /// `field > value`
    pub fn greater(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, QueryOperator::Greater, value)
    }

    /// `field >= value`
    pub fn greater_equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, QueryOperator::GreaterEquals, value)
    }

    /// `field < value`
    pub fn lesser(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, QueryOperator::Lesser, value)
    }

    /// `field <= value`
    pub fn lesser_equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, QueryOperator::LesserEquals, value)
    }

    /// `field` contains the substring `value`.
    pub fn like(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, QueryOperator::Like, FieldValue::Text(value.into()))
    }

    /// `field` is a list containing `value`.
    pub fn contains(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, QueryOperator::Contains, value)
    }

    /// Tests the predicate against an entity's fields.
    ///
    /// A missing field is treated as null: `EQUALS` never matches it,
    /// `NOT_EQUALS` always does, and every other operator fails.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` when the operator cannot be applied to the
    /// field and predicate value types.
    pub fn matches(&self, fields: &Fields) -> CoreResult<bool> {
        let field = fields.get(&self.field);
        match self.operator {
            QueryOperator::Equals => Ok(field == Some(&self.value)),
            QueryOperator::NotEquals => Ok(field != Some(&self.value)),
            QueryOperator::Greater => self.compare(field, |a, b| a > b),
            QueryOperator::GreaterEquals => self.compare(field, |a, b| a >= b),
            QueryOperator::Lesser => self.compare(field, |a, b| a < b),
            QueryOperator::LesserEquals => self.compare(field, |a, b| a <= b),
            QueryOperator::Like => match (field, &self.value) {
                (Some(FieldValue::Text(haystack)), FieldValue::Text(needle)) => {
                    Ok(haystack.contains(needle.as_str()))
                }
                _ => Err(CoreError::invalid_query(format!(
                    "LIKE on field {:?} requires both field and value to be text",
                    self.field
                ))),
            },
            QueryOperator::Contains => match field {
                Some(FieldValue::TextList(items)) => Ok(match &self.value {
                    FieldValue::Text(needle) => items.iter().any(|item| item == needle),
                    _ => false,
                }),
                _ => Err(CoreError::invalid_query(format!(
                    "CONTAINS can only be used on list fields, {:?} is {}",
                    self.field,
                    describe(field)
                ))),
            },
        }
    }

    fn compare(
        &self,
        field: Option<&FieldValue>,
        cmp: impl Fn(f64, f64) -> bool,
    ) -> CoreResult<bool> {
        let Some(field) = field else {
            return Err(CoreError::invalid_query(format!(
                "{} on missing field {:?}",
                self.operator, self.field
            )));
        };
        if !field.same_type(&self.value) {
            return Err(CoreError::invalid_query(format!(
                "{} on field {:?}: field is {} but value is {}",
                self.operator,
                self.field,
                field.type_name(),
                self.value.type_name()
            )));
        }
        match (field.as_f64(), self.value.as_f64()) {
            (Some(lhs), Some(rhs)) => Ok(cmp(lhs, rhs)),
            _ => Err(CoreError::invalid_query(format!(
                "{} can not be used on non-numeric field {:?}",
                self.operator, self.field
            ))),
        }
    }
}

fn describe(field: Option<&FieldValue>) -> &'static str {
    field.map_or("missing", FieldValue::type_name)
}

/// Tests a conjunction of predicates.
///
/// Evaluation stops at the first predicate that does not match, so later
/// predicates are never evaluated (and cannot fail) for that entity.
///
/// # Errors
///
/// Returns the first `InvalidQuery` raised by an evaluated predicate.
pub fn matches_all(predicates: &[QueryPredicate], fields: &Fields) -> CoreResult<bool> {
    for predicate in predicates {
        if !predicate.matches(fields)? {
            return Ok(false);
        }
    }
    Ok(true)
}
