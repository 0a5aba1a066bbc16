//! Property-based test generators using proptest.
//!
//! Provides strategies for generating field values, entity fields,
//! kinds and predicates.

use nosqlbench_core::{FieldValue, Fields, QueryOperator, QueryPredicate};
use proptest::prelude::*;

/// Strategy for valid entity kinds (no delimiter, never empty).
pub fn kind_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Za-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for any field value.
///
/// Doubles are finite so that structural equality holds.
pub fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<i64>().prop_map(FieldValue::Integer),
        (-1.0e12f64..1.0e12).prop_map(FieldValue::Double),
        "[a-z ]{0,24}".prop_map(FieldValue::Text),
        prop::collection::vec("[a-z]{1,8}", 0..5).prop_map(FieldValue::TextList),
    ]
}

/// Strategy for a field map of up to `max_fields` entries.
pub fn fields_strategy(max_fields: usize) -> impl Strategy<Value = Fields> {
    prop::collection::btree_map("[a-z]{1,10}", field_value_strategy(), 0..=max_fields)
}

/// Strategy for an ordering operator.
pub fn ordering_operator_strategy() -> impl Strategy<Value = QueryOperator> {
    prop_oneof![
        Just(QueryOperator::Greater),
        Just(QueryOperator::GreaterEquals),
        Just(QueryOperator::Lesser),
        Just(QueryOperator::LesserEquals),
    ]
}

/// Strategy for a well-typed ordering predicate on an integer field.
pub fn number_predicate_strategy() -> impl Strategy<Value = QueryPredicate> {
    (ordering_operator_strategy(), -100i64..100)
        .prop_map(|(operator, value)| QueryPredicate::new("number", operator, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosqlbench_core::Key;

    proptest! {
        #[test]
        fn kinds_make_valid_keys(kind in kind_strategy()) {
            prop_assert!(Key::new(kind).is_ok());
        }

        #[test]
        fn number_predicates_never_fail_on_integers(
            predicate in number_predicate_strategy(),
            n in -100i64..100,
        ) {
            let mut fields = Fields::new();
            fields.insert("number".into(), FieldValue::Integer(n));
            prop_assert!(predicate.matches(&fields).is_ok());
        }
    }
}
