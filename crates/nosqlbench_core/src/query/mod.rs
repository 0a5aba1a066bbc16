//! Simple predicate queries.

mod predicate;

pub use predicate::{matches_all, QueryOperator, QueryPredicate};
