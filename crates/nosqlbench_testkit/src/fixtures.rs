//! Store fixtures and field helpers.
//!
//! Provides convenience functions for setting up test stores and
//! reading the `number` field workloads operate on.

use nosqlbench_core::{FieldValue, Fields, MemoryDatabase, StoreConfig};
use nosqlbench_harness::{HarnessError, HarnessResult};
use std::sync::Arc;

/// Name of the integer field every transactional workload updates.
pub const NUMBER_FIELD: &str = "number";

/// Opens an initialized in-memory store with default settings.
pub fn memory_db() -> Arc<MemoryDatabase> {
    memory_db_with(StoreConfig::default())
}

/// Opens an initialized in-memory store with the given settings.
pub fn memory_db_with(config: StoreConfig) -> Arc<MemoryDatabase> {
    Arc::new(MemoryDatabase::open(&config).expect("Failed to initialize in-memory store"))
}

/// Runs a closure with a fresh in-memory store.
///
/// # Example
///
/// ```rust
/// use nosqlbench_core::Database;
/// use nosqlbench_testkit::{number_fields, with_memory_db};
///
/// with_memory_db(|db| {
///     let mut session = db.session();
///     let key = db.insert(&mut session, "Test", number_fields(1)).unwrap();
///     assert!(db.get(&mut session, &key).unwrap().is_some());
/// });
/// ```
pub fn with_memory_db<F, R>(f: F) -> R
where
    F: FnOnce(&Arc<MemoryDatabase>) -> R,
{
    let db = memory_db();
    f(&db)
}

/// Builds `{number: n}`.
pub fn number_fields(n: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert(NUMBER_FIELD.to_string(), FieldValue::Integer(n));
    fields
}

/// Reads the integer `number` field.
///
/// # Errors
///
/// Returns `Workload` if the field is missing or not an integer.
pub fn read_number(fields: &Fields) -> HarnessResult<i64> {
    fields
        .get(NUMBER_FIELD)
        .and_then(FieldValue::as_integer)
        .ok_or_else(|| {
            HarnessError::workload(format!("{NUMBER_FIELD:?} is missing or not an integer"))
        })
}

/// Adds `delta` to the `number` field in place and returns the new value.
///
/// # Errors
///
/// Returns `Workload` if the field is missing or not an integer.
pub fn add_to_number(fields: &mut Fields, delta: i64) -> HarnessResult<i64> {
    let value = read_number(fields)? + delta;
    fields.insert(NUMBER_FIELD.to_string(), FieldValue::Integer(value));
    Ok(value)
}
