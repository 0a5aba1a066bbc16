//! Benchmark utilities.

use nosqlbench_core::{Database, FieldValue, Fields, MemoryDatabase, StoreConfig};
use nosqlbench_testkit::data::random_fields;
use rand::Rng;

/// Kind used by every benchmark.
pub const BENCH_KIND: &str = "BenchTest";

/// Opens an initialized in-memory store.
pub fn open_store() -> MemoryDatabase {
    MemoryDatabase::open(&StoreConfig::default()).expect("Failed to open in-memory store")
}

/// Generate a batch of random `{number, text}` entities.
pub fn generate_fields(count: usize) -> Vec<Fields> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| random_fields(&mut rng)).collect()
}

/// Generate `{number}` entities with numbers below `bound`.
pub fn generate_numbers(count: usize, bound: i64) -> Vec<Fields> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut fields = Fields::new();
            fields.insert("number".to_string(), FieldValue::Integer(rng.gen_range(0..bound)));
            fields
        })
        .collect()
}

/// Inserts every entity outside a transaction and returns their keys.
pub fn populate(db: &MemoryDatabase, entities: Vec<Fields>) -> Vec<String> {
    let mut session = db.session();
    entities
        .into_iter()
        .map(|fields| {
            db.insert(&mut session, BENCH_KIND, fields)
                .expect("Failed to insert")
        })
        .collect()
}
