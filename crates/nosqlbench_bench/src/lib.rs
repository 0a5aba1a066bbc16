//! Benchmarks for the nosqlbench in-memory store.
//!
//! Shared data helpers live in [`utils`]; the criterion benches are under
//! `benches/`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
