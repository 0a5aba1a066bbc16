//! # nosqlbench Testkit
//!
//! Workloads and test utilities for nosqlbench backends.
//!
//! This crate provides:
//! - Workloads written only against the [`Database`](nosqlbench_core::Database)
//!   contract: bulk insert, predicate query, counter race, transfer race
//!   and an overlapping-transaction check
//! - Fixtures for in-memory stores
//! - Property-based generators using proptest
//! - Random bench data
//!
//! ## Usage
//!
//! ```rust
//! use nosqlbench_testkit::prelude::*;
//!
//! let db = memory_db();
//! let outcome = counter_race(db, &CounterConfig::new().threads(4).repeat(10)).unwrap();
//! assert_eq!(outcome.final_value, outcome.expected_value);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod acid;
pub mod config;
pub mod data;
pub mod fixtures;
pub mod generators;
pub mod insert;
pub mod tally;
pub mod transact;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::acid::*;
    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::insert::*;
    pub use crate::tally::*;
    pub use crate::transact::*;
}

pub use acid::*;
pub use config::*;
pub use fixtures::*;
pub use insert::*;
pub use tally::*;
pub use transact::*;
