//! # nosqlbench Core
//!
//! Storage contract and reference store for the nosqlbench harness.
//!
//! This crate provides:
//! - The [`Database`] contract every benchmark backend implements
//! - Entity keys and typed field values
//! - A predicate evaluator for simple filtered scans
//! - [`MemoryDatabase`], an in-memory store with optimistic,
//!   version-checked transactions that serves as the reference semantics
//!
//! ## Example
//!
//! ```rust
//! use nosqlbench_core::{Database, FieldValue, Fields, MemoryDatabase, StoreConfig};
//!
//! let db = MemoryDatabase::new();
//! db.init(&StoreConfig::default()).unwrap();
//!
//! let mut session = db.session();
//! let mut fields = Fields::new();
//! fields.insert("number".to_string(), FieldValue::Integer(0));
//! let key = db.insert(&mut session, "Counter", fields).unwrap();
//!
//! db.start_transaction(&mut session).unwrap();
//! let mut current = db.get(&mut session, &key).unwrap().unwrap();
//! current.insert("number".to_string(), FieldValue::Integer(1));
//! db.put(&mut session, "Counter", &key, current).unwrap();
//! db.commit_transaction(&mut session).unwrap();
//!
//! assert_eq!(db.version_of(&key).unwrap(), Some(2));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod contract;
mod entity;
mod error;
mod query;
mod schema;
mod stats;
mod store;
mod value;

pub use config::{IdStrategy, StoreConfig, UnreadWritePolicy};
pub use contract::{Database, QueryResults};
pub use entity::{Entity, Key, KEY_DELIMITER};
pub use error::{CoreError, CoreResult};
pub use query::{matches_all, QueryOperator, QueryPredicate};
pub use schema::{FieldDefinition, FieldType, IndexType};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{
    MemoryDatabase, OperationKind, PendingOperation, Session, TransactionContext, VersionCheck,
};
pub use value::{FieldValue, Fields};
