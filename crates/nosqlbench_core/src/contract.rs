//! The storage contract every benchmark backend implements.

use crate::config::StoreConfig;
use crate::error::CoreResult;
use crate::query::QueryPredicate;
use crate::schema::FieldDefinition;
use crate::value::Fields;
use std::collections::BTreeMap;

/// Query results keyed by encoded entity key (`kind:id`).
pub type QueryResults = BTreeMap<String, Fields>;

/// A backend that workloads can drive.
///
/// Workloads are written only against this trait, so the in-memory
/// reference store and vendor adapters are interchangeable.
///
/// # Sessions
///
/// Transaction state is never ambient. Each worker owns a
/// [`Database::Session`] and passes it to every call; a session holds at
/// most one active transaction. Sessions are not shared between threads.
///
/// # Invariants
///
/// - Every operation fails with `NotInitialized` before `init`
/// - Outside a transaction, `insert`/`put`/`delete` apply immediately
/// - Inside a transaction, writes are buffered until `commit_transaction`,
///   which applies all of them or none
/// - A failed commit leaves the backend unchanged and ends the transaction
///
/// # Implementors
///
/// - [`crate::MemoryDatabase`] - the reference implementation
pub trait Database: Send + Sync {
    /// Per-caller context carrying transaction state.
    type Session: Default + Send;

    /// Creates a fresh session for one caller.
    fn session(&self) -> Self::Session {
        Self::Session::default()
    }

    /// Prepares the backend for use, discarding any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized.
    fn init(&self, config: &StoreConfig) -> CoreResult<()>;

    /// Declares the fields of an entity kind.
    ///
    /// Backends with secondary indexes build them here.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`.
    fn register(&self, kind: &str, fields: &[FieldDefinition]) -> CoreResult<()>;

    /// Removes every entity of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`.
    fn cleanup(&self, kind: &str) -> CoreResult<()>;

    /// Starts a transaction in the session.
    ///
    /// # Errors
    ///
    /// Returns `TransactionAlreadyActive` if the session already has one.
    fn start_transaction(&self, session: &mut Self::Session) -> CoreResult<()>;

    /// Validates and applies every buffered write, then ends the transaction.
    ///
    /// # Errors
    ///
    /// Returns `VersionConflict` if any captured version is stale; nothing
    /// is applied in that case.
    fn commit_transaction(&self, session: &mut Self::Session) -> CoreResult<()>;

    /// Discards the session's transaction without applying anything.
    ///
    /// # Errors
    ///
    /// Only backends with strict boundaries fail, with
    /// `TransactionNotActive`.
    fn rollback_transaction(&self, session: &mut Self::Session) -> CoreResult<()>;

    /// Creates a new entity and returns its encoded key.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`, or `InvalidKey` for a bad kind.
    fn insert(&self, session: &mut Self::Session, kind: &str, fields: Fields)
        -> CoreResult<String>;

    /// Reads an entity's fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the key cannot be parsed.
    fn get(&self, session: &mut Self::Session, key: &str) -> CoreResult<Option<Fields>>;

    /// Replaces an entity's fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the key cannot be parsed or is of another kind.
    fn put(&self, session: &mut Self::Session, kind: &str, key: &str, fields: Fields)
        -> CoreResult<()>;

    /// Deletes an entity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the key cannot be parsed or is of another kind.
    fn delete(&self, session: &mut Self::Session, kind: &str, key: &str) -> CoreResult<()>;

    /// Returns entities of `kind` matching every predicate.
    ///
    /// The first `skip` matches are dropped and at most `limit` are
    /// returned (`0` means no limit).
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` if a predicate cannot be evaluated.
    fn query_simple(
        &self,
        session: &mut Self::Session,
        kind: &str,
        predicates: &[QueryPredicate],
        skip: usize,
        limit: usize,
    ) -> CoreResult<QueryResults>;

    /// Releases per-session resources once a worker is done.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release resources.
    fn finish(&self, session: &mut Self::Session) -> CoreResult<()>;
}
