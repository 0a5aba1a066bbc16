//! In-memory store with optimistic, version-checked transactions.

use super::context::{PendingOperation, Session, VersionCheck};
use crate::config::{IdStrategy, StoreConfig, UnreadWritePolicy};
use crate::contract::{Database, QueryResults};
use crate::entity::{Entity, Key};
use crate::error::{CoreError, CoreResult};
use crate::query::{matches_all, QueryPredicate};
use crate::schema::FieldDefinition;
use crate::stats::StoreStats;
use crate::value::Fields;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace};
use uuid::Uuid;

/// Resident data, present once `init` has run.
#[derive(Debug)]
struct StoreState {
    config: StoreConfig,
    entities: BTreeMap<Key, Entity>,
}

impl StoreState {
    fn new(config: StoreConfig) -> Self {
        Self {
            config,
            entities: BTreeMap::new(),
        }
    }

    /// Committed version of a key, 0 if absent.
    fn version(&self, key: &Key) -> u64 {
        self.entities.get(key).map_or(0, Entity::version)
    }

    fn validate(&self, operations: &[PendingOperation]) -> CoreResult<()> {
        for op in operations {
            // An unresolved key cannot exist yet.
            if !op.key().is_resolved() {
                continue;
            }
            let current = self.version(op.key());
            if let Some(expected) = op.check().violated_by(current) {
                return Err(CoreError::version_conflict(
                    op.key().to_string(),
                    expected,
                    current,
                ));
            }
        }
        Ok(())
    }
}

/// The reference [`Database`] implementation.
///
/// All resident entities live in one map behind a single mutex. Commits,
/// cleanup and one-shot writes take that lock for their whole
/// validate-then-apply step, so commits are linearizable. Transaction
/// buffers live in each caller's [`Session`] and are never shared.
///
/// # Versions
///
/// An entity's version is 0 until its first commit and increments by
/// exactly one on every committed upsert. A transactional write commits
/// only if the version it captured still matches.
///
/// # Example
///
/// ```rust
/// use nosqlbench_core::{Database, FieldValue, Fields, MemoryDatabase, StoreConfig};
///
/// let db = MemoryDatabase::new();
/// db.init(&StoreConfig::default()).unwrap();
///
/// let mut fields = Fields::new();
/// fields.insert("number".into(), FieldValue::Integer(0));
/// let mut setup = db.session();
/// let key = db.insert(&mut setup, "Counter", fields).unwrap();
///
/// let mut a = db.session();
/// let mut b = db.session();
/// db.start_transaction(&mut a).unwrap();
/// db.start_transaction(&mut b).unwrap();
/// let fa = db.get(&mut a, &key).unwrap().unwrap();
/// let fb = db.get(&mut b, &key).unwrap().unwrap();
/// db.put(&mut a, "Counter", &key, fa).unwrap();
/// db.put(&mut b, "Counter", &key, fb).unwrap();
///
/// db.commit_transaction(&mut a).unwrap();
/// let err = db.commit_transaction(&mut b).unwrap_err();
/// assert!(err.is_conflict());
/// ```
#[derive(Debug)]
pub struct MemoryDatabase {
    state: Mutex<Option<StoreState>>,
    /// Next sequential id; never reset, so ids are not reused.
    next_id: AtomicU64,
    stats: StoreStats,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Creates an uninitialized store. Call `init` before use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
            next_id: AtomicU64::new(1),
            stats: StoreStats::new(),
        }
    }

    /// Creates and initializes a store in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    pub fn open(config: &StoreConfig) -> CoreResult<Self> {
        let db = Self::new();
        db.init(config)?;
        Ok(db)
    }

    /// Returns the store statistics.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Returns the committed version of an entity, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`, or `InvalidKey` if the key
    /// cannot be parsed.
    pub fn version_of(&self, key: &str) -> CoreResult<Option<u64>> {
        let key = Key::parse(key)?;
        let guard = self.state.lock();
        let state = guard.as_ref().ok_or(CoreError::NotInitialized)?;
        Ok(state.entities.get(&key).map(Entity::version))
    }

    /// Returns the number of resident entities.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`.
    pub fn len(&self) -> CoreResult<usize> {
        let guard = self.state.lock();
        let state = guard.as_ref().ok_or(CoreError::NotInitialized)?;
        Ok(state.entities.len())
    }

    /// Returns true if no entity is resident.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn config(&self) -> CoreResult<StoreConfig> {
        self.state
            .lock()
            .as_ref()
            .map(|state| state.config)
            .ok_or(CoreError::NotInitialized)
    }

    fn generate_id(&self, strategy: IdStrategy) -> String {
        let id = match strategy {
            IdStrategy::Sequential => self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
            IdStrategy::Uuid => Uuid::new_v4().to_string(),
        };
        trace!(id = %id, "generated entity id");
        id
    }

    /// Parses a key that must belong to `kind`.
    fn key_of_kind(kind: &str, key: &str) -> CoreResult<Key> {
        let key = Key::parse(key)?;
        if key.kind() != kind {
            return Err(CoreError::invalid_key(format!(
                "key {key} does not belong to kind {kind:?}"
            )));
        }
        Ok(key)
    }

    /// Validates and applies a batch under the store lock.
    ///
    /// Nothing is applied unless every operation passes its version check.
    fn apply(&self, operations: Vec<PendingOperation>) -> CoreResult<()> {
        let mut guard = self.state.lock();
        let state = guard.as_mut().ok_or(CoreError::NotInitialized)?;
        state.validate(&operations)?;

        let strategy = state.config.id_strategy;
        let mut writes = 0;
        let mut deletes = 0;
        for op in operations {
            match op {
                PendingOperation::Upsert { key, fields, .. } => {
                    let key = if key.is_resolved() {
                        key
                    } else {
                        key.resolved(self.generate_id(strategy))
                    };
                    let version = state.version(&key) + 1;
                    state
                        .entities
                        .insert(key.clone(), Entity::with_version(key, fields, version));
                    writes += 1;
                }
                PendingOperation::Delete { key, .. } => {
                    if state.entities.remove(&key).is_some() {
                        deletes += 1;
                    }
                }
            }
        }

        self.stats.record_writes(writes);
        self.stats.record_deletes(deletes);
        self.stats.set_entity_count(state.entities.len() as u64);
        Ok(())
    }

    /// Ends a transaction that is not there to end.
    fn missing_transaction(&self) -> CoreResult<()> {
        if self.config()?.strict_boundaries {
            Err(CoreError::TransactionNotActive)
        } else {
            Ok(())
        }
    }
}

impl Database for MemoryDatabase {
    type Session = Session;

    fn init(&self, config: &StoreConfig) -> CoreResult<()> {
        *self.state.lock() = Some(StoreState::new(*config));
        self.stats.set_entity_count(0);
        info!(?config, "in-memory store initialized");
        Ok(())
    }

    fn register(&self, kind: &str, fields: &[FieldDefinition]) -> CoreResult<()> {
        // Field typing is structural here; there are no indexes to build.
        self.config()?;
        debug!(kind, fields = fields.len(), "registered kind");
        Ok(())
    }

    fn cleanup(&self, kind: &str) -> CoreResult<()> {
        let mut guard = self.state.lock();
        let state = guard.as_mut().ok_or(CoreError::NotInitialized)?;
        let before = state.entities.len();
        state.entities.retain(|key, _| key.kind() != kind);
        let removed = before - state.entities.len();

        self.stats.record_deletes(removed as u64);
        self.stats.set_entity_count(state.entities.len() as u64);
        info!("Removed {} entities of kind {:?}", removed, kind);
        Ok(())
    }

    fn start_transaction(&self, session: &mut Session) -> CoreResult<()> {
        self.config()?;
        session.begin()?;
        self.stats.record_transaction_start();
        debug!("transaction started");
        Ok(())
    }

    fn commit_transaction(&self, session: &mut Session) -> CoreResult<()> {
        self.config()?;
        let Some(context) = session.take() else {
            return self.missing_transaction();
        };

        let operations: Vec<_> = context.into_operations().collect();
        let count = operations.len();
        match self.apply(operations) {
            Ok(()) => {
                self.stats.record_transaction_commit();
                debug!(operations = count, "transaction committed");
                Ok(())
            }
            Err(err) => {
                if let CoreError::VersionConflict {
                    key,
                    expected,
                    actual,
                } = &err
                {
                    self.stats.record_conflict();
                    debug!(%key, expected, actual, "commit rejected by version check");
                }
                Err(err)
            }
        }
    }

    fn rollback_transaction(&self, session: &mut Session) -> CoreResult<()> {
        self.config()?;
        match session.take() {
            Some(context) => {
                self.stats.record_transaction_rollback();
                debug!(operations = context.len(), "transaction rolled back");
                Ok(())
            }
            None => self.missing_transaction(),
        }
    }

    fn insert(&self, session: &mut Session, kind: &str, fields: Fields) -> CoreResult<String> {
        let config = self.config()?;
        let key = Key::new(kind)?.resolved(self.generate_id(config.id_strategy));
        let encoded = key.encode()?;

        match session.transaction_mut() {
            Some(context) => context.record(PendingOperation::Upsert {
                key,
                fields,
                check: VersionCheck::Exact(0),
            }),
            None => self.apply(vec![PendingOperation::Upsert {
                key,
                fields,
                check: VersionCheck::Unchecked,
            }])?,
        }
        Ok(encoded)
    }

    fn get(&self, session: &mut Session, key: &str) -> CoreResult<Option<Fields>> {
        let found = {
            let guard = self.state.lock();
            let state = guard.as_ref().ok_or(CoreError::NotInitialized)?;
            let key = Key::parse(key)?;
            if let Some(op) = session.transaction().and_then(|ctx| ctx.pending(&key)) {
                return Ok(op.visible_fields().cloned());
            }
            state.entities.get(&key).cloned()
        };

        let Some(entity) = found else {
            return Ok(None);
        };
        self.stats.record_read();
        if let Some(context) = session.transaction_mut() {
            context.record(PendingOperation::Upsert {
                key: entity.key().clone(),
                fields: entity.fields().clone(),
                check: VersionCheck::Exact(entity.version()),
            });
        }
        Ok(Some(entity.into_fields()))
    }

    fn put(&self, session: &mut Session, kind: &str, key: &str, fields: Fields) -> CoreResult<()> {
        let config = self.config()?;
        let key = Self::key_of_kind(kind, key)?;

        match session.transaction_mut() {
            Some(context) => {
                let check = context
                    .captured_check(&key)
                    .unwrap_or_else(|| unread_check(config.unread_write_policy));
                context.record(PendingOperation::Upsert { key, fields, check });
                Ok(())
            }
            None => self.apply(vec![PendingOperation::Upsert {
                key,
                fields,
                check: VersionCheck::Unchecked,
            }]),
        }
    }

    fn delete(&self, session: &mut Session, kind: &str, key: &str) -> CoreResult<()> {
        let config = self.config()?;
        let key = Self::key_of_kind(kind, key)?;

        match session.transaction_mut() {
            Some(context) => {
                let check = context
                    .captured_check(&key)
                    .unwrap_or_else(|| unread_check(config.unread_write_policy));
                context.record(PendingOperation::Delete { key, check });
                Ok(())
            }
            None => self.apply(vec![PendingOperation::Delete {
                key,
                check: VersionCheck::Unchecked,
            }]),
        }
    }

    fn query_simple(
        &self,
        session: &mut Session,
        kind: &str,
        predicates: &[QueryPredicate],
        skip: usize,
        limit: usize,
    ) -> CoreResult<QueryResults> {
        // Unresolved keys sort first within a kind.
        let lower = Key::new(kind)?;
        let mut results = QueryResults::new();
        let mut observed = Vec::new();
        {
            let guard = self.state.lock();
            let state = guard.as_ref().ok_or(CoreError::NotInitialized)?;
            self.stats.record_scan();

            let mut skipped = 0;
            for (key, entity) in state.entities.range(lower..) {
                if key.kind() != kind {
                    break;
                }
                if !matches_all(predicates, entity.fields())? {
                    continue;
                }
                if skipped < skip {
                    skipped += 1;
                    continue;
                }
                results.insert(key.encode()?, entity.fields().clone());
                observed.push((key.clone(), entity.fields().clone(), entity.version()));
                if limit != 0 && results.len() >= limit {
                    break;
                }
            }
        }

        if let Some(context) = session.transaction_mut() {
            for (key, fields, version) in observed {
                if context.pending(&key).is_none() {
                    context.record(PendingOperation::Upsert {
                        key,
                        fields,
                        check: VersionCheck::Exact(version),
                    });
                }
            }
        }
        Ok(results)
    }

    fn finish(&self, session: &mut Session) -> CoreResult<()> {
        self.config()?;
        if let Some(context) = session.take() {
            self.stats.record_transaction_rollback();
            debug!(
                operations = context.len(),
                "session finished with an open transaction, discarded"
            );
        }
        Ok(())
    }
}

fn unread_check(policy: UnreadWritePolicy) -> VersionCheck {
    match policy {
        UnreadWritePolicy::Strict => VersionCheck::Exact(0),
        UnreadWritePolicy::Unchecked => VersionCheck::Unchecked,
    }
}
