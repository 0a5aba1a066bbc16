//! Per-session transaction buffers.

use crate::entity::Key;
use crate::error::{CoreError, CoreResult};
use crate::value::Fields;
use std::collections::HashMap;

/// Version a buffered operation expects to find at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// The committed version must equal this value (0 = absent).
    Exact(u64),
    /// No check; the write overwrites whatever is committed.
    Unchecked,
}

impl VersionCheck {
    /// Returns the version that fails this check, if `current` does.
    pub(crate) fn violated_by(self, current: u64) -> Option<u64> {
        match self {
            Self::Exact(expected) if expected != current => Some(expected),
            _ => None,
        }
    }
}

/// Kind of a buffered operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Insert or replace.
    Upsert,
    /// Remove.
    Delete,
}

/// A write recorded in a transaction, applied at commit.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOperation {
    /// Insert or replace an entity.
    Upsert {
        /// Target key.
        key: Key,
        /// Fields to store.
        fields: Fields,
        /// Version expected at commit.
        check: VersionCheck,
    },
    /// Delete an entity.
    Delete {
        /// Target key.
        key: Key,
        /// Version expected at commit.
        check: VersionCheck,
    },
}

impl PendingOperation {
    /// Returns the operation kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Upsert { .. } => OperationKind::Upsert,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Returns the target key.
    #[must_use]
    pub fn key(&self) -> &Key {
        match self {
            Self::Upsert { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    /// Returns the version check.
    #[must_use]
    pub fn check(&self) -> VersionCheck {
        match self {
            Self::Upsert { check, .. } | Self::Delete { check, .. } => *check,
        }
    }

    /// Returns the buffered fields as a reader in the same transaction
    /// sees them: `None` for a delete.
    #[must_use]
    pub fn visible_fields(&self) -> Option<&Fields> {
        match self {
            Self::Upsert { fields, .. } => Some(fields),
            Self::Delete { .. } => None,
        }
    }
}

/// Buffered operations of one transaction, keyed by target.
///
/// Holds at most one operation per key: a later write replaces an
/// earlier one but inherits its version check.
#[derive(Debug, Default)]
pub struct TransactionContext {
    operations: HashMap<Key, PendingOperation>,
}

impl TransactionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the buffered operation for a key.
    #[must_use]
    pub fn pending(&self, key: &Key) -> Option<&PendingOperation> {
        self.operations.get(key)
    }

    /// Returns the version check captured for a key, if any.
    #[must_use]
    pub fn captured_check(&self, key: &Key) -> Option<VersionCheck> {
        self.operations.get(key).map(PendingOperation::check)
    }

    /// Buffers an operation, replacing any earlier one for the same key.
    pub fn record(&mut self, operation: PendingOperation) {
        self.operations.insert(operation.key().clone(), operation);
    }

    /// Returns the number of buffered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterates over the buffered operations.
    pub fn operations(&self) -> impl Iterator<Item = &PendingOperation> {
        self.operations.values()
    }

    pub(crate) fn into_operations(self) -> impl Iterator<Item = PendingOperation> {
        self.operations.into_values()
    }
}

/// One caller's view of the store.
///
/// Owned by a single worker and passed to every store call. Holds the
/// active transaction, if any.
#[derive(Debug, Default)]
pub struct Session {
    transaction: Option<TransactionContext>,
}

impl Session {
    /// Creates a session with no active transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a transaction is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.transaction.is_some()
    }

    /// Returns the number of operations buffered in the active
    /// transaction (0 when none is active).
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.transaction.as_ref().map_or(0, TransactionContext::len)
    }

    /// Returns the active transaction.
    #[must_use]
    pub fn transaction(&self) -> Option<&TransactionContext> {
        self.transaction.as_ref()
    }

    pub(crate) fn transaction_mut(&mut self) -> Option<&mut TransactionContext> {
        self.transaction.as_mut()
    }

    pub(crate) fn begin(&mut self) -> CoreResult<()> {
        if self.transaction.is_some() {
            return Err(CoreError::TransactionAlreadyActive);
        }
        self.transaction = Some(TransactionContext::new());
        Ok(())
    }

    pub(crate) fn take(&mut self) -> Option<TransactionContext> {
        self.transaction.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    fn key(id: &str) -> Key {
        Key::with_id("Test", id).unwrap()
    }

    #[test]
    fn version_check() {
        assert_eq!(VersionCheck::Exact(2).violated_by(2), None);
        assert_eq!(VersionCheck::Exact(2).violated_by(3), Some(2));
        assert_eq!(VersionCheck::Unchecked.violated_by(7), None);
    }

    #[test]
    fn later_write_replaces_earlier() {
        let mut ctx = TransactionContext::new();
        ctx.record(PendingOperation::Upsert {
            key: key("1"),
            fields: Fields::new(),
            check: VersionCheck::Exact(3),
        });
        ctx.record(PendingOperation::Delete {
            key: key("1"),
            check: VersionCheck::Exact(3),
        });

        assert_eq!(ctx.len(), 1);
        let op = ctx.pending(&key("1")).unwrap();
        assert_eq!(op.kind(), OperationKind::Delete);
        assert!(op.visible_fields().is_none());
    }

    #[test]
    fn upsert_is_visible() {
        let mut fields = Fields::new();
        fields.insert("number".into(), FieldValue::Integer(1));
        let op = PendingOperation::Upsert {
            key: key("1"),
            fields: fields.clone(),
            check: VersionCheck::Unchecked,
        };
        assert_eq!(op.visible_fields(), Some(&fields));
    }

    #[test]
    fn session_allows_one_transaction() {
        let mut session = Session::new();
        assert!(!session.is_active());

        session.begin().unwrap();
        assert!(session.is_active());
        assert_eq!(session.begin(), Err(CoreError::TransactionAlreadyActive));

        assert!(session.take().is_some());
        assert!(!session.is_active());
        assert_eq!(session.pending_len(), 0);
    }
}
