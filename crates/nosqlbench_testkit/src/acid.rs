//! Isolation and atomicity checks between overlapping transactions.

use crate::fixtures::{add_to_number, number_fields, read_number};
use crate::transact::number_field;
use nosqlbench_core::{CoreResult, Database, QueryPredicate};
use nosqlbench_harness::{HarnessError, HarnessResult};
use tracing::info;

/// Result of [`overlapping_transactions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapOutcome {
    /// Entities visible after the setup transaction committed.
    pub inserted_visible: usize,
    /// Whether the first committer succeeded.
    pub first_committed: bool,
    /// Whether the second committer got a version conflict.
    pub second_conflicted: bool,
    /// Value of the contested entity afterwards.
    pub final_value: i64,
    /// The value the first committer wrote.
    pub first_value: i64,
}

impl OverlapOutcome {
    /// Returns true if the store behaved as an optimistic store must.
    pub fn is_isolated(&self) -> bool {
        self.inserted_visible == 2
            && self.first_committed
            && self.second_conflicted
            && self.final_value == self.first_value
    }
}

/// Checks that two overlapping read-modify-write transactions on the same
/// entity produce exactly one winner.
///
/// Inserts `{number: 10}` and `{number: 1}` in one transaction and
/// queries them back. Then sessions A and B both read the first entity;
/// A adds 1, B adds 2; A commits first and B must conflict. `kind`
/// should hold no entities beforehand.
///
/// # Errors
///
/// Returns the first store error that is not the expected conflict.
pub fn overlapping_transactions<D: Database>(
    db: &D,
    kind: &str,
) -> HarnessResult<OverlapOutcome> {
    db.register(kind, &number_field())?;

    let mut a = db.session();
    let mut b = db.session();

    db.start_transaction(&mut a)?;
    let key = db.insert(&mut a, kind, number_fields(10))?;
    db.insert(&mut a, kind, number_fields(1))?;
    db.commit_transaction(&mut a)?;

    let visible = db.query_simple(
        &mut a,
        kind,
        &[QueryPredicate::lesser_equals("number", 10)],
        0,
        0,
    )?;

    db.start_transaction(&mut a)?;
    db.start_transaction(&mut b)?;
    let missing = || HarnessError::workload(format!("entity {key} not found"));
    let mut seen_a = db.get(&mut a, &key)?.ok_or_else(missing)?;
    let mut seen_b = db.get(&mut b, &key)?.ok_or_else(missing)?;
    let first_value = add_to_number(&mut seen_a, 1)?;
    add_to_number(&mut seen_b, 2)?;
    db.put(&mut a, kind, &key, seen_a)?;
    db.put(&mut b, kind, &key, seen_b)?;

    let first_committed = committed(db.commit_transaction(&mut a))?;
    let second_conflicted = !committed(db.commit_transaction(&mut b))?;

    let final_fields = db.get(&mut a, &key)?.ok_or_else(missing)?;
    let final_value = read_number(&final_fields)?;
    db.finish(&mut a)?;
    db.finish(&mut b)?;

    let outcome = OverlapOutcome {
        inserted_visible: visible.len(),
        first_committed,
        second_conflicted,
        final_value,
        first_value,
    };
    info!(?outcome, "overlapping transactions checked");
    Ok(outcome)
}

/// Maps a commit result to whether it landed. A version conflict is an
/// expected outcome; any other error is returned.
fn committed(result: CoreResult<()>) -> HarnessResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(err) if err.is_conflict() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosqlbench_core::CoreError;

    #[test]
    fn commit_errors_other_than_conflict_propagate() {
        assert!(committed(Ok(())).unwrap());
        assert!(!committed(Err(CoreError::version_conflict("Test:1", 1, 2))).unwrap());
        assert!(matches!(
            committed(Err(CoreError::NotInitialized)),
            Err(HarnessError::Store(CoreError::NotInitialized))
        ));
    }
}
