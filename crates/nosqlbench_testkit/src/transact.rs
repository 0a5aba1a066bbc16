//! Optimistic-transaction workloads.
//!
//! Every task retries its whole transaction from a fresh start after a
//! version conflict. The counter race counts any other failed attempt
//! and moves on; the transfer race ends the task, since its next query
//! would pick the same accounts again.

use crate::config::{CounterConfig, TransferConfig};
use crate::fixtures::{add_to_number, number_fields, read_number, NUMBER_FIELD};
use crate::tally::{run_tallies, run_tasks, TaskTally};
use nosqlbench_core::{
    Database, FieldDefinition, FieldType, Fields, IndexType, QueryPredicate, QueryResults,
};
use nosqlbench_harness::{CancelToken, HarnessError, HarnessResult, ScenarioReport};
use std::sync::Arc;
use tracing::{debug, info};

/// Fields declared by the transactional workloads.
pub fn number_field() -> Vec<FieldDefinition> {
    vec![FieldDefinition::new(
        NUMBER_FIELD,
        FieldType::Long,
        IndexType::Range,
    )]
}

/// Whether an attempted transaction landed.
enum Attempt {
    Committed,
    Conflicted,
}

/// Commits the session's transaction, turning a version conflict into
/// [`Attempt::Conflicted`].
fn try_commit<D: Database>(db: &D, session: &mut D::Session) -> HarnessResult<Attempt> {
    match db.commit_transaction(session) {
        Ok(()) => Ok(Attempt::Committed),
        Err(err) if err.is_conflict() => {
            debug!("Collision: {}", err);
            Ok(Attempt::Conflicted)
        }
        Err(err) => Err(err.into()),
    }
}

/// Result of a counter race.
#[derive(Debug, Clone)]
pub struct CounterOutcome {
    /// Key of the shared counter.
    pub key: String,
    /// Counter value after every task finished.
    pub final_value: i64,
    /// Value implied by the deltas of the committed attempts.
    pub expected_value: i64,
    /// Timing and contention.
    pub report: ScenarioReport,
}

/// Races `threads` tasks on one counter entity.
///
/// Each task loops "start, get, add delta, put, commit" until `repeat`
/// attempts have either committed or failed for a reason other than a
/// version conflict. Conflicted attempts are retried. The store must
/// already be initialized.
///
/// # Errors
///
/// Returns the first task failure, or `Workload` if the counter vanishes.
pub fn counter_race<D>(db: Arc<D>, config: &CounterConfig) -> HarnessResult<CounterOutcome>
where
    D: Database + 'static,
{
    db.register(&config.kind, &number_field())?;
    let mut session = db.session();
    let key = db.insert(&mut session, &config.kind, number_fields(config.initial_value))?;
    info!(
        "Starting counter race: key={} threads={} repeat={}",
        key, config.threads, config.repeat
    );

    let (report, tallies) = run_tallies("counter_race", config.threads, |task| {
        let db = Arc::clone(&db);
        let kind = config.kind.clone();
        let key = key.clone();
        let delta = config.delta(task);
        let repeat = config.repeat;
        move |cancel: &CancelToken| {
            counter_task(db.as_ref(), &kind, &key, task, delta, repeat, cancel)
        }
    })?;

    let fields = db
        .get(&mut session, &key)?
        .ok_or_else(|| HarnessError::workload(format!("counter {key} not found")))?;
    let final_value = read_number(&fields)?;
    info!("Result: number={}", final_value);

    if config.cleanup {
        db.cleanup(&config.kind)?;
    }
    db.finish(&mut session)?;

    let expected_value = tallies.iter().fold(config.initial_value, |acc, tally| {
        acc + config.delta(tally.task) * tally.successes as i64
    });

    Ok(CounterOutcome {
        key,
        final_value,
        expected_value,
        report,
    })
}

fn counter_task<D: Database>(
    db: &D,
    kind: &str,
    key: &str,
    task: usize,
    delta: i64,
    repeat: usize,
    cancel: &CancelToken,
) -> HarnessResult<TaskTally> {
    let mut session = db.session();
    let mut tally = TaskTally::new(task);
    while tally.successes + tally.failures < repeat && !cancel.is_cancelled() {
        db.start_transaction(&mut session)?;
        if let Err(err) = add_to_counter(db, &mut session, kind, key, delta) {
            db.rollback_transaction(&mut session)?;
            tally.record_failure(err);
            continue;
        }

        // A failed commit has already discarded the transaction.
        match try_commit(db, &mut session) {
            Ok(Attempt::Committed) => tally.successes += 1,
            Ok(Attempt::Conflicted) => tally.conflicts += 1,
            Err(err) => tally.record_failure(err),
        }
    }
    db.finish(&mut session)?;
    Ok(tally)
}

fn add_to_counter<D: Database>(
    db: &D,
    session: &mut D::Session,
    kind: &str,
    key: &str,
    delta: i64,
) -> HarnessResult<()> {
    let mut fields = db
        .get(session, key)?
        .ok_or_else(|| HarnessError::workload(format!("counter {key} not found")))?;
    add_to_number(&mut fields, delta)?;
    db.put(session, kind, key, fields)?;
    Ok(())
}

/// Moves `amount` from one entity's `number` to another's in one
/// transaction.
///
/// Either both updates land or neither does.
///
/// # Errors
///
/// Returns `Store` with a version conflict if a concurrent commit touched
/// either entity, or `Workload` if one of them does not exist.
pub fn transfer<D: Database>(
    db: &D,
    session: &mut D::Session,
    kind: &str,
    from: &str,
    to: &str,
    amount: i64,
) -> HarnessResult<()> {
    db.start_transaction(session)?;
    let result = transfer_in_transaction(db, session, kind, from, to, amount);
    match result {
        Ok(()) => Ok(db.commit_transaction(session)?),
        Err(err) => {
            db.rollback_transaction(session)?;
            Err(err)
        }
    }
}

fn transfer_in_transaction<D: Database>(
    db: &D,
    session: &mut D::Session,
    kind: &str,
    from: &str,
    to: &str,
    amount: i64,
) -> HarnessResult<()> {
    let missing = |key: &str| HarnessError::workload(format!("account {key} not found"));
    let mut source = db.get(session, from)?.ok_or_else(|| missing(from))?;
    let mut target = db.get(session, to)?.ok_or_else(|| missing(to))?;
    add_to_number(&mut source, -amount)?;
    add_to_number(&mut target, amount)?;
    db.put(session, kind, from, source)?;
    db.put(session, kind, to, target)?;
    Ok(())
}

/// Result of [`transfer_pair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    /// Key and final value of the account that started at 0.
    pub a: (String, i64),
    /// Key and final value of the account that started at 10.
    pub b: (String, i64),
}

/// Creates accounts A = 0 and B = 10 and moves one unit from B to A.
///
/// # Errors
///
/// Returns the transfer's error.
pub fn transfer_pair<D: Database>(db: &D, kind: &str) -> HarnessResult<PairOutcome> {
    db.register(kind, &number_field())?;
    let mut session = db.session();
    let a = db.insert(&mut session, kind, number_fields(0))?;
    let b = db.insert(&mut session, kind, number_fields(10))?;

    transfer(db, &mut session, kind, &b, &a, 1)?;

    let value = |session: &mut D::Session, key: &str| -> HarnessResult<i64> {
        let fields = db
            .get(session, key)?
            .ok_or_else(|| HarnessError::workload(format!("account {key} not found")))?;
        read_number(&fields)
    };
    let a_value = value(&mut session, &a)?;
    let b_value = value(&mut session, &b)?;
    db.finish(&mut session)?;

    Ok(PairOutcome {
        a: (a, a_value),
        b: (b, b_value),
    })
}

/// Result of a transfer race.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Sum of all accounts before the race.
    pub initial_total: i64,
    /// Sum of all accounts after the race.
    pub final_total: i64,
    /// Accounts holding exactly the midpoint.
    pub settled: usize,
    /// Accounts holding anything else.
    pub unsettled: usize,
    /// Timing and contention.
    pub report: ScenarioReport,
}

/// Races `threads` tasks moving units from full to empty accounts.
///
/// Creates `entities` accounts at 0 and `entities` at `ceiling`. Each
/// task repeatedly finds one account below the midpoint and one above
/// it, moves one unit between them in a transaction, and stops once no
/// such pair remains. The store must already be initialized.
///
/// # Errors
///
/// Returns `Config` for an odd ceiling, or the first task failure.
pub fn transfer_race<D>(db: Arc<D>, config: &TransferConfig) -> HarnessResult<TransferOutcome>
where
    D: Database + 'static,
{
    config.validate()?;
    db.register(&config.kind, &number_field())?;

    let mut session = db.session();
    for value in [0, config.ceiling] {
        for _ in 0..config.entities {
            db.insert(&mut session, &config.kind, number_fields(value))?;
        }
    }
    let initial_total = config.ceiling * config.entities as i64;
    info!(
        "Starting transfer race: entities={} ceiling={} threads={}",
        config.entities * 2,
        config.ceiling,
        config.threads
    );

    let report = run_tasks("transfer_race", config.threads, |task| {
        let db = Arc::clone(&db);
        let kind = config.kind.clone();
        let midpoint = config.midpoint();
        move |cancel: &CancelToken| transfer_task(db.as_ref(), &kind, task, midpoint, cancel)
    })?;

    let accounts = db.query_simple(&mut session, &config.kind, &[], 0, 0)?;
    let mut final_total = 0;
    let mut settled = 0;
    for fields in accounts.values() {
        let value = read_number(fields)?;
        final_total += value;
        if value == config.midpoint() {
            settled += 1;
        }
    }
    let unsettled = accounts.len() - settled;
    info!(
        "Result: total={} settled={} unsettled={}",
        final_total, settled, unsettled
    );

    if config.cleanup {
        db.cleanup(&config.kind)?;
    }
    db.finish(&mut session)?;

    Ok(TransferOutcome {
        initial_total,
        final_total,
        settled,
        unsettled,
        report,
    })
}

fn transfer_task<D: Database>(
    db: &D,
    kind: &str,
    task: usize,
    midpoint: i64,
    cancel: &CancelToken,
) -> HarnessResult<TaskTally> {
    let lesser = [QueryPredicate::lesser(NUMBER_FIELD, midpoint)];
    let greater = [QueryPredicate::greater(NUMBER_FIELD, midpoint)];
    let mut session = db.session();
    let mut tally = TaskTally::new(task);

    while !cancel.is_cancelled() {
        db.start_transaction(&mut session)?;
        let low = first(db.query_simple(&mut session, kind, &lesser, 0, 1)?);
        let high = first(db.query_simple(&mut session, kind, &greater, 0, 1)?);

        let (Some((low_key, mut low_fields)), Some((high_key, mut high_fields))) = (low, high)
        else {
            db.rollback_transaction(&mut session)?;
            break;
        };
        add_to_number(&mut low_fields, 1)?;
        add_to_number(&mut high_fields, -1)?;
        db.put(&mut session, kind, &low_key, low_fields)?;
        db.put(&mut session, kind, &high_key, high_fields)?;

        match try_commit(db, &mut session)? {
            Attempt::Committed => tally.successes += 1,
            Attempt::Conflicted => tally.conflicts += 1,
        }
    }
    db.finish(&mut session)?;
    debug!(task, transfers = tally.successes, "transfer task done");
    Ok(tally)
}

fn first(results: QueryResults) -> Option<(String, Fields)> {
    results.into_iter().next()
}
