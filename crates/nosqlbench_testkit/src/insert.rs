//! Bulk insert and predicate query workloads.

use crate::config::{InsertConfig, QueryConfig};
use crate::data::{random_fields, random_word};
use crate::tally::{run_tasks, TaskTally};
use nosqlbench_core::{Database, FieldDefinition, FieldType, IndexType, QueryPredicate};
use nosqlbench_harness::{CancelToken, HarnessResult, ScenarioReport};
use std::sync::Arc;
use tracing::info;

/// Fields declared by the insert and query workloads.
pub fn bench_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("number", FieldType::Long, IndexType::Range),
        FieldDefinition::new("text", FieldType::String, IndexType::Range),
    ]
}

/// Inserts `count` random `{number, text}` entities from `threads` tasks.
///
/// Each task inserts `count / threads` entities outside any transaction.
/// A failed insert is counted in the report and the task moves on. The
/// store must already be initialized.
///
/// # Errors
///
/// Returns the first task failure, or `Config` for a bad thread count.
pub fn bulk_insert<D>(db: Arc<D>, config: &InsertConfig) -> HarnessResult<ScenarioReport>
where
    D: Database + 'static,
{
    db.register(&config.kind, &bench_fields())?;
    let per_task = config.count / config.threads.max(1);
    info!(
        "Starting inserts: count={} threads={}",
        config.count, config.threads
    );

    let report = run_tasks("bulk_insert", config.threads, |task| {
        let db = Arc::clone(&db);
        let kind = config.kind.clone();
        move |cancel: &CancelToken| insert_task(db.as_ref(), &kind, task, per_task, cancel)
    })?;

    if config.cleanup {
        db.cleanup(&config.kind)?;
    }
    Ok(report)
}

fn insert_task<D: Database>(
    db: &D,
    kind: &str,
    task: usize,
    count: usize,
    cancel: &CancelToken,
) -> HarnessResult<TaskTally> {
    let mut rng = rand::thread_rng();
    let mut session = db.session();
    let mut tally = TaskTally::new(task);
    for _ in 0..count {
        if cancel.is_cancelled() {
            break;
        }
        match db.insert(&mut session, kind, random_fields(&mut rng)) {
            Ok(_) => tally.successes += 1,
            Err(err) => tally.record_failure(err),
        }
    }
    db.finish(&mut session)?;
    Ok(tally)
}

/// Runs `repeat` EQUALS queries on a random `text` value from
/// `threads` tasks.
///
/// Every query counts as a success regardless of how many entities
/// matched; a query that returns an error counts as a failure.
///
/// # Errors
///
/// Returns the first task failure, or `Config` for a bad thread count.
pub fn query_load<D>(db: Arc<D>, config: &QueryConfig) -> HarnessResult<ScenarioReport>
where
    D: Database + 'static,
{
    db.register(&config.kind, &bench_fields())?;
    let per_task = config.repeat / config.threads.max(1);
    info!(
        "Starting queries: repeat={} threads={}",
        config.repeat, config.threads
    );

    run_tasks("query_load", config.threads, |task| {
        let db = Arc::clone(&db);
        let kind = config.kind.clone();
        move |cancel: &CancelToken| query_task(db.as_ref(), &kind, task, per_task, cancel)
    })
}

fn query_task<D: Database>(
    db: &D,
    kind: &str,
    task: usize,
    count: usize,
    cancel: &CancelToken,
) -> HarnessResult<TaskTally> {
    let mut rng = rand::thread_rng();
    let mut session = db.session();
    let mut tally = TaskTally::new(task);
    for _ in 0..count {
        if cancel.is_cancelled() {
            break;
        }
        let predicate = [QueryPredicate::equals("text", random_word(&mut rng))];
        match db.query_simple(&mut session, kind, &predicate, 0, 0) {
            Ok(_) => tally.successes += 1,
            Err(err) => tally.record_failure(err),
        }
    }
    db.finish(&mut session)?;
    Ok(tally)
}
