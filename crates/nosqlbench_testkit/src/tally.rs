//! Per-task counters and the shared task runner.

use nosqlbench_harness::{
    CancelToken, ExecutorConfig, HarnessResult, ScenarioExecutor, ScenarioReport,
};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// What one task did.
///
/// Carries the task number so tallies from different tasks never
/// compare equal and survive the executor's set merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TaskTally {
    /// 1-based task number.
    pub task: usize,
    /// Operations that succeeded.
    pub successes: usize,
    /// Version conflicts caught and retried.
    pub conflicts: usize,
    /// Operations that failed and were skipped.
    pub failures: usize,
}

impl TaskTally {
    /// Creates an empty tally for a task.
    pub fn new(task: usize) -> Self {
        Self {
            task,
            ..Self::default()
        }
    }

    /// Counts an operation that failed for a reason other than a
    /// version conflict. The task carries on with its next operation.
    pub fn record_failure(&mut self, err: impl fmt::Display) {
        warn!(task = self.task, "operation failed: {}", err);
        self.failures += 1;
    }
}

/// Runs `threads` tasks built by `make_task` and folds their tallies.
///
/// `make_task` receives the 1-based task number.
pub(crate) fn run_tasks<F, T>(
    name: &str,
    threads: usize,
    make_task: F,
) -> HarnessResult<ScenarioReport>
where
    F: FnMut(usize) -> T,
    T: FnOnce(&CancelToken) -> HarnessResult<TaskTally> + Send + 'static,
{
    run_tallies(name, threads, make_task).map(|(report, _)| report)
}

/// Like [`run_tasks`], also returning each task's tally.
pub(crate) fn run_tallies<F, T>(
    name: &str,
    threads: usize,
    mut make_task: F,
) -> HarnessResult<(ScenarioReport, HashSet<TaskTally>)>
where
    F: FnMut(usize) -> T,
    T: FnOnce(&CancelToken) -> HarnessResult<TaskTally> + Send + 'static,
{
    let config = ExecutorConfig::new(threads).thread_name(name);
    let mut executor = ScenarioExecutor::with_config(config)?;
    for task in 1..=threads {
        let body = make_task(task);
        executor.add_task(move |cancel| body(cancel).map(|tally| vec![tally]))?;
    }
    executor.start()?;
    let elapsed = executor.elapsed().unwrap_or(Duration::ZERO);
    let tallies = executor.get_results()?;

    let (successes, failures, conflicts) = tallies.iter().fold((0, 0, 0), |acc, t| {
        (acc.0 + t.successes, acc.1 + t.failures, acc.2 + t.conflicts)
    });
    let report = ScenarioReport::new(name, successes, failures, conflicts, elapsed);
    report.log_summary();
    Ok((report, tallies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosqlbench_core::CoreError;

    #[test]
    fn failures_reach_the_report() {
        let report = run_tasks("tally", 3, |task| {
            move |_: &CancelToken| -> HarnessResult<TaskTally> {
                let mut tally = TaskTally::new(task);
                tally.successes = 2;
                tally.record_failure(CoreError::NotInitialized);
                Ok(tally)
            }
        })
        .unwrap();

        assert_eq!(report.successes, 6);
        assert_eq!(report.failures, 3);
        assert_eq!(report.operations, 9);
    }
}
