//! Workload configuration.
//!
//! Defaults mirror the benchmark's property defaults: one thread, 100
//! transaction repeats, counter starting at 1000.

use nosqlbench_harness::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};

/// Bulk insert settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertConfig {
    /// Entity kind to insert.
    pub kind: String,
    /// Total entities, split evenly across threads.
    pub count: usize,
    /// Worker threads.
    pub threads: usize,
    /// Remove the kind afterwards.
    pub cleanup: bool,
}

impl Default for InsertConfig {
    fn default() -> Self {
        Self {
            kind: "BenchTest".to_string(),
            count: 1_000,
            threads: 1,
            cleanup: false,
        }
    }
}

impl InsertConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total entity count.
    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Sets the worker thread count.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets whether the kind is removed afterwards.
    #[must_use]
    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Predicate query settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Entity kind to query.
    pub kind: String,
    /// Total queries, split evenly across threads.
    pub repeat: usize,
    /// Worker threads.
    pub threads: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            kind: "BenchTest".to_string(),
            repeat: 100,
            threads: 1,
        }
    }
}

impl QueryConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total query count.
    #[must_use]
    pub fn repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    /// Sets the worker thread count.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// How counter race tasks pick their delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaMode {
    /// Odd-numbered tasks add one, even-numbered tasks subtract one.
    #[default]
    Alternating,
    /// Every task adds one.
    Increment,
}

/// Counter race settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Entity kind of the counter.
    pub kind: String,
    /// Worker threads, one task each.
    pub threads: usize,
    /// Successful commits per task.
    pub repeat: usize,
    /// Starting counter value.
    pub initial_value: i64,
    /// Per-task delta.
    pub delta_mode: DeltaMode,
    /// Remove the kind afterwards.
    pub cleanup: bool,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            kind: "Counter".to_string(),
            threads: 1,
            repeat: 100,
            initial_value: 1000,
            delta_mode: DeltaMode::Alternating,
            cleanup: false,
        }
    }
}

impl CounterConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker thread count.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the commits per task.
    #[must_use]
    pub fn repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    /// Sets the starting value.
    #[must_use]
    pub fn initial_value(mut self, value: i64) -> Self {
        self.initial_value = value;
        self
    }

    /// Sets the delta mode.
    #[must_use]
    pub fn delta_mode(mut self, mode: DeltaMode) -> Self {
        self.delta_mode = mode;
        self
    }

    /// Returns the delta of the task with the given 1-based number.
    #[must_use]
    pub fn delta(&self, task: usize) -> i64 {
        match self.delta_mode {
            DeltaMode::Increment => 1,
            DeltaMode::Alternating if task % 2 == 1 => 1,
            DeltaMode::Alternating => -1,
        }
    }

    /// Returns the counter value after every task has finished, assuming
    /// no attempt fails.
    #[must_use]
    pub fn expected_value(&self) -> i64 {
        let per_task = self.repeat as i64;
        (1..=self.threads).fold(self.initial_value, |acc, task| {
            acc + self.delta(task) * per_task
        })
    }
}

/// Transfer race settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Entity kind of the accounts.
    pub kind: String,
    /// Worker threads, one task each.
    pub threads: usize,
    /// Accounts created at 0, and again at `ceiling`.
    pub entities: usize,
    /// Starting value of the full accounts; must be even.
    pub ceiling: i64,
    /// Remove the kind afterwards.
    pub cleanup: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            kind: "Transfer".to_string(),
            threads: 1,
            entities: 10,
            ceiling: 10,
            cleanup: false,
        }
    }
}

impl TransferConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker thread count.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the accounts per side.
    #[must_use]
    pub fn entities(mut self, entities: usize) -> Self {
        self.entities = entities;
        self
    }

    /// Sets the ceiling.
    #[must_use]
    pub fn ceiling(mut self, ceiling: i64) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Returns the value every account converges to.
    #[must_use]
    pub fn midpoint(&self) -> i64 {
        self.ceiling / 2
    }

    /// Checks the ceiling.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the ceiling is odd or not positive.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.ceiling <= 0 || self.ceiling % 2 != 0 {
            return Err(HarnessError::config(format!(
                "transfer ceiling must be a positive even integer, got {}",
                self.ceiling
            )));
        }
        Ok(())
    }
}
