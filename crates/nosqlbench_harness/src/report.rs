//! Scenario results.

use std::fmt;
use std::time::Duration;
use tracing::info;

/// Throughput and contention figures of one scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Operations attempted (successes + failures).
    pub operations: usize,
    /// Operations that succeeded.
    pub successes: usize,
    /// Version conflicts caught and retried.
    pub conflicts: usize,
    /// Operations that failed permanently.
    pub failures: usize,
    /// Wall-clock duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl ScenarioReport {
    /// Creates a report; throughput is derived from the duration.
    pub fn new(
        name: impl Into<String>,
        successes: usize,
        failures: usize,
        conflicts: usize,
        duration: Duration,
    ) -> Self {
        let operations = successes + failures;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            operations as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            name: name.into(),
            operations,
            successes,
            conflicts,
            failures,
            duration,
            ops_per_second,
        }
    }

    /// Logs the report at info level.
    pub fn log_summary(&self) {
        info!("{self}");
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ops ({} ok, {} failed, {} conflicts) in {:?}, {:.2} ops/sec",
            self.name,
            self.operations,
            self.successes,
            self.failures,
            self.conflicts,
            self.duration,
            self.ops_per_second
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput() {
        let report = ScenarioReport::new("insert", 900, 100, 7, Duration::from_secs(2));
        assert_eq!(report.operations, 1000);
        assert!((report.ops_per_second - 500.0).abs() < f64::EPSILON);
        assert!(report.to_string().contains("7 conflicts"));
    }

    #[test]
    fn zero_duration() {
        let report = ScenarioReport::new("empty", 0, 0, 0, Duration::ZERO);
        assert_eq!(report.ops_per_second, 0.0);
    }
}
