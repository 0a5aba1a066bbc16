//! Executor configuration and size parsing.

use crate::error::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};

/// Hard ceiling on worker threads per executor.
pub const MAX_WORKER_THREADS: usize = 50;

/// Configuration for a [`crate::ScenarioExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum number of concurrently running tasks.
    pub max_threads: usize,
    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_threads: 1,
            thread_name: "scenario-worker".to_string(),
        }
    }
}

impl ExecutorConfig {
    /// Creates a configuration with the given worker bound.
    #[must_use]
    pub fn new(max_threads: usize) -> Self {
        Self {
            max_threads,
            ..Self::default()
        }
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Checks the worker bound.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `max_threads` is 0 or above [`MAX_WORKER_THREADS`].
    pub fn validate(&self) -> HarnessResult<()> {
        if self.max_threads == 0 {
            return Err(HarnessError::config("max_threads must be at least 1"));
        }
        if self.max_threads > MAX_WORKER_THREADS {
            return Err(HarnessError::config(format!(
                "max_threads {} exceeds the limit of {MAX_WORKER_THREADS}",
                self.max_threads
            )));
        }
        Ok(())
    }
}

/// Parses a workload size with an optional `k` (thousand) or `M`
/// (million) suffix.
///
/// ```rust
/// use nosqlbench_harness::parse_count;
///
/// assert_eq!(parse_count("250").unwrap(), 250);
/// assert_eq!(parse_count("10k").unwrap(), 10_000);
/// assert_eq!(parse_count("2M").unwrap(), 2_000_000);
/// ```
///
/// # Errors
///
/// Returns `Config` if the number is malformed or the result overflows.
pub fn parse_count(value: &str) -> HarnessResult<usize> {
    let value = value.trim();
    let (digits, multiplier) = if let Some(rest) = value.strip_suffix('k') {
        (rest, 1_000)
    } else if let Some(rest) = value.strip_suffix('M') {
        (rest, 1_000_000)
    } else {
        (value, 1)
    };

    let base: usize = digits
        .parse()
        .map_err(|e| HarnessError::config(format!("invalid count {value:?}: {e}")))?;
    base.checked_mul(multiplier)
        .ok_or_else(|| HarnessError::config(format!("count {value:?} overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(ExecutorConfig::new(1).validate().is_ok());
        assert!(ExecutorConfig::new(MAX_WORKER_THREADS).validate().is_ok());
        assert!(matches!(
            ExecutorConfig::new(0).validate(),
            Err(HarnessError::Config { .. })
        ));
        assert!(matches!(
            ExecutorConfig::new(MAX_WORKER_THREADS + 1).validate(),
            Err(HarnessError::Config { .. })
        ));
    }

    #[test]
    fn builder_pattern() {
        let config = ExecutorConfig::new(8).thread_name("counter");
        assert_eq!(config.max_threads, 8);
        assert_eq!(config.thread_name, "counter");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ExecutorConfig = serde_json::from_str(r#"{"max_threads":12}"#).unwrap();
        assert_eq!(config.max_threads, 12);
        assert_eq!(config.thread_name, "scenario-worker");
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count("0").unwrap(), 0);
        assert_eq!(parse_count(" 3k ").unwrap(), 3_000);
        assert_eq!(parse_count("1M").unwrap(), 1_000_000);
    }

    #[test]
    fn malformed_counts() {
        assert!(parse_count("").is_err());
        assert!(parse_count("k").is_err());
        assert!(parse_count("10K").is_err());
        assert!(parse_count("-5").is_err());
        assert!(parse_count("1.5M").is_err());
        assert!(parse_count(&format!("{}M", usize::MAX)).is_err());
    }
}
