//! # nosqlbench Harness
//!
//! Runs workload tasks across a bounded pool of worker threads.
//!
//! This crate provides:
//! - [`ScenarioExecutor`], a one-shot add/start/collect worker pool
//! - [`CancelToken`] for coarse cancellation of a whole run
//! - [`ScenarioReport`] for throughput and contention figures
//! - [`parse_count`] for workload sizes such as `10k` or `2M`
//!
//! ## Example
//!
//! ```rust
//! use nosqlbench_harness::ScenarioExecutor;
//!
//! let mut executor = ScenarioExecutor::new(4).unwrap();
//! for _ in 0..4 {
//!     executor.add_task(|_cancel| Ok(vec![1, 2])).unwrap();
//! }
//! executor.start().unwrap();
//!
//! let results = executor.get_results().unwrap();
//! assert_eq!(results.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod config;
mod error;
mod executor;
mod report;

pub use cancel::CancelToken;
pub use config::{parse_count, ExecutorConfig, MAX_WORKER_THREADS};
pub use error::{HarnessError, HarnessResult};
pub use executor::{ExecutorState, ScenarioExecutor};
pub use report::ScenarioReport;
