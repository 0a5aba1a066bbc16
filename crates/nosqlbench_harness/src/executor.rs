//! Bounded worker pool for scenario tasks.

use crate::cancel::CancelToken;
use crate::config::ExecutorConfig;
use crate::error::{HarnessError, HarnessResult};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

type Task<T> = Box<dyn FnOnce(&CancelToken) -> HarnessResult<Vec<T>> + Send + 'static>;
type Queue<T> = Arc<Mutex<VecDeque<(usize, Task<T>)>>>;
type Outcomes<T> = Arc<Mutex<Vec<(usize, HarnessResult<Vec<T>>)>>>;

/// Lifecycle of a [`ScenarioExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Created, no task added.
    New,
    /// At least one task added.
    Accepting,
    /// `start` is running the tasks.
    Running,
    /// Every task finished or the run was cancelled.
    Completed,
    /// Results were collected.
    Drained,
}

impl ExecutorState {
    /// Returns true if tasks can still be added.
    pub fn can_add(&self) -> bool {
        matches!(self, ExecutorState::New | ExecutorState::Accepting)
    }
}

/// Runs a fixed set of tasks on a bounded pool of worker threads and
/// merges their results into a set.
///
/// The executor is single-use: add tasks, call [`start`](Self::start)
/// once, then collect with [`get_results`](Self::get_results) once.
/// Results from different tasks that compare equal collapse into one
/// entry, so tasks that must be counted should return distinct values.
pub struct ScenarioExecutor<T> {
    config: ExecutorConfig,
    state: ExecutorState,
    tasks: Vec<Task<T>>,
    submitted: usize,
    outcomes: Vec<(usize, HarnessResult<Vec<T>>)>,
    cancel: CancelToken,
    elapsed: Option<Duration>,
}

impl<T> ScenarioExecutor<T>
where
    T: Eq + Hash + Send + 'static,
{
    /// Creates an executor running at most `max_threads` tasks at once.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `max_threads` is 0 or above the ceiling.
    pub fn new(max_threads: usize) -> HarnessResult<Self> {
        Self::with_config(ExecutorConfig::new(max_threads))
    }

    /// Creates an executor from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration is invalid.
    pub fn with_config(config: ExecutorConfig) -> HarnessResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: ExecutorState::New,
            tasks: Vec::new(),
            submitted: 0,
            outcomes: Vec::new(),
            cancel: CancelToken::new(),
            elapsed: None,
        })
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Returns the number of tasks added.
    pub fn task_count(&self) -> usize {
        self.submitted
    }

    /// Returns how long `start` took, once it has returned.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Returns a handle that cancels this run from any thread.
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Requests cancellation of queued and running tasks.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Queues a task.
    ///
    /// # Errors
    ///
    /// Returns `Usage` once `start` has been called.
    pub fn add_task<F>(&mut self, task: F) -> HarnessResult<()>
    where
        F: FnOnce(&CancelToken) -> HarnessResult<Vec<T>> + Send + 'static,
    {
        if !self.state.can_add() {
            return Err(HarnessError::usage(format!(
                "add_task called in state {:?}",
                self.state
            )));
        }
        self.tasks.push(Box::new(task));
        self.submitted += 1;
        self.state = ExecutorState::Accepting;
        Ok(())
    }

    /// Runs every queued task and blocks until all have finished or the
    /// run is cancelled.
    ///
    /// Task failures do not fail `start`; they surface from
    /// [`get_results`](Self::get_results).
    ///
    /// # Errors
    ///
    /// Returns `Usage` if called twice, or `Io` if a worker thread could
    /// not be spawned (the run is cancelled in that case).
    pub fn start(&mut self) -> HarnessResult<()> {
        if !self.state.can_add() {
            return Err(HarnessError::usage(format!(
                "start called in state {:?}",
                self.state
            )));
        }
        self.state = ExecutorState::Running;

        let task_count = self.tasks.len();
        let workers = self.config.max_threads.min(task_count);
        let queue: Queue<T> = Arc::new(Mutex::new(
            self.tasks.drain(..).enumerate().collect::<VecDeque<_>>(),
        ));
        let outcomes: Outcomes<T> = Arc::new(Mutex::new(Vec::with_capacity(task_count)));

        let start = Instant::now();
        let mut handles = Vec::with_capacity(workers);
        let mut spawn_error = None;
        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let outcomes = Arc::clone(&outcomes);
            let cancel = self.cancel.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{worker}", self.config.thread_name))
                .spawn(move || run_worker(worker, &queue, &outcomes, &cancel));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    warn!("Failed to spawn worker {}: {}", worker, err);
                    self.cancel.cancel();
                    spawn_error = Some(err);
                    break;
                }
            }
        }

        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread terminated abnormally");
            }
        }

        let elapsed = start.elapsed();
        self.elapsed = Some(elapsed);
        self.outcomes = std::mem::take(&mut *outcomes.lock());
        self.state = ExecutorState::Completed;

        if self.cancel.is_cancelled() {
            warn!(
                completed = self.outcomes.len(),
                tasks = task_count,
                "scenario cancelled"
            );
        } else {
            info!(tasks = task_count, workers, ?elapsed, "scenario completed");
        }

        match spawn_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Merges every task's results into one set.
    ///
    /// # Errors
    ///
    /// - `Usage` if called before `start` or a second time
    /// - `Cancelled` if the run was cancelled
    /// - `TaskFailed` wrapping the first failing task's error
    pub fn get_results(&mut self) -> HarnessResult<HashSet<T>> {
        match self.state {
            ExecutorState::Completed => {}
            ExecutorState::Drained => {
                return Err(HarnessError::usage("results were already collected"));
            }
            state => {
                return Err(HarnessError::usage(format!(
                    "results requested in state {state:?}"
                )));
            }
        }
        self.state = ExecutorState::Drained;

        if self.cancel.is_cancelled() {
            self.outcomes.clear();
            return Err(HarnessError::Cancelled);
        }

        let mut outcomes = std::mem::take(&mut self.outcomes);
        outcomes.sort_by_key(|(index, _)| *index);

        let mut results = HashSet::new();
        let mut first_error = None;
        let mut failed = 0;
        for (_, outcome) in outcomes {
            match outcome {
                Ok(values) => results.extend(values),
                Err(err) => {
                    failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(source) => Err(HarnessError::TaskFailed {
                failed,
                source: Box::new(source),
            }),
            None => Ok(results),
        }
    }
}

fn run_worker<T>(worker: usize, queue: &Queue<T>, outcomes: &Outcomes<T>, cancel: &CancelToken) {
    debug!(worker, "worker started");
    let mut ran = 0usize;
    loop {
        if cancel.is_cancelled() {
            break;
        }
        // Take the next task without holding the lock while it runs.
        let Some((index, task)) = queue.lock().pop_front() else {
            break;
        };

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task(cancel))) {
            Ok(result) => result,
            Err(payload) => Err(HarnessError::TaskPanicked {
                task: index,
                message: panic_message(payload.as_ref()),
            }),
        };
        if let Err(err) = &outcome {
            warn!("Task {} failed: {}", index, err);
        }
        outcomes.lock().push((index, outcome));
        ran += 1;
    }
    debug!(worker, tasks = ran, "worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosqlbench_core::CoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn construction_is_bounded() {
        assert!(ScenarioExecutor::<u32>::new(0).is_err());
        assert!(ScenarioExecutor::<u32>::new(51).is_err());
        assert!(ScenarioExecutor::<u32>::new(50).is_ok());
    }

    #[test]
    fn lifecycle() {
        let mut executor = ScenarioExecutor::<u32>::new(2).unwrap();
        assert_eq!(executor.state(), ExecutorState::New);

        executor.add_task(|_| Ok(vec![1])).unwrap();
        assert_eq!(executor.state(), ExecutorState::Accepting);

        executor.start().unwrap();
        assert_eq!(executor.state(), ExecutorState::Completed);
        assert!(executor.elapsed().is_some());

        executor.get_results().unwrap();
        assert_eq!(executor.state(), ExecutorState::Drained);
        assert_eq!(executor.task_count(), 1);
    }

    #[test]
    fn add_after_start_is_usage_error() {
        let mut executor = ScenarioExecutor::<u32>::new(1).unwrap();
        executor.start().unwrap();
        let err = executor.add_task(|_| Ok(vec![])).unwrap_err();
        assert!(matches!(err, HarnessError::Usage { .. }));
        assert!(matches!(executor.start(), Err(HarnessError::Usage { .. })));
    }

    #[test]
    fn results_before_start_or_twice() {
        let mut executor = ScenarioExecutor::<u32>::new(1).unwrap();
        assert!(matches!(
            executor.get_results(),
            Err(HarnessError::Usage { .. })
        ));

        executor.start().unwrap();
        assert!(executor.get_results().unwrap().is_empty());
        assert!(matches!(
            executor.get_results(),
            Err(HarnessError::Usage { .. })
        ));
    }

    #[test]
    fn duplicate_results_collapse() {
        let mut executor = ScenarioExecutor::new(4).unwrap();
        for _ in 0..4 {
            executor.add_task(|_| Ok(vec![1, 2])).unwrap();
        }
        executor.start().unwrap();
        assert_eq!(executor.get_results().unwrap(), HashSet::from([1, 2]));
    }

    #[test]
    fn concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut executor = ScenarioExecutor::new(3).unwrap();

        for i in 0..12 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            executor
                .add_task(move |_| {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(vec![i])
                })
                .unwrap();
        }
        executor.start().unwrap();

        assert_eq!(executor.get_results().unwrap().len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn failure_is_aggregated() {
        let mut executor = ScenarioExecutor::new(2).unwrap();
        executor.add_task(|_| Ok(vec![1])).unwrap();
        executor
            .add_task(|_| Err(CoreError::NotInitialized.into()))
            .unwrap();
        executor.start().unwrap();

        match executor.get_results() {
            Err(HarnessError::TaskFailed { failed, source }) => {
                assert_eq!(failed, 1);
                assert!(matches!(
                    *source,
                    HarnessError::Store(CoreError::NotInitialized)
                ));
            }
            other => panic!("expected task failure, got {other:?}"),
        }
    }

    #[test]
    fn panic_is_captured() {
        let mut executor = ScenarioExecutor::<u32>::new(1).unwrap();
        executor.add_task(|_| panic!("boom")).unwrap();
        executor.add_task(|_| Ok(vec![7])).unwrap();
        executor.start().unwrap();

        match executor.get_results() {
            Err(HarnessError::TaskFailed { source, .. }) => match *source {
                HarnessError::TaskPanicked { task, message } => {
                    assert_eq!(task, 0);
                    assert_eq!(message, "boom");
                }
                other => panic!("expected panic, got {other:?}"),
            },
            other => panic!("expected task failure, got {other:?}"),
        }
    }

    #[test]
    fn cancel_stops_queued_tasks() {
        let ran = Arc::new(AtomicUsize::new(0));
        let mut executor = ScenarioExecutor::<usize>::new(1).unwrap();
        let handle = executor.cancel_handle();

        for i in 0..10 {
            let ran = Arc::clone(&ran);
            let handle = handle.clone();
            executor
                .add_task(move |_| {
                    ran.fetch_add(1, Ordering::SeqCst);
                    if i == 2 {
                        handle.cancel();
                    }
                    Ok(vec![i])
                })
                .unwrap();
        }
        executor.start().unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert!(matches!(executor.get_results(), Err(HarnessError::Cancelled)));
    }
}
