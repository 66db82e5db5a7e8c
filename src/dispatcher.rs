//! Dispatcher module
//!
//! Submits batches to the capture API under a bounded concurrency limit,
//! collecting per-batch outcomes into an aggregate [`DispatchReport`].
//!
//! Batches are independent: a failed batch is recorded and the run
//! continues. The one exception is an authentication rejection, which sets a
//! halt flag so no further batches are submitted; in-flight submissions are
//! allowed to complete. Completion order is unordered and does not affect
//! the report.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

use crate::batch::Batch;
use crate::client::Submitter;
use crate::error::LoaderError;

/// Details of one failed batch, kept for the final report so the operator
/// can remediate manually.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// 1-based batch number.
    pub number: usize,
    /// Number of items the batch carried.
    pub items: usize,
    /// Error detail from the final attempt.
    pub error: String,
}

/// Aggregate outcome of dispatching one set of batches.
#[derive(Debug)]
pub struct DispatchReport {
    /// What was dispatched ("nodes" or "relationships"), for messages.
    pub label: String,
    /// Total number of batches in the input.
    pub total: usize,
    /// Batches actually submitted (skipped batches after a halt are not).
    pub submitted: usize,
    /// Batches that succeeded.
    pub succeeded: usize,
    /// Batches that failed (including the batch that triggered a halt).
    pub failed: usize,
    /// Per-batch failure details, in completion order.
    pub failures: Vec<BatchFailure>,
    /// Fatal error that halted the run, if any. Reported distinctly from
    /// per-batch failures.
    pub fatal: Option<String>,
}

impl DispatchReport {
    /// True when every batch was submitted and succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.fatal.is_none() && self.failed == 0 && self.submitted == self.total
    }

    /// Prints the human-readable summary for this dispatch pass.
    pub fn print_summary(&self) {
        println!(
            "\n{}: {} batches submitted, {} succeeded, {} failed (of {} total)",
            self.label, self.submitted, self.succeeded, self.failed, self.total
        );
        for failure in &self.failures {
            println!(
                "  ✗ Batch {} ({} {}): {}",
                failure.number, failure.items, self.label, failure.error
            );
        }
        if let Some(fatal) = &self.fatal {
            eprintln!("  Fatal: {} — remaining batches were not submitted", fatal);
        }
    }
}

/// Shared mutable state across dispatch workers.
///
/// Counters are atomic and the failure list is mutex-guarded; nothing else
/// is shared between batch submissions.
#[derive(Default)]
struct DispatchState {
    submitted: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    halted: AtomicBool,
    failures: Mutex<Vec<BatchFailure>>,
    fatal: Mutex<Option<String>>,
}

/// Dispatches batches to a [`Submitter`] with bounded concurrency.
///
/// The worker limit is enforced with a semaphore: a permit is acquired
/// before each batch task is spawned and released when its submission
/// finishes, so at most `max_threads` requests are in flight at once.
#[derive(Debug)]
pub struct Dispatcher {
    max_threads: usize,
}

impl Dispatcher {
    /// Creates a dispatcher with the given worker limit.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Config`] if `max_threads` is zero.
    pub fn new(max_threads: usize) -> Result<Self, LoaderError> {
        if max_threads == 0 {
            return Err(LoaderError::Config(
                "max threads must be a positive integer".to_string(),
            ));
        }
        Ok(Self { max_threads })
    }

    /// Submits all batches and returns the aggregate report.
    ///
    /// Batches are handed to workers in input order; completions may arrive
    /// in any order. After an authentication failure, batches that have not
    /// yet been submitted are skipped and the fatal error is recorded on the
    /// report.
    pub async fn run<T>(
        &self,
        submitter: Arc<dyn Submitter<T>>,
        batches: Vec<Batch<T>>,
        label: &str,
    ) -> DispatchReport
    where
        T: Send + Sync + 'static,
    {
        let total = batches.len();
        let state = Arc::new(DispatchState::default());
        let semaphore = Arc::new(Semaphore::new(self.max_threads));
        let mut tasks = JoinSet::new();

        for batch in batches {
            // Acquire before spawning so submission order respects the
            // worker bound and the halt flag is observed before each batch
            // goes out.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break, // semaphore closed; cannot happen here
            };
            if state.halted.load(Ordering::SeqCst) {
                break;
            }

            let submitter = Arc::clone(&submitter);
            let state = Arc::clone(&state);
            let label = label.to_string();
            tasks.spawn(async move {
                let _permit = permit;
                state.submitted.fetch_add(1, Ordering::SeqCst);

                match submitter.submit(&batch.items).await {
                    Ok(()) => {
                        state.succeeded.fetch_add(1, Ordering::SeqCst);
                        println!(
                            "  ✓ Batch {}/{} ({} {}) completed",
                            batch.number,
                            batch.total,
                            batch.len(),
                            label
                        );
                    }
                    Err(e) => {
                        state.failed.fetch_add(1, Ordering::SeqCst);
                        if e.is_fatal() {
                            state.halted.store(true, Ordering::SeqCst);
                            let mut fatal = state.fatal.lock().unwrap_or_else(|p| p.into_inner());
                            // Keep the bare message; the caller re-wraps it
                            // as an authentication error for exit handling.
                            fatal.get_or_insert_with(|| match &e {
                                LoaderError::Auth(message) => message.clone(),
                                other => other.to_string(),
                            });
                            error!("halting dispatch: {}", e);
                        }
                        eprintln!(
                            "  ✗ Batch {}/{} ({} {}) failed: {}",
                            batch.number,
                            batch.total,
                            batch.len(),
                            label,
                            e
                        );
                        let mut failures =
                            state.failures.lock().unwrap_or_else(|p| p.into_inner());
                        failures.push(BatchFailure {
                            number: batch.number,
                            items: batch.len(),
                            error: e.to_string(),
                        });
                    }
                }
            });
        }

        while tasks.join_next().await.is_some() {}

        let failures = std::mem::take(
            &mut *state.failures.lock().unwrap_or_else(|p| p.into_inner()),
        );
        let fatal = state.fatal.lock().unwrap_or_else(|p| p.into_inner()).clone();
        DispatchReport {
            label: label.to_string(),
            total,
            submitted: state.submitted.load(Ordering::SeqCst),
            succeeded: state.succeeded.load(Ordering::SeqCst),
            failed: state.failed.load(Ordering::SeqCst),
            failures,
            fatal,
        }
    }
}
