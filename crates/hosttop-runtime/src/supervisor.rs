//! Starting and awaiting the spies.
//!
//! The supervisor starts one pinned spy per worker, then blocks until
//! every spy has reported its attach result. Attach failures are scoped to
//! their worker; only a fleet with no attached worker at all is an error.

use std::collections::BTreeSet;
use std::sync::{Arc, mpsc};

use hosttop_common::error::{HostTopError, Result};
use hosttop_common::types::{ProcessId, TraceState};
use hosttop_trace::{Interceptor, PinnedWorker, TraceError};

use crate::spy::{Spy, SpyOutcome};
use crate::store::CounterStore;

/// A worker that will not be monitored.
#[derive(Debug)]
pub struct AttachFailure {
    /// Worker process.
    pub pid: ProcessId,
    /// Why the attach failed.
    pub error: TraceError,
}

/// Starts spies that all write into the same [`CounterStore`].
#[derive(Debug)]
pub struct Supervisor {
    store: Arc<CounterStore>,
}

impl Supervisor {
    /// Creates a supervisor feeding `store`.
    #[must_use]
    pub const fn new(store: Arc<CounterStore>) -> Self {
        Self { store }
    }

    /// Starts one spy per distinct pid, each on its own pinned thread, and
    /// waits for every attach to succeed or fail.
    ///
    /// `make` builds the interceptor for a pid; it runs on the calling
    /// thread, the interceptor is then moved onto the spy's thread.
    pub fn start<I, F>(&self, pids: &[ProcessId], mut make: F) -> Fleet
    where
        I: Interceptor + 'static,
        F: FnMut(ProcessId) -> I,
    {
        let unique: BTreeSet<ProcessId> = pids.iter().copied().collect();
        let (tx, rx) = mpsc::channel();
        let mut workers = Vec::with_capacity(unique.len());
        let mut failures = Vec::new();

        for pid in unique {
            let spy = Spy::new(make(pid), Arc::clone(&self.store));
            let attached = tx.clone();
            match PinnedWorker::spawn(pid, move || spy.run(attached)) {
                Ok(worker) => workers.push(worker),
                Err(error) => failures.push(AttachFailure { pid, error }),
            }
        }
        drop(tx);

        let mut attached = Vec::with_capacity(workers.len());
        for report in rx.iter().take(workers.len()) {
            match report.result {
                Ok(()) => attached.push(report.pid),
                Err(error) => failures.push(AttachFailure {
                    pid: report.pid,
                    error,
                }),
            }
        }
        attached.sort_unstable();
        failures.sort_unstable_by_key(|f| f.pid);

        tracing::info!(
            attached = attached.len(),
            failed = failures.len(),
            "spies started"
        );
        Fleet {
            workers,
            attached,
            failures,
        }
    }
}

/// The running spies and how their attach went.
#[derive(Debug)]
pub struct Fleet {
    workers: Vec<PinnedWorker<SpyOutcome>>,
    attached: Vec<ProcessId>,
    failures: Vec<AttachFailure>,
}

impl Fleet {
    /// Workers being traced, ascending.
    #[must_use]
    pub fn attached(&self) -> &[ProcessId] {
        &self.attached
    }

    /// Workers that could not be traced, ascending.
    #[must_use]
    pub fn failures(&self) -> &[AttachFailure] {
        &self.failures
    }

    /// Fails when no worker at all could be attached.
    ///
    /// # Errors
    ///
    /// Returns [`HostTopError::NoneAttached`] if every attach failed.
    pub fn ensure_attached(&self) -> Result<()> {
        if self.attached.is_empty() {
            return Err(HostTopError::NoneAttached {
                requested: self.failures.len(),
            });
        }
        Ok(())
    }

    /// Blocks until every spy has finished. A spy whose thread panicked is
    /// reported as `Failed`.
    pub fn wait(self) -> Vec<SpyOutcome> {
        self.workers
            .into_iter()
            .map(|worker| {
                let pid = worker.pid();
                worker.join().unwrap_or(SpyOutcome {
                    pid,
                    state: TraceState::Failed,
                    captured: 0,
                    recorded: 0,
                })
            })
            .collect()
    }
}
