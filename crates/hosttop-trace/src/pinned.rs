//! Pinned tracer threads.
//!
//! Linux binds a ptrace session to the thread that issued
//! `PTRACE_ATTACH`; requests from any other thread fail with `ESRCH`.
//! A [`PinnedWorker`] is a dedicated OS thread that runs one tracing
//! session from attach to detach; it never runs on a shared pool or an
//! async runtime.

use std::thread::{self, JoinHandle};

use hosttop_common::types::ProcessId;

use crate::error::TraceError;

/// A dedicated OS thread owning the tracing session of one process.
#[derive(Debug)]
pub struct PinnedWorker<T> {
    pid: ProcessId,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> PinnedWorker<T> {
    /// Starts `session` on a new thread named `spy-<pid>`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Spawn`] if the OS refuses a new thread.
    pub fn spawn<F>(pid: ProcessId, session: F) -> Result<Self, TraceError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("spy-{pid}"))
            .spawn(session)
            .map_err(|source| TraceError::Spawn { pid, source })?;
        tracing::trace!(%pid, "pinned tracer thread started");
        Ok(Self { pid, handle })
    }

    /// Process this worker traces.
    #[must_use]
    pub const fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Waits for the session to return. `None` means it panicked.
    pub fn join(self) -> Option<T> {
        match self.handle.join() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::error!(pid = %self.pid, "tracer thread panicked");
                None
            }
        }
    }
}
