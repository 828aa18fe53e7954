//! Tracing failures, scoped to a single worker process.

use hosttop_common::types::ProcessId;
use nix::errno::Errno;
use thiserror::Error;

/// Errors raised while tracing one worker process.
///
/// None of these is fatal to the program: an attach failure leaves that
/// worker unmonitored, a control failure ends that worker's spy, and a
/// memory read failure drops a single sample.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The tracer could not attach (permission denied, process vanished).
    #[error("cannot attach to pid {pid}: {source}")]
    Attach {
        /// Target process.
        pid: ProcessId,
        /// Underlying errno.
        source: Errno,
    },

    /// A ptrace or wait request failed on an attached process.
    #[error("{op} failed on pid {pid}: {source}")]
    Control {
        /// Target process.
        pid: ProcessId,
        /// Name of the failed request.
        op: &'static str,
        /// Underlying errno.
        source: Errno,
    },

    /// Copying the receive buffer out of the tracee failed.
    #[error("cannot read {len} bytes at {addr:#x} from pid {pid}: {source}")]
    MemoryRead {
        /// Target process.
        pid: ProcessId,
        /// Remote buffer address.
        addr: u64,
        /// Requested length.
        len: usize,
        /// Underlying errno.
        source: Errno,
    },

    /// The tracing thread could not be started.
    #[error("cannot spawn tracing thread for pid {pid}: {source}")]
    Spawn {
        /// Target process.
        pid: ProcessId,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Syscall interception is not available on this platform.
    #[error("syscall tracing is not supported on {0}")]
    Unsupported(&'static str),
}

impl TraceError {
    /// Returns whether the error only spoils the current sample and the
    /// trace loop may carry on.
    #[must_use]
    pub const fn is_sample_error(&self) -> bool {
        matches!(self, Self::MemoryRead { .. })
    }
}
