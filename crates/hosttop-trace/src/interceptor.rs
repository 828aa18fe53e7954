//! Syscall interception abstraction.

use hosttop_common::types::ProcessId;

use crate::error::TraceError;

/// Source of receive buffers intercepted in one worker process.
///
/// Every method is called from the same pinned thread, in the order
/// `attach`, repeated `next_capture`, then `detach` unless the process
/// exited. [`crate::PtraceInterceptor`] is the production implementation.
pub trait Interceptor: Send {
    /// Process being intercepted.
    fn pid(&self) -> ProcessId;

    /// Attaches to the process and prepares syscall interception.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Attach`] if the process cannot be traced.
    fn attach(&mut self) -> Result<(), TraceError>;

    /// Blocks until the next successful receive and returns the bytes it
    /// delivered. `Ok(None)` means the process exited.
    ///
    /// # Errors
    ///
    /// [`TraceError::MemoryRead`] drops one sample; any other error ends
    /// the session.
    fn next_capture(&mut self) -> Result<Option<Vec<u8>>, TraceError>;

    /// Releases the process. Failures are logged, never returned.
    fn detach(&mut self);
}
