//! # hosttop-trace
//!
//! Process tracing primitives for hosttop.
//!
//! - **Discovery**: find worker processes in the process table.
//! - **Pinned workers**: dedicated OS threads that own one tracing session
//!   each. ptrace requests are only honoured from the thread that attached,
//!   so a session must never hop threads.
//! - **Interception**: attach with `PTRACE_O_TRACESYSGOOD`, stop at every
//!   syscall exit, decode registers and copy the receive buffer out of the
//!   tracee.
//!
//! Everything that touches ptrace is Linux-only; other platforms get stubs
//! that fail with [`TraceError::Unsupported`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod discovery;
pub mod error;
pub mod interceptor;
pub mod memory;
pub mod pinned;
pub mod ptrace;
pub mod registers;

pub use error::TraceError;
pub use interceptor::Interceptor;
pub use pinned::PinnedWorker;
pub use ptrace::PtraceInterceptor;
