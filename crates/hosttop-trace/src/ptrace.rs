//! ptrace-based receive interception.
//!
//! Attaches to a running worker, enables `PTRACE_O_TRACESYSGOOD` so that
//! syscall-stops (`SIGTRAP | 0x80`) are distinguishable from real
//! `SIGTRAP` deliveries, and resumes the tracee with `PTRACE_SYSCALL`
//! until the exit stop of the target syscall delivers a positive byte
//! count.

use hosttop_common::types::ProcessId;

use crate::error::TraceError;
use crate::interceptor::Interceptor;
use crate::registers::PhaseTracker;

/// Intercepts one receive syscall in one worker process with ptrace.
#[derive(Debug)]
#[cfg_attr(
    not(all(
        target_os = "linux",
        any(target_arch = "x86_64", target_arch = "aarch64")
    )),
    allow(dead_code)
)]
pub struct PtraceInterceptor {
    pid: ProcessId,
    syscall_nr: u64,
    max_capture: Option<usize>,
    phase: PhaseTracker,
    attached: bool,
    exited: bool,
    #[cfg(target_os = "linux")]
    pending_signal: Option<nix::sys::signal::Signal>,
}

impl PtraceInterceptor {
    /// Prepares interception of `syscall_nr` in `pid`, copying at most
    /// `max_capture` bytes per receive, or all of them when `None`.
    /// Nothing is attached yet.
    #[must_use]
    pub fn new(pid: ProcessId, syscall_nr: u64, max_capture: Option<usize>) -> Self {
        Self {
            pid,
            syscall_nr,
            max_capture,
            phase: PhaseTracker::default(),
            attached: false,
            exited: false,
            #[cfg(target_os = "linux")]
            pending_signal: None,
        }
    }
}

#[cfg(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64")
))]
mod linux {
    use nix::errno::Errno;
    use nix::sys::ptrace;
    use nix::sys::signal::Signal;
    use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
    use nix::unistd::Pid;

    use super::{Interceptor, ProcessId, PtraceInterceptor, TraceError};
    use crate::registers::{SyscallPhase, read_registers};

    /// What a single wait on the tracee reported.
    enum Stop {
        /// A syscall-stop, tagged by `PTRACE_O_TRACESYSGOOD`.
        Syscall,
        /// Signal-delivery stop; the signal must be re-injected.
        Signal(Signal),
        /// A ptrace event or job-control notification; just resume.
        Other,
        /// The tracee is gone.
        Exited,
    }

    fn nix_pid(pid: ProcessId) -> Result<Pid, TraceError> {
        i32::try_from(pid.as_raw())
            .map(Pid::from_raw)
            .map_err(|_| TraceError::Attach {
                pid,
                source: Errno::ESRCH,
            })
    }

    impl PtraceInterceptor {
        fn target(&self) -> Result<Pid, TraceError> {
            nix_pid(self.pid)
        }

        fn control(&self, op: &'static str, source: Errno) -> TraceError {
            TraceError::Control {
                pid: self.pid,
                op,
                source,
            }
        }

        /// Waits for the next state change, retrying on `EINTR`.
        fn wait_stop(&self, target: Pid) -> Result<Stop, TraceError> {
            loop {
                match waitpid(target, Some(WaitPidFlag::__WALL)) {
                    Ok(WaitStatus::PtraceSyscall(_)) => return Ok(Stop::Syscall),
                    Ok(WaitStatus::Stopped(_, signal)) => return Ok(Stop::Signal(signal)),
                    Ok(WaitStatus::Exited(_, code)) => {
                        tracing::info!(pid = %self.pid, code, "traced process exited");
                        return Ok(Stop::Exited);
                    }
                    Ok(WaitStatus::Signaled(_, signal, _)) => {
                        tracing::info!(pid = %self.pid, %signal, "traced process killed");
                        return Ok(Stop::Exited);
                    }
                    Ok(_) => return Ok(Stop::Other),
                    Err(Errno::EINTR) => {}
                    Err(Errno::ECHILD) => return Ok(Stop::Exited),
                    Err(errno) => return Err(self.control("waitpid", errno)),
                }
            }
        }

        /// Resumes the tracee until its next syscall-stop, forwarding any
        /// signal that was intercepted at the previous stop.
        fn resume(&mut self, target: Pid) -> Result<bool, TraceError> {
            match ptrace::syscall(target, self.pending_signal.take()) {
                Ok(()) => Ok(true),
                Err(Errno::ESRCH) => Ok(false),
                Err(errno) => Err(self.control("PTRACE_SYSCALL", errno)),
            }
        }

        fn mark_exited(&mut self) -> Option<Vec<u8>> {
            self.exited = true;
            self.attached = false;
            None
        }
    }

    impl Interceptor for PtraceInterceptor {
        fn pid(&self) -> ProcessId {
            self.pid
        }

        fn attach(&mut self) -> Result<(), TraceError> {
            let pid = self.pid;
            let target = self.target()?;
            ptrace::attach(target).map_err(|source| TraceError::Attach { pid, source })?;
            self.attached = true;

            // Wait for the SIGSTOP that PTRACE_ATTACH queues; other
            // signals that arrive first go back to the tracee.
            loop {
                match self.wait_stop(target) {
                    Ok(Stop::Signal(Signal::SIGSTOP)) => break,
                    Ok(Stop::Signal(signal)) => {
                        ptrace::cont(target, signal)
                            .map_err(|source| TraceError::Attach { pid, source })?;
                    }
                    Ok(Stop::Syscall | Stop::Other) => break,
                    Ok(Stop::Exited) => {
                        let _ = self.mark_exited();
                        return Err(TraceError::Attach {
                            pid,
                            source: Errno::ESRCH,
                        });
                    }
                    Err(TraceError::Control { source, .. }) => {
                        return Err(TraceError::Attach { pid, source });
                    }
                    Err(other) => return Err(other),
                }
            }

            ptrace::setoptions(
                target,
                ptrace::Options::PTRACE_O_TRACESYSGOOD | ptrace::Options::PTRACE_O_TRACEEXIT,
            )
            .map_err(|source| TraceError::Attach { pid, source })?;
            tracing::debug!(%pid, syscall = self.syscall_nr, "attached");
            Ok(())
        }

        fn next_capture(&mut self) -> Result<Option<Vec<u8>>, TraceError> {
            if self.exited {
                return Ok(None);
            }
            let target = self.target()?;
            loop {
                if !self.resume(target)? {
                    return Ok(self.mark_exited());
                }
                match self.wait_stop(target)? {
                    Stop::Syscall => {}
                    Stop::Signal(signal) => {
                        self.pending_signal = Some(signal);
                        continue;
                    }
                    Stop::Other => continue,
                    Stop::Exited => return Ok(self.mark_exited()),
                }

                let regs = match read_registers(target) {
                    Ok(regs) => regs,
                    Err(Errno::ESRCH) => return Ok(self.mark_exited()),
                    Err(errno) => return Err(self.control("PTRACE_GETREGS", errno)),
                };
                if self.phase.advance(&regs) == SyscallPhase::Entry
                    || regs.syscall_nr != self.syscall_nr
                {
                    continue;
                }
                let Some(len) = regs.received_len(self.max_capture) else {
                    continue;
                };

                return crate::memory::read_remote(target, regs.buffer_addr, len)
                    .map(Some)
                    .map_err(|source| TraceError::MemoryRead {
                        pid: self.pid,
                        addr: regs.buffer_addr,
                        len,
                        source,
                    });
            }
        }

        fn detach(&mut self) {
            if !self.attached || self.exited {
                return;
            }
            self.attached = false;
            let Ok(target) = self.target() else {
                return;
            };
            match ptrace::detach(target, self.pending_signal.take()) {
                Ok(()) => tracing::info!(pid = %self.pid, "detached"),
                Err(errno) => tracing::warn!(pid = %self.pid, %errno, "detach failed"),
            }
        }
    }
}

#[cfg(not(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64")
)))]
impl Interceptor for PtraceInterceptor {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Stub for unsupported platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error: syscall interception requires Linux on
    /// `x86_64` or `aarch64`.
    fn attach(&mut self) -> Result<(), TraceError> {
        Err(TraceError::Unsupported(std::env::consts::ARCH))
    }

    fn next_capture(&mut self) -> Result<Option<Vec<u8>>, TraceError> {
        Err(TraceError::Unsupported(std::env::consts::ARCH))
    }

    fn detach(&mut self) {}
}

#[cfg(all(
    test,
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64")
))]
mod tests {
    use super::*;

    #[test]
    fn attaching_to_missing_process_fails_without_side_effects() {
        // pid_max never reaches i32::MAX, so this pid cannot exist.
        let pid = ProcessId::new(u32::try_from(i32::MAX).expect("fits"));
        let mut spy = PtraceInterceptor::new(pid, 45, None);
        let err = spy.attach().expect_err("no such process");
        assert!(matches!(err, TraceError::Attach { .. }));
        spy.detach();
    }

    #[test]
    fn out_of_range_pid_is_an_attach_error() {
        let mut spy = PtraceInterceptor::new(ProcessId::new(u32::MAX), 45, None);
        assert!(matches!(spy.attach(), Err(TraceError::Attach { .. })));
    }
}
