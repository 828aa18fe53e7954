//! Register decoding at syscall stops.
//!
//! Maps the architecture's register file onto the few values a receive
//! interception needs: syscall number, return value, and the buffer
//! address/length arguments.
//!
//! | arch      | nr         | return | buf | len |
//! |-----------|------------|--------|-----|-----|
//! | `x86_64`  | `orig_rax` | `rax`  | `rsi` | `rdx` |
//! | `aarch64` | `x8`       | `x0`   | `x1`  | `x2`  |

/// Register values relevant to an intercepted receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallRegisters {
    /// Syscall number.
    pub syscall_nr: u64,
    /// Return value register; bytes received on success.
    pub return_value: i64,
    /// Address of the caller's receive buffer.
    pub buffer_addr: u64,
    /// Capacity of the caller's receive buffer.
    pub buffer_len: u64,
    /// Whether the registers themselves say this is a syscall entry.
    /// `x86_64` sets the return register to `-ENOSYS` on entry; other
    /// architectures give no hint.
    pub entry_hint: Option<bool>,
}

impl SyscallRegisters {
    /// Number of bytes to copy for a completed receive.
    ///
    /// The return value, clipped to the caller's buffer and, when given,
    /// to `cap`. `None` for errors and zero-length reads.
    #[must_use]
    pub fn received_len(&self, cap: Option<usize>) -> Option<usize> {
        let received = u64::try_from(self.return_value).ok()?.min(self.buffer_len);
        let received = usize::try_from(received).unwrap_or(usize::MAX);
        let len = cap.map_or(received, |cap| received.min(cap));
        (len > 0).then_some(len)
    }
}

/// Which side of a syscall a syscall-stop is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallPhase {
    /// Arguments are set, the kernel has not run the call yet.
    Entry,
    /// The call completed and its return value is set.
    Exit,
}

/// Tracks the entry/exit alternation of syscall-stops for one tracee.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    in_syscall: bool,
}

impl PhaseTracker {
    /// Classifies the current stop, trusting the register hint when the
    /// architecture provides one.
    pub fn advance(&mut self, regs: &SyscallRegisters) -> SyscallPhase {
        let entering = regs.entry_hint.unwrap_or(!self.in_syscall);
        self.in_syscall = entering;
        if entering {
            SyscallPhase::Entry
        } else {
            SyscallPhase::Exit
        }
    }
}

/// The socket receive syscall (`recvfrom`) on the build architecture.
#[cfg(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64")
))]
#[allow(clippy::cast_sign_loss)]
#[must_use]
pub const fn default_recv_syscall() -> Option<u64> {
    Some(libc::SYS_recvfrom as u64)
}

/// No known receive syscall on this platform.
#[cfg(not(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64")
)))]
#[must_use]
pub const fn default_recv_syscall() -> Option<u64> {
    None
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
#[allow(clippy::cast_possible_wrap)]
impl From<&libc::user_regs_struct> for SyscallRegisters {
    fn from(regs: &libc::user_regs_struct) -> Self {
        let return_value = regs.rax as i64;
        Self {
            syscall_nr: regs.orig_rax,
            return_value,
            buffer_addr: regs.rsi,
            buffer_len: regs.rdx,
            entry_hint: Some(return_value == -i64::from(libc::ENOSYS)),
        }
    }
}

#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
#[allow(clippy::cast_possible_wrap)]
impl From<&libc::user_regs_struct> for SyscallRegisters {
    fn from(regs: &libc::user_regs_struct) -> Self {
        Self {
            syscall_nr: regs.regs[8],
            return_value: regs.regs[0] as i64,
            buffer_addr: regs.regs[1],
            buffer_len: regs.regs[2],
            entry_hint: None,
        }
    }
}

/// Reads the register file of a stopped tracee.
///
/// # Errors
///
/// Returns the errno of the failed `PTRACE_GETREGS` request.
#[cfg(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64")
))]
pub fn read_registers(pid: nix::unistd::Pid) -> nix::Result<SyscallRegisters> {
    nix::sys::ptrace::getregs(pid).map(|regs| SyscallRegisters::from(&regs))
}
