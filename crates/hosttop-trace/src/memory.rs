//! Reading memory out of a traced process.
//!
//! Tries `process_vm_readv(2)` first: one syscall per buffer. Kernels or
//! sandboxes that refuse it fall back to word-by-word `PTRACE_PEEKDATA`,
//! which only works on a stopped tracee.

#[cfg(target_os = "linux")]
use nix::errno::Errno;
#[cfg(target_os = "linux")]
use nix::unistd::Pid;

/// Copies `len` bytes at `addr` out of process `pid`.
///
/// A partial `process_vm_readv` (buffer crossing into an unmapped page)
/// returns the readable prefix.
///
/// # Errors
///
/// Returns the errno of the failed read when both strategies fail.
#[cfg(target_os = "linux")]
pub fn read_remote(pid: Pid, addr: u64, len: usize) -> nix::Result<Vec<u8>> {
    use std::io::IoSliceMut;

    use nix::sys::uio::{RemoteIoVec, process_vm_readv};

    let base = usize::try_from(addr).map_err(|_| Errno::EFAULT)?;
    let mut buf = vec![0u8; len];
    let remote = [RemoteIoVec { base, len }];
    match process_vm_readv(pid, &mut [IoSliceMut::new(&mut buf)], &remote) {
        Ok(read) => {
            buf.truncate(read);
            Ok(buf)
        }
        Err(errno) => {
            tracing::trace!(%pid, %errno, "process_vm_readv refused, peeking words");
            peek_words(pid, base, len)
        }
    }
}

/// Reads `len` bytes with `PTRACE_PEEKDATA`, one machine word at a time.
///
/// # Errors
///
/// Returns the errno of the first failed peek.
#[cfg(target_os = "linux")]
pub fn peek_words(pid: Pid, base: usize, len: usize) -> nix::Result<Vec<u8>> {
    use nix::sys::ptrace::{self, AddressType};

    const WORD: usize = std::mem::size_of::<libc::c_long>();

    let mut out = Vec::with_capacity(len.next_multiple_of(WORD));
    let mut offset = 0;
    while out.len() < len {
        let addr = base.checked_add(offset).ok_or(Errno::EFAULT)?;
        let word = ptrace::read(pid, addr as AddressType)?;
        out.extend_from_slice(&word.to_ne_bytes());
        offset += WORD;
    }
    out.truncate(len);
    Ok(out)
}
