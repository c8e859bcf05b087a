//! Tracee Memory Proxy: crosses the process boundary to read/write the
//! tracee's address space and its saved register block.

use std::io::{IoSlice, IoSliceMut};

use nix::sys::ptrace;
use nix::sys::uio::{process_vm_readv, process_vm_writev, RemoteIoVec};
use nix::unistd::Pid;

use crate::error::KeyedResult;

/// Copies up to `len` bytes out of the tracee's address space starting at
/// `remote_addr`. A short read is only expected at the tail of a mapping
/// (e.g. reading a path string near a page boundary) and is returned as-is;
/// callers that need an exact length check it themselves.
pub fn read_bytes(pid: Pid, remote_addr: u64, len: usize) -> KeyedResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    let remote = [RemoteIoVec {
        base: remote_addr as usize,
        len,
    }];
    let mut local = [IoSliceMut::new(&mut buf)];
    let copied = process_vm_readv(pid, &mut local, &remote)?;
    buf.truncate(copied);
    Ok(buf)
}

/// Writes `bytes` into the tracee's address space at `remote_addr`. All or
/// nothing: a short write is reported as a trace failure rather than
/// silently leaving the tracee's buffer half-populated.
pub fn write_bytes(pid: Pid, remote_addr: u64, bytes: &[u8]) -> KeyedResult<()> {
    let remote = [RemoteIoVec {
        base: remote_addr as usize,
        len: bytes.len(),
    }];
    let local = [IoSlice::new(bytes)];
    let copied = process_vm_writev(pid, &local, &remote)?;
    if copied != bytes.len() {
        return Err(nix::Error::EIO.into());
    }
    Ok(())
}

pub fn get_registers(pid: Pid) -> KeyedResult<libc::user_regs_struct> {
    Ok(ptrace::getregs(pid)?)
}

pub fn set_registers(pid: Pid, regs: libc::user_regs_struct) -> KeyedResult<()> {
    ptrace::setregs(pid, regs)?;
    Ok(())
}

/// Patches the return-value slot (`rax`) of the tracee's saved registers.
/// Linux's ptrace has no single-word accessor for the return slot on
/// x86_64, so this is a get-modify-set over the full register block.
pub fn poke_return(pid: Pid, value: u64) -> KeyedResult<()> {
    let mut regs = get_registers(pid)?;
    regs.rax = value;
    set_registers(pid, regs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_iov_carries_the_requested_length() {
        let remote = RemoteIoVec { base: 0x1000, len: 13 };
        assert_eq!(remote.len, 13);
    }
}
