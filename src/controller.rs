//! Tracee Controller: owns the fork/exec/wait lifecycle of the child.

use std::ffi::CString;

use nix::sys::ptrace::{self, Options};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};

use crate::error::{KeyedError, KeyedResult};

/// What the tracee was doing when `advance` returned.
pub enum Stop {
    /// Stopped at a syscall-entry or syscall-exit boundary.
    Syscall,
    /// The tracee has exited with the given status code.
    Exited(i32),
}

/// Forks, marks the child traceable, execs `argv`, and waits for the
/// exec-generated stop that synchronises tracer and tracee. Sets
/// `PTRACE_O_EXITKILL` so the tracee dies if this supervisor does.
pub fn spawn(argv: &[CString]) -> KeyedResult<Pid> {
    if argv.is_empty() {
        return Err(KeyedError::Usage("no command given".into()));
    }

    // Safety: the child immediately calls traceme/execvp/exit without
    // touching any state shared with the parent's other threads.
    match unsafe { fork() }.map_err(KeyedError::Spawn)? {
        ForkResult::Child => {
            if ptrace::traceme().is_err() {
                std::process::exit(126);
            }
            let _ = execvp(&argv[0], argv);
            // execvp only returns on failure.
            std::process::exit(127);
        }
        ForkResult::Parent { child } => {
            match waitpid(child, None).map_err(KeyedError::Spawn)? {
                WaitStatus::Stopped(_, _) | WaitStatus::PtraceEvent(_, _, _) => {}
                other => {
                    return Err(KeyedError::Spawn(wait_status_to_errno(&other)));
                }
            }
            ptrace::setoptions(
                child,
                Options::PTRACE_O_EXITKILL | Options::PTRACE_O_TRACESYSGOOD,
            )
            .map_err(KeyedError::Spawn)?;
            Ok(child)
        }
    }
}

/// Resumes the tracee until its next syscall-entry or syscall-exit stop (or
/// until it exits), then blocks until that stop is observed.
pub fn advance(pid: Pid) -> KeyedResult<Stop> {
    ptrace::syscall(pid, None)?;
    match waitpid(pid, None)? {
        WaitStatus::PtraceSyscall(_) => Ok(Stop::Syscall),
        WaitStatus::Stopped(_, _) => Ok(Stop::Syscall),
        WaitStatus::Exited(_, code) => Ok(Stop::Exited(code)),
        WaitStatus::Signaled(_, signal, _) => Ok(Stop::Exited(128 + signal as i32)),
        other => Err(KeyedError::Trace(wait_status_to_errno(&other))),
    }
}

/// Exits the supervisor with the tracee's own exit code.
pub fn terminate_with(code: i32) -> ! {
    std::process::exit(code)
}

fn wait_status_to_errno(_status: &WaitStatus) -> nix::Error {
    nix::Error::ESRCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawning_with_no_argv_is_a_usage_error() {
        let err = spawn(&[]).unwrap_err();
        match err {
            KeyedError::Usage(_) => {}
            other => panic!("expected Usage, got {other:?}"),
        }
    }
}
