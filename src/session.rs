//! Session: the run-once value tying the derived key, bookkeeping, and
//! scratch buffer to a single tracee for the lifetime of one supervised run.

use nix::unistd::Pid;
use zeroize::Zeroizing;

use crate::error::{KeyedError, KeyedResult};
use crate::fdtable::FdTable;
use crate::keystream;

pub struct Session {
    pub key: Zeroizing<[u8; 32]>,
    pub verbose: bool,
    pub fake_pid: Option<i32>,
    pub tracee: Pid,
    pub fds: FdTable,
    scratch: Vec<u8>,
}

impl Session {
    pub fn new(
        key: Zeroizing<[u8; 32]>,
        verbose: bool,
        fake_pid: Option<i32>,
        tracee: Pid,
        fd_capacity: usize,
    ) -> Self {
        Session {
            key,
            verbose,
            fake_pid,
            tracee,
            fds: FdTable::new(fd_capacity),
            scratch: Vec::new(),
        }
    }

    /// Grows the scratch buffer to at least `len` bytes (monotonically,
    /// never shrinking), fills it with `len` bytes of keystream under this
    /// session's key, and returns that slice.
    pub fn fill_random(&mut self, len: usize) -> KeyedResult<&[u8]> {
        if self.scratch.len() < len {
            self.scratch
                .try_reserve(len - self.scratch.len())
                .map_err(|_| KeyedError::Resource)?;
            self.scratch.resize(len, 0);
        }
        keystream::fill(&self.key, &mut self.scratch[..len]);
        Ok(&self.scratch[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Zeroizing::new([0u8; 32]), false, None, Pid::this(), 16)
    }

    #[test]
    fn scratch_grows_to_fit_the_largest_request() {
        let mut s = session();
        s.fill_random(4).unwrap();
        s.fill_random(64).unwrap();
        assert!(s.scratch.len() >= 64);
    }

    #[test]
    fn scratch_never_shrinks_on_a_smaller_request() {
        let mut s = session();
        s.fill_random(64).unwrap();
        let grown = s.scratch.len();
        s.fill_random(4).unwrap();
        assert_eq!(s.scratch.len(), grown);
    }
}
