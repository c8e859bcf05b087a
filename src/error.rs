//! The fatal error taxonomy for the supervisor.
//!
//! Every error the core can raise is fatal: a failure mid-trace leaves the
//! tracee in an indeterminate stopped state, so there is no partial recovery.
//! `main` prints exactly one `keyed: ` prefixed line from the top-level
//! `Display` impl and exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyedError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("I/O failure touching {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("key derivation failed")]
    Kdf(#[source] argon2::Error),

    #[error("failed to spawn tracee")]
    Spawn(#[source] nix::Error),

    #[error("ptrace operation failed")]
    Trace(#[source] nix::Error),

    #[error("monitored descriptor table is full (capacity {capacity})")]
    Capacity { capacity: usize },

    #[error("failed to grow the scratch buffer")]
    Resource,
}

impl KeyedError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeyedError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<nix::Error> for KeyedError {
    fn from(source: nix::Error) -> Self {
        KeyedError::Trace(source)
    }
}

impl From<argon2::Error> for KeyedError {
    fn from(source: argon2::Error) -> Self {
        KeyedError::Kdf(source)
    }
}

pub type KeyedResult<T> = Result<T, KeyedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_formats_without_prefix_duplication() {
        let err = KeyedError::Usage("missing command".into());
        assert_eq!(err.to_string(), "usage: missing command");
    }

    #[test]
    fn capacity_error_reports_the_configured_limit() {
        let err = KeyedError::Capacity { capacity: 16 };
        assert!(err.to_string().contains("16"));
    }

    #[test]
    fn nix_error_converts_into_trace_error() {
        let err: KeyedError = nix::Error::ESRCH.into();
        match err {
            KeyedError::Trace(source) => assert_eq!(source, nix::Error::ESRCH),
            other => panic!("expected Trace, got {other:?}"),
        }
    }

    #[test]
    fn io_error_includes_the_path() {
        let err = KeyedError::io(
            "/tmp/does-not-exist",
            std::io::Error::new(std::io::ErrorKind::NotFound, "nope"),
        );
        assert!(err.to_string().contains("/tmp/does-not-exist"));
    }
}
