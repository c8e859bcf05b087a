//! Passphrase acquisition (§6): either a `-k FILE` load or an interactive
//! prompt against the controlling terminal with echo suppressed and
//! confirmation re-entry.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg, Termios};
use zeroize::Zeroizing;

use crate::error::{KeyedError, KeyedResult};

const TTY_PATH: &str = "/dev/tty";

/// Reads passphrase bytes from `path`, truncated at the first newline.
/// Errors if the file exceeds `bound` bytes without a newline.
pub fn read_key_file(path: &Path, bound: usize) -> KeyedResult<Zeroizing<Vec<u8>>> {
    let mut file = std::fs::File::open(path).map_err(|e| KeyedError::io(path, e))?;
    let mut raw = Zeroizing::new(Vec::new());
    file.by_ref()
        .take(bound as u64 + 1)
        .read_to_end(&mut raw)
        .map_err(|e| KeyedError::io(path, e))?;

    match raw.iter().position(|&b| b == b'\n') {
        Some(newline) => {
            raw.truncate(newline);
            Ok(raw)
        }
        None if raw.len() > bound => Err(KeyedError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("key file exceeds the {bound}-byte bound without a newline"),
            ),
        )),
        None => Ok(raw),
    }
}

/// Prompts on the controlling terminal for a passphrase, then `confirmations`
/// additional times, requiring every entry to match byte-for-byte.
pub fn prompt_with_confirmation(confirmations: usize) -> KeyedResult<Zeroizing<Vec<u8>>> {
    let first = prompt_once("passphrase: ")?;
    for i in 0..confirmations {
        let again = prompt_once(&format!("confirm passphrase ({}/{confirmations}): ", i + 1))?;
        if again != first {
            return Err(KeyedError::Usage("passphrase confirmation did not match".into()));
        }
    }
    Ok(first)
}

fn prompt_once(prompt: &str) -> KeyedResult<Zeroizing<Vec<u8>>> {
    let mut tty = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(TTY_PATH)
        .map_err(|e| KeyedError::io(TTY_PATH, e))?;

    let original = tcgetattr(&tty)?;
    set_echo(&tty, &original, false)?;

    let result = read_line_echoed_off(&mut tty, prompt);

    // Always restore terminal attributes, on every exit path.
    let _ = tcsetattr(&tty, SetArg::TCSANOW, &original);
    let _ = writeln!(tty);

    result
}

fn read_line_echoed_off(tty: &mut std::fs::File, prompt: &str) -> KeyedResult<Zeroizing<Vec<u8>>> {
    write!(tty, "{prompt}").map_err(|e| KeyedError::io(TTY_PATH, e))?;
    tty.flush().map_err(|e| KeyedError::io(TTY_PATH, e))?;

    let mut line = Zeroizing::new(Vec::new());
    BufReader::new(&*tty)
        .read_until(b'\n', &mut line)
        .map_err(|e| KeyedError::io(TTY_PATH, e))?;
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    Ok(line)
}

fn set_echo(tty: &std::fs::File, original: &Termios, echo: bool) -> KeyedResult<()> {
    let mut attrs = original.clone();
    if echo {
        attrs.local_flags.insert(LocalFlags::ECHO);
    } else {
        attrs.local_flags.remove(LocalFlags::ECHO);
    }
    tcsetattr(tty, SetArg::TCSANOW, &attrs)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn key_file_truncates_at_the_first_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "hunter2\nanything else").unwrap();
        let key = read_key_file(file.path(), 1024).unwrap();
        assert_eq!(&*key, b"hunter2");
    }

    #[test]
    fn key_file_without_a_newline_within_bound_is_used_whole() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "hunter2").unwrap();
        let key = read_key_file(file.path(), 1024).unwrap();
        assert_eq!(&*key, b"hunter2");
    }

    #[test]
    fn key_file_over_bound_without_newline_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![b'a'; 100]).unwrap();
        let err = read_key_file(file.path(), 10).unwrap_err();
        match err {
            KeyedError::Io { .. } => {}
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn missing_key_file_is_an_io_error() {
        let err = read_key_file(Path::new("/nonexistent/keyed-test-file"), 1024).unwrap_err();
        match err {
            KeyedError::Io { .. } => {}
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
