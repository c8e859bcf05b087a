//! `keyed`: runs a command with its kernel randomness replaced by a
//! deterministic, passphrase-derived keystream (see SPEC_FULL.md).
//!
//! The binary is a thin driver: parse args, acquire a passphrase, derive a
//! key, spawn the tracee, and hand off to the interceptor loop. All of the
//! interesting behavior lives in the library modules below.

// The interception core needs ptrace syscall-stops, process_vm_{read,write}v,
// and a saved register block with distinct orig_rax/rax slots: Linux/x86_64
// only, per SPEC_FULL.md's platform-coupling note.
#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
compile_error!("keyed requires Linux on x86_64 (ptrace syscall-stops, process_vm_{read,write}v, orig_rax/rax register slots)");

mod cli;
mod controller;
mod error;
mod fdtable;
mod interceptor;
mod kdf;
mod keystream;
mod memory;
mod passphrase;
mod session;

use std::ffi::CString;

use clap::Parser;

use cli::Cli;
use error::{KeyedError, KeyedResult};
use session::Session;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("keyed: {e}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> KeyedResult<i32> {
    let passphrase = match &cli.key_file {
        Some(path) => passphrase::read_key_file(path, cli::DEFAULT_KEY_FILE_BOUND)?,
        None => passphrase::prompt_with_confirmation(cli.confirmations)?,
    };

    log::debug!("deriving key from passphrase ({} bytes)", passphrase.len());
    let key = kdf::derive(&passphrase)?;

    let argv = cli
        .command
        .iter()
        .map(|arg| {
            CString::new(arg.as_str())
                .map_err(|_| KeyedError::Usage(format!("argument {arg:?} contains a NUL byte")))
        })
        .collect::<KeyedResult<Vec<_>>>()?;

    log::debug!("spawning tracee: {:?}", cli.command);
    let tracee = controller::spawn(&argv)?;

    let mut session = Session::new(
        key,
        cli.verbose,
        cli.fake_pid,
        tracee,
        fdtable::DEFAULT_CAPACITY,
    );

    interceptor::run(tracee, &mut session)
}
