//! Command-line surface (§6): a thin `clap`-derived wrapper. Everything
//! here is plumbing around the core; the interesting behavior lives in
//! `passphrase`, `kdf`, and `interceptor`.

use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_KEY_FILE_BOUND: usize = 1024;

#[derive(Parser, Debug)]
#[command(
    name = "keyed",
    about = "Runs a command with its kernel randomness replaced by a deterministic, passphrase-derived keystream"
)]
pub struct Cli {
    /// Read the passphrase from FILE instead of prompting, truncated at the
    /// first newline.
    #[arg(short = 'k', long = "key-file", value_name = "FILE")]
    pub key_file: Option<PathBuf>,

    /// Number of confirmation re-entries when prompting interactively.
    #[arg(short = 'n', long = "confirmations", default_value_t = 1)]
    pub confirmations: usize,

    /// Make the traced child's getpid() always return PID (default 2).
    #[arg(
        short = 'p',
        long = "fake-pid",
        value_name = "PID",
        num_args = 0..=1,
        default_missing_value = "2"
    )]
    pub fake_pid: Option<i32>,

    /// Enable verbose diagnostic output.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// The command to run under supervision, and its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_p_defaults_to_pid_two() {
        let cli = Cli::parse_from(["keyed", "-p", "--", "true"]);
        assert_eq!(cli.fake_pid, Some(2));
    }

    #[test]
    fn attached_p_value_is_parsed() {
        let cli = Cli::parse_from(["keyed", "-p7", "true"]);
        assert_eq!(cli.fake_pid, Some(7));
    }

    #[test]
    fn omitted_p_disables_fake_pid() {
        let cli = Cli::parse_from(["keyed", "true"]);
        assert_eq!(cli.fake_pid, None);
    }

    #[test]
    fn confirmations_default_to_one() {
        let cli = Cli::parse_from(["keyed", "true"]);
        assert_eq!(cli.confirmations, 1);
    }

    #[test]
    fn trailing_args_form_the_child_command() {
        let cli = Cli::parse_from(["keyed", "echo", "hi", "-v"]);
        assert_eq!(cli.command, vec!["echo", "hi", "-v"]);
    }
}
