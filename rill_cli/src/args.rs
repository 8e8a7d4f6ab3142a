//! Command-line argument parsing.
//!
//! Hand-rolled over `std::env::args_os` for zero-overhead startup; the
//! surface is four subcommands and nothing else.

use std::ffi::OsString;
use std::path::PathBuf;

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Interactive REPL: `rill` or `rill repl`.
    Repl,
    /// Execute a script: `rill run <path>`.
    Run(PathBuf),
    /// Print the version: `rill version`.
    Version,
    /// Print usage: `rill help`.
    Help,
}

/// Usage text shown by `help` and on usage errors.
pub const USAGE: &str = "\
Usage: rill [COMMAND]

Commands:
    repl          Start the interactive shell (default)
    run <path>    Execute a script file
    version       Print the version
    help          Print this message
";

/// Parse the arguments after the program name.
pub fn parse(mut args: impl Iterator<Item = OsString>) -> Result<ExecutionMode, String> {
    let Some(command) = args.next() else {
        return Ok(ExecutionMode::Repl);
    };

    let mode = match command.to_string_lossy().as_ref() {
        "repl" => ExecutionMode::Repl,
        "run" => {
            let Some(path) = args.next() else {
                return Err("'run' requires a script path".to_string());
            };
            ExecutionMode::Run(PathBuf::from(path))
        }
        "version" | "--version" | "-V" => ExecutionMode::Version,
        "help" | "--help" | "-h" => ExecutionMode::Help,
        other => return Err(format!("unknown command '{}'", other)),
    };

    if let Some(extra) = args.next() {
        return Err(format!(
            "unexpected argument '{}'",
            extra.to_string_lossy()
        ));
    }
    Ok(mode)
}
