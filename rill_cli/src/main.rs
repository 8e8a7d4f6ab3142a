//! Rill: a small scripting language with exact numeric semantics.

mod args;
mod diagnostics;
mod error;
mod repl;

use args::ExecutionMode;
use rill_core::RillResult;
use rill_vm::Vm;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    match args::parse(std::env::args_os().skip(1)) {
        Ok(ExecutionMode::Repl) => repl::run(),
        Ok(ExecutionMode::Run(path)) => run_file(&path),
        Ok(ExecutionMode::Version) => {
            println!("rill {}", rill_core::VERSION);
            ExitCode::from(error::EXIT_SUCCESS)
        }
        Ok(ExecutionMode::Help) => {
            print!("{}", args::USAGE);
            ExitCode::from(error::EXIT_SUCCESS)
        }
        Err(message) => {
            eprintln!("rill: {}", message);
            eprint!("{}", args::USAGE);
            ExitCode::from(error::EXIT_USAGE_ERROR)
        }
    }
}

/// Execute a script file.
fn run_file(path: &Path) -> ExitCode {
    let filename = path.display().to_string();
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("rill: cannot read '{}': {}", filename, err);
            return ExitCode::from(error::EXIT_USAGE_ERROR);
        }
    };
    match execute(&source, &filename) {
        Ok(()) => ExitCode::from(error::EXIT_SUCCESS),
        Err(err) => error::report(&err, Some(&source), &filename),
    }
}

/// The whole pipeline: source → code object → execution.
fn execute(source: &str, filename: &str) -> RillResult<()> {
    let code = rill_compiler::compile_source(source, filename)?;
    Vm::new().load(code)
}
