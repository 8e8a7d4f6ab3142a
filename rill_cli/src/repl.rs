//! The interactive shell.
//!
//! Each input line runs through the full pipeline and is appended to the
//! persistent VM via the incremental load protocol, so bindings survive
//! across inputs. The result of a bare expression echoes back unless it
//! is nil. Errors print a report and leave the session usable.

use crate::error;
use anyhow::Result;
use rill_core::{RillResult, Value};
use rill_vm::Vm;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::process::ExitCode;

/// Run the REPL until end of input.
pub fn run() -> ExitCode {
    match repl_loop() {
        Ok(()) => ExitCode::from(error::EXIT_SUCCESS),
        Err(err) => {
            eprintln!("rill: {}", err);
            ExitCode::from(error::EXIT_ERROR)
        }
    }
}

fn repl_loop() -> Result<()> {
    println!("rill {} (interactive; Ctrl-D to exit)", rill_core::VERSION);
    let mut editor = DefaultEditor::new()?;
    let mut vm = Vm::new();

    loop {
        match editor.readline(">>> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                match eval_chunk(&mut vm, line) {
                    Ok(Some(value)) => println!("{}", value),
                    Ok(None) => {}
                    Err(err) => {
                        eprint!("{}", error::render_string(&err, Some(line), "<repl>"));
                        vm.recover();
                    }
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Compile one input and run it incrementally, returning the value to
/// echo (the last discarded expression result, when it is not nil).
fn eval_chunk(vm: &mut Vm, source: &str) -> RillResult<Option<Value>> {
    let code = rill_compiler::compile_source(source, "<repl>")?;
    vm.load_incremental(code)?;
    Ok(vm.take_last_popped().filter(|value| !value.is_nil()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::BufferHost;

    #[test]
    fn test_eval_chunk_echoes_expression_values() {
        let mut vm = Vm::with_host(Box::new(BufferHost::new()));
        assert!(eval_chunk(&mut vm, "var x = 21;").unwrap().is_none());
        let echoed = eval_chunk(&mut vm, "x * 2;").unwrap().unwrap();
        assert_eq!(echoed.to_string(), "42");
    }

    #[test]
    fn test_eval_chunk_suppresses_nil() {
        let mut vm = Vm::with_host(Box::new(BufferHost::new()));
        assert!(eval_chunk(&mut vm, "null;").unwrap().is_none());
        assert!(eval_chunk(&mut vm, "print(1);").unwrap().is_none());
    }

    #[test]
    fn test_session_recovers_after_error() {
        let mut vm = Vm::with_host(Box::new(BufferHost::new()));
        eval_chunk(&mut vm, "var kept = 7;").unwrap();
        assert!(eval_chunk(&mut vm, "boom;").is_err());
        vm.recover();
        let echoed = eval_chunk(&mut vm, "kept;").unwrap().unwrap();
        assert_eq!(echoed.to_string(), "7");
    }
}
