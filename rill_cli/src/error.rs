//! Error formatting and exit codes.
//!
//! User-visible failures render as a single-line header naming the error
//! kind, a file/line/column pointer, and a source slice with a caret
//! range when the position is known.

use crate::diagnostics::{self, SourceMap};
use rill_core::RillError;
use std::process::ExitCode;

/// Successful execution.
pub const EXIT_SUCCESS: u8 = 0;
/// Lexer, parser, compiler, or runtime error.
pub const EXIT_ERROR: u8 = 1;
/// Command-line usage error.
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Print an error report to stderr and return the exit code.
pub fn report(error: &RillError, source: Option<&str>, filename: &str) -> ExitCode {
    eprint!("{}", render_string(error, source, filename));
    ExitCode::from(EXIT_ERROR)
}

/// Render an error report into a string (also used by the REPL).
pub fn render_string(error: &RillError, source: Option<&str>, filename: &str) -> String {
    let mut output = String::new();
    output.push_str(&error.to_string());
    output.push('\n');

    let location = match (source, error) {
        (Some(src), RillError::Lex { span, line, column, .. })
        | (Some(src), RillError::Parse { span, line, column, .. }) => {
            let map = SourceMap::new(src, filename);
            let width = (span.len() as usize).max(1);
            Some(diagnostics::render_location(&map, *line, Some(*column), width))
        }
        (Some(src), RillError::Ir { line, .. }) => {
            let map = SourceMap::new(src, filename);
            Some(diagnostics::render_location(&map, *line, None, 1))
        }
        (Some(src), RillError::Runtime { line: Some(line), .. }) => {
            let map = SourceMap::new(src, filename);
            Some(diagnostics::render_location(&map, *line, None, 1))
        }
        _ => None,
    };
    if let Some(location) = location {
        output.push_str(&location);
    } else {
        output.push_str(&format!("  File \"{}\"\n", filename));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::{RillError, RuntimeErrorKind, Span};

    #[test]
    fn test_exit_code_constants() {
        assert_eq!(EXIT_SUCCESS, 0);
        assert_eq!(EXIT_ERROR, 1);
        assert_eq!(EXIT_USAGE_ERROR, 2);
    }

    #[test]
    fn test_lex_error_report_has_caret() {
        let err = RillError::lex("unterminated string literal", Span::new(8, 9), 1, 9);
        let rendered = render_string(&err, Some("var s = \"abc"), "t.rl");
        assert!(rendered.starts_with("LexError: unterminated string literal\n"));
        assert!(rendered.contains("File \"t.rl\", line 1, column 9"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn test_parse_error_report() {
        let err = RillError::parse("at 'else': 'else' without a matching 'if'", Span::new(0, 4), 1, 1);
        let rendered = render_string(&err, Some("else {}"), "t.rl");
        assert!(rendered.starts_with("ParseError:"));
        assert!(rendered.contains("else {}"));
    }

    #[test]
    fn test_runtime_error_with_line_shows_source() {
        let err = RillError::runtime(RuntimeErrorKind::Arith, "division by zero").with_line(2);
        let rendered = render_string(&err, Some("var x = 1;\nprint(x / 0);"), "t.rl");
        assert!(rendered.starts_with("ArithError: division by zero\n"));
        assert!(rendered.contains("File \"t.rl\", line 2"));
        assert!(rendered.contains("print(x / 0);"));
    }

    #[test]
    fn test_report_without_source_names_the_file() {
        let err = RillError::name_error("undefined name 'x'");
        let rendered = render_string(&err, None, "t.rl");
        assert!(rendered.contains("NameError: undefined name 'x'"));
        assert!(rendered.contains("File \"t.rl\""));
    }
}
