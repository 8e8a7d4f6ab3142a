//! Host I/O abstraction.
//!
//! Built-in functions never touch the process's streams directly; they write
//! and read through a [`Host`], so embeddings (and the test suite) can
//! redirect program output.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::rc::Rc;

/// The I/O surface the virtual machine exposes to native functions.
pub trait Host {
    /// Write text to the program's standard output.
    fn write_out(&mut self, text: &str);

    /// Read one line from the program's standard input, without the
    /// trailing newline. Returns an empty string at end of input.
    fn read_line(&mut self) -> String;
}

/// Host backed by the real process streams.
#[derive(Debug, Default)]
pub struct StdHost;

impl Host for StdHost {
    fn write_out(&mut self, text: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = lock.write_all(text.as_bytes());
        let _ = lock.flush();
    }

    fn read_line(&mut self) -> String {
        let stdin = std::io::stdin();
        let mut line = String::new();
        let _ = stdin.lock().read_line(&mut line);
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        line
    }
}

/// Host that captures output and serves scripted input, for tests.
///
/// The output buffer is shared: keep a handle from [`BufferHost::output_handle`]
/// before moving the host into a VM, and read it afterwards.
#[derive(Debug, Default)]
pub struct BufferHost {
    output: Rc<RefCell<String>>,
    input: VecDeque<String>,
}

impl BufferHost {
    /// Create an empty capture host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a capture host with scripted input lines.
    #[must_use]
    pub fn with_input(lines: Vec<String>) -> Self {
        Self {
            output: Rc::new(RefCell::new(String::new())),
            input: lines.into(),
        }
    }

    /// A shared handle onto the output buffer.
    #[must_use]
    pub fn output_handle(&self) -> Rc<RefCell<String>> {
        Rc::clone(&self.output)
    }

    /// Snapshot of everything written so far.
    #[must_use]
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }
}

impl Host for BufferHost {
    fn write_out(&mut self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn read_line(&mut self) -> String {
        self.input.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_host_captures_output() {
        let mut host = BufferHost::new();
        host.write_out("hello ");
        host.write_out("world");
        assert_eq!(host.output(), "hello world");
    }

    #[test]
    fn test_buffer_host_shared_handle() {
        let mut host = BufferHost::new();
        let handle = host.output_handle();
        host.write_out("shared");
        assert_eq!(handle.borrow().as_str(), "shared");
    }

    #[test]
    fn test_buffer_host_scripted_input() {
        let mut host = BufferHost::with_input(vec!["first".into(), "second".into()]);
        assert_eq!(host.read_line(), "first");
        assert_eq!(host.read_line(), "second");
        assert_eq!(host.read_line(), "");
    }
}
