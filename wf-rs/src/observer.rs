//! Run observers.
//!
//! Observers see script comments and one progress line per directive or
//! command.  They report; they never influence control flow.

use std::sync::{Arc, Mutex};

use crossterm::style::Stylize;

pub trait Observer: Send {
    fn on_comment(&mut self, _text: &str) {}
    fn on_progress(&mut self, _line: &str) {}
}

/// Prints to stdout.  Comments are echoed unless `quiet`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutObserver {
    pub quiet: bool,
    pub color: bool,
}

impl Observer for StdoutObserver {
    fn on_comment(&mut self, text: &str) {
        if self.quiet {
            return;
        }
        if self.color {
            println!("{}", text.dark_grey());
        } else {
            println!("{text}");
        }
    }

    fn on_progress(&mut self, line: &str) {
        if !self.quiet {
            println!("  {line}");
        }
    }
}

/// Records everything it sees.  Clones share the same buffer, so a caller
/// can keep one handle and give the other to a runner.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl Observer for Transcript {
    fn on_comment(&mut self, text: &str) {
        self.push(format!("# {text}"));
    }

    fn on_progress(&mut self, line: &str) {
        self.push(line.to_owned());
    }
}
