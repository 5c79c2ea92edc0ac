//! Terminal state restoration.
//!
//! The selector switches the terminal into raw mode and hides the cursor, and
//! a killed selector may not get to undo that. `restore` puts the terminal
//! back into a sane line mode; `TerminalGuard` runs it on every exit path of
//! the interactive session.

use std::process::{Command, Stdio};

pub fn restore() {
    let _ = Command::new("stty")
        .arg("sane")
        .stderr(Stdio::null())
        .status();
    let _ = console::Term::stdout().show_cursor();
}

/// Restores the terminal when dropped
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
        log::debug!("Terminal restored");
    }
}
