//! Styled terminal output (no-op styling when stdout isn't a TTY) and the console log sink.

use colored::Colorize;
use std::env;
use std::io::IsTerminal;
use tandem_core::LogSink;

pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

pub fn success(msg: &str) {
    if use_color() {
        println!("{}", msg.green());
    } else {
        println!("{}", msg);
    }
}

pub fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

pub fn info(msg: &str) {
    if use_color() {
        println!("{}", msg.cyan());
    } else {
        println!("{}", msg);
    }
}

pub fn dim(msg: &str) {
    if use_color() {
        println!("{}", msg.dimmed());
    } else {
        println!("{}", msg);
    }
}

/// Prints report lines to stdout unless quiet.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink {
    quiet: bool,
}

impl ConsoleSink {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl LogSink for ConsoleSink {
    fn line(&self, line: &str) {
        if !self.quiet {
            println!("{}", line);
        }
    }
}
