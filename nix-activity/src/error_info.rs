//! Structured errors passed to [`Logger::log_error_info`](crate::Logger::log_error_info).

use std::fmt::{self, Display, Formatter, Write};

use crate::verbosity::Verbosity;

pub const ANSI_NORMAL: &str = "\x1b[0m";
pub const ANSI_RED: &str = "\x1b[31;1m";
pub const ANSI_GREEN: &str = "\x1b[32;1m";
pub const ANSI_YELLOW: &str = "\x1b[33;1m";
pub const ANSI_WARNING: &str = "\x1b[35;1m";
pub const ANSI_BLUE: &str = "\x1b[34;1m";

/// A position in a source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pos {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One frame of context added while an error propagated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    pub pos: Option<Pos>,
    pub hint: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorInfo {
    pub level: Verbosity,
    /// Message template, without level prefix or position.
    pub msg: String,
    pub pos: Option<Pos>,
    /// Frames in the order they were added, innermost first.
    pub traces: Vec<Trace>,
}

impl ErrorInfo {
    pub fn new(level: Verbosity, msg: impl Into<String>) -> Self {
        Self {
            level,
            msg: msg.into(),
            pos: None,
            traces: Vec::new(),
        }
    }

    pub fn with_pos(mut self, pos: Pos) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn add_trace(&mut self, pos: Option<Pos>, hint: impl Into<String>) {
        self.traces.push(Trace {
            pos,
            hint: hint.into(),
        });
    }

    /// Frames ordered like a call stack: outermost first.
    pub fn stack(&self) -> impl Iterator<Item = &Trace> {
        self.traces.iter().rev()
    }
}

fn level_prefix(level: Verbosity) -> (&'static str, &'static str) {
    match level {
        Verbosity::Error => (ANSI_RED, "error:"),
        Verbosity::Warn => (ANSI_WARNING, "warning:"),
        Verbosity::Notice => (ANSI_GREEN, "note:"),
        Verbosity::Info => (ANSI_GREEN, "info:"),
        Verbosity::Talkative => (ANSI_GREEN, "talk:"),
        Verbosity::Chatty => (ANSI_GREEN, "chat:"),
        Verbosity::Debug => (ANSI_YELLOW, "debug:"),
        Verbosity::Vomit => (ANSI_GREEN, "vomit:"),
    }
}

/// Render an error the way file-backed errors are shown to users.
///
/// Trace frames are only included when `show_trace` is set.
pub fn render_error_info(info: &ErrorInfo, show_trace: bool) -> String {
    let (color, prefix) = level_prefix(info.level);
    let mut out = format!("{color}{prefix}{ANSI_NORMAL} {}", info.msg);

    if let Some(pos) = &info.pos {
        let _ = write!(out, "\n       at {ANSI_BLUE}{pos}{ANSI_NORMAL}");
    }

    if show_trace {
        for trace in info.stack() {
            let _ = write!(out, "\n       … {}", trace.hint);
            if let Some(pos) = &trace.pos {
                let _ = write!(out, "\n         at {ANSI_BLUE}{pos}{ANSI_NORMAL}");
            }
        }
    }

    out
}
