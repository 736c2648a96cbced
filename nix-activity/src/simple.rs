//! Plain-text logger for humans at a terminal or reading captured output.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::error::Result;
use crate::error_info::{ErrorInfo, render_error_info};
use crate::logger::Logger;
use crate::settings::{LoggerOptions, LoggerSettings};
use crate::types::{ActivityId, ActivityType, Field, ResultType};
use crate::verbosity::{Verbosity, enabled};

/// Renders messages as lines of text.
///
/// Write failures on the output are ignored, so that cleanup code logging
/// after the reading side went away still runs to completion.
pub struct SimpleLogger {
    settings: LoggerSettings,
    out: Mutex<Box<dyn Write + Send>>,
}

impl SimpleLogger {
    /// Logger writing to stderr, with terminal and supervisor detection from
    /// the environment.
    pub fn new(print_build_logs: bool) -> Self {
        let settings = LoggerOptions {
            print_build_logs: Some(print_build_logs),
            ..Default::default()
        }
        .resolve();
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: LoggerSettings) -> Self {
        Self::with_writer(settings, io::stderr())
    }

    pub fn with_writer(settings: LoggerSettings, out: impl Write + Send + 'static) -> Self {
        Self {
            settings,
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn settings(&self) -> &LoggerSettings {
        &self.settings
    }

    fn write_line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let written = out.write_all(line.as_bytes());
        if let Err(e) = written.and_then(|()| out.flush()) {
            tracing::trace!("ignoring failed log write: {e}");
        }
    }
}

/// Syslog priority digit understood by supervisors such as systemd.
fn priority(level: Verbosity) -> char {
    match level {
        Verbosity::Error => '3',
        Verbosity::Warn => '4',
        Verbosity::Notice | Verbosity::Info => '5',
        Verbosity::Talkative | Verbosity::Chatty => '6',
        Verbosity::Debug | Verbosity::Vomit => '7',
    }
}

impl Logger for SimpleLogger {
    fn log(&self, level: Verbosity, msg: &str) -> Result<()> {
        if !enabled(level) {
            return Ok(());
        }

        let mut line = String::with_capacity(msg.len() + 4);
        if self.settings.systemd {
            line.push('<');
            line.push(priority(level));
            line.push('>');
        }
        if self.settings.tty {
            line.push_str(msg);
        } else {
            line.push_str(&strip_ansi_escapes::strip_str(msg));
        }
        line.push('\n');

        self.write_line(&line);
        Ok(())
    }

    fn log_error_info(&self, info: &ErrorInfo) -> Result<()> {
        if !enabled(info.level) {
            return Ok(());
        }
        self.log(info.level, &render_error_info(info, self.settings.show_trace))
    }

    fn start_activity(
        &self,
        _id: ActivityId,
        level: Verbosity,
        _typ: ActivityType,
        text: &str,
        _fields: &[Field],
        _parent: ActivityId,
    ) -> Result<()> {
        if enabled(level) && !text.is_empty() {
            self.log(level, &format!("{text}..."))?;
        }
        Ok(())
    }

    fn result(&self, _id: ActivityId, typ: ResultType, fields: &[Field]) -> Result<()> {
        if !self.settings.print_build_logs {
            return Ok(());
        }
        let Some(line) = fields.first().and_then(Field::as_str) else {
            return Ok(());
        };

        match typ {
            ResultType::BuildLogLine => self.log(Verbosity::Error, line),
            ResultType::PostBuildLogLine => {
                self.log(Verbosity::Error, &format!("post-build-hook: {line}"))
            }
            _ => Ok(()),
        }
    }

    fn is_verbose(&self) -> bool {
        self.settings.print_build_logs
    }
}
