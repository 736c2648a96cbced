//! The `Logger` capability and the process-wide active logger.
//!
//! All activity and message traffic goes through exactly one active logger.
//! Install it at startup with [`set_logger`]; replacing it later is allowed but
//! not synchronized with calls already running against the previous one.

use std::io::{self, Write};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::error::Result;
use crate::error_info::{ANSI_NORMAL, ANSI_WARNING, ErrorInfo};
use crate::simple::SimpleLogger;
use crate::types::{ActivityId, ActivityType, Field, ResultType};
use crate::verbosity::Verbosity;

/// A consumer of messages and activity lifecycle events.
///
/// Implementations must be callable concurrently from any thread.
pub trait Logger: Send + Sync {
    /// Emit a plain message. Levels above the current threshold are dropped.
    fn log(&self, level: Verbosity, msg: &str) -> Result<()>;

    /// Emit a structured error at its own level.
    fn log_error_info(&self, info: &ErrorInfo) -> Result<()>;

    fn start_activity(
        &self,
        _id: ActivityId,
        _level: Verbosity,
        _typ: ActivityType,
        _text: &str,
        _fields: &[Field],
        _parent: ActivityId,
    ) -> Result<()> {
        Ok(())
    }

    /// Signal that an activity ended. Callers discard the error.
    fn stop_activity(&self, _id: ActivityId) -> Result<()> {
        Ok(())
    }

    /// Report an incremental update against a running activity.
    /// Unknown ids are not an error.
    fn result(&self, _id: ActivityId, _typ: ResultType, _fields: &[Field]) -> Result<()> {
        Ok(())
    }

    /// Whether callers should bother producing maximal detail.
    fn is_verbose(&self) -> bool {
        false
    }

    fn warn(&self, msg: &str) -> Result<()> {
        self.log(
            Verbosity::Warn,
            &format!("{ANSI_WARNING}warning:{ANSI_NORMAL} {msg}"),
        )
    }

    /// Write command output (not diagnostics) to standard output.
    fn write_to_stdout(&self, s: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(s.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

static LOGGER: LazyLock<RwLock<Arc<dyn Logger>>> =
    LazyLock::new(|| RwLock::new(Arc::new(SimpleLogger::new(true))));

/// The currently active logger.
pub fn logger() -> Arc<dyn Logger> {
    let guard = LOGGER.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&guard)
}

/// Install `new` as the active logger and return the one it replaced.
///
/// The previous logger is not restored automatically.
pub fn set_logger(new: Arc<dyn Logger>) -> Arc<dyn Logger> {
    let mut guard = LOGGER.write().unwrap_or_else(PoisonError::into_inner);
    tracing::debug!("replacing active logger");
    std::mem::replace(&mut *guard, new)
}

/// Emit a warning through the active logger.
pub fn warn(msg: &str) -> Result<()> {
    logger().warn(msg)
}

/// Log through the active logger at `$level`.
///
/// The message is only formatted when `$level` passes the current
/// threshold. Evaluates to `nix_activity::Result<()>`.
#[macro_export]
macro_rules! print_msg {
    ($level:expr, $($arg:tt)+) => {{
        let level: $crate::Verbosity = $level;
        if $crate::enabled(level) {
            $crate::logger().log(level, &format!($($arg)+))
        } else {
            Ok(())
        }
    }};
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)+) => { $crate::print_msg!($crate::Verbosity::Error, $($arg)+) };
}

#[macro_export]
macro_rules! print_info {
    ($($arg:tt)+) => { $crate::print_msg!($crate::Verbosity::Info, $($arg)+) };
}

#[macro_export]
macro_rules! print_talkative {
    ($($arg:tt)+) => { $crate::print_msg!($crate::Verbosity::Talkative, $($arg)+) };
}

#[macro_export]
macro_rules! debug_msg {
    ($($arg:tt)+) => { $crate::print_msg!($crate::Verbosity::Debug, $($arg)+) };
}

/// Warn through the active logger, formatting only when warnings are shown.
#[macro_export]
macro_rules! warn_msg {
    ($($arg:tt)+) => {{
        if $crate::enabled($crate::Verbosity::Warn) {
            $crate::logger().warn(&format!($($arg)+))
        } else {
            Ok(())
        }
    }};
}
