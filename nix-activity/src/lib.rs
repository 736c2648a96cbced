//! Structured activity logging for Nix-style build tools.
//!
//! Work is reported as nested *activities* with a start, typed intermediate
//! results and a stop. All traffic goes through one process-wide [`Logger`]:
//! - [`SimpleLogger`] renders plain text for humans;
//! - [`JsonLogger`] re-expresses every call as an `@nix` JSON line so a parent
//!   process can follow along;
//! - [`JsonLogReceiver`] is that parent side, replaying lines from a child as
//!   local activities.
//!
//! ## Usage
//!
//! ```ignore
//! use nix_activity::{Activity, ActivityType, ResultType};
//!
//! let build = Activity::builder(ActivityType::Build)
//!     .text("building '/nix/store/...-hello.drv'")
//!     .start()?;
//! build.set_phase("unpackPhase")?;
//! build.result(ResultType::BuildLogLine, vec!["unpacking source".into()])?;
//! // `stop` is reported when `build` goes out of scope
//! ```

mod activity;
mod context;
mod error;
mod error_info;
mod json;
mod logger;
mod protocol;
mod receiver;
mod settings;
mod simple;
mod types;
mod verbosity;

pub mod testing;

pub use activity::{Activity, ActivityBuilder};
pub use context::{
    ActivityInstrument, PushActivity, current_activity, set_current_activity, with_activity_scope,
};
pub use error::{Error, Result};
pub use error_info::{
    ANSI_BLUE, ANSI_GREEN, ANSI_NORMAL, ANSI_RED, ANSI_WARNING, ANSI_YELLOW, ErrorInfo, Pos,
    Trace, render_error_info,
};
pub use json::{JsonLogger, LogRecord};
pub use logger::{Logger, logger, set_logger, warn};
pub use protocol::{InternalLog, MARKER, decode_fields, strip_marker};
pub use receiver::JsonLogReceiver;
pub use settings::{LoggerOptions, LoggerSettings, in_systemd};
pub use simple::SimpleLogger;
pub use types::{ActivityId, ActivityType, Field, Fields, ResultType, next_activity_id};
pub use verbosity::{Verbosity, enabled, set_verbosity, verbosity};
