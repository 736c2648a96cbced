//! Logger that forwards every event as a `@nix` JSON line.

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::error_info::{ErrorInfo, Pos, render_error_info};
use crate::logger::Logger;
use crate::protocol::MARKER;
use crate::types::{ActivityId, ActivityType, Field, ResultType};
use crate::verbosity::Verbosity;

/// One protocol message as written to the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum LogRecord<'a> {
    Msg {
        level: Verbosity,
        msg: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_msg: Option<&'a str>,
        #[serde(flatten)]
        pos: PosRecord<'a>,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace: Option<Vec<TraceFrame<'a>>>,
    },
    Start {
        id: ActivityId,
        level: Verbosity,
        #[serde(rename = "type")]
        typ: ActivityType,
        text: &'a str,
        parent: ActivityId,
        #[serde(skip_serializing_if = "<[Field]>::is_empty")]
        fields: &'a [Field],
    },
    Stop {
        id: ActivityId,
    },
    Result {
        id: ActivityId,
        #[serde(rename = "type")]
        typ: ResultType,
        #[serde(skip_serializing_if = "<[Field]>::is_empty")]
        fields: &'a [Field],
    },
}

/// Source position, flattened into the enclosing object when present.
#[derive(Debug, Default, Serialize)]
pub struct PosRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
}

impl<'a> From<Option<&'a Pos>> for PosRecord<'a> {
    fn from(pos: Option<&'a Pos>) -> Self {
        match pos {
            Some(pos) => Self {
                line: Some(pos.line),
                column: Some(pos.column),
                file: Some(&pos.file),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TraceFrame<'a> {
    raw_msg: &'a str,
    #[serde(flatten)]
    pos: PosRecord<'a>,
}

impl LogRecord<'_> {
    /// Serialize as a single protocol line, without the trailing newline.
    pub fn to_line(&self) -> Result<String> {
        Ok(format!("{MARKER}{}", serde_json::to_string(self)?))
    }
}

/// Re-expresses every logger call as a protocol line written through
/// `prev`, the logger that owns the actual output stream.
///
/// Never filters: deciding what to show is the reading side's job.
pub struct JsonLogger {
    prev: Arc<dyn Logger>,
    show_trace: bool,
}

impl JsonLogger {
    pub fn new(prev: Arc<dyn Logger>, show_trace: bool) -> Self {
        Self { prev, show_trace }
    }

    fn write(&self, record: &LogRecord<'_>) -> Result<()> {
        self.prev.log(Verbosity::Error, &record.to_line()?)
    }
}

impl Logger for JsonLogger {
    fn log(&self, level: Verbosity, msg: &str) -> Result<()> {
        self.write(&LogRecord::Msg {
            level,
            msg,
            raw_msg: None,
            pos: PosRecord::default(),
            trace: None,
        })
    }

    fn log_error_info(&self, info: &ErrorInfo) -> Result<()> {
        let rendered = render_error_info(info, self.show_trace);
        let trace = (self.show_trace && !info.traces.is_empty()).then(|| {
            info.stack()
                .map(|frame| TraceFrame {
                    raw_msg: &frame.hint,
                    pos: frame.pos.as_ref().into(),
                })
                .collect()
        });

        self.write(&LogRecord::Msg {
            level: info.level,
            msg: &rendered,
            raw_msg: Some(&info.msg),
            pos: info.pos.as_ref().into(),
            trace,
        })
    }

    fn start_activity(
        &self,
        id: ActivityId,
        level: Verbosity,
        typ: ActivityType,
        text: &str,
        fields: &[Field],
        parent: ActivityId,
    ) -> Result<()> {
        self.write(&LogRecord::Start {
            id,
            level,
            typ,
            text,
            parent,
            fields,
        })
    }

    fn stop_activity(&self, id: ActivityId) -> Result<()> {
        self.write(&LogRecord::Stop { id })
    }

    fn result(&self, id: ActivityId, typ: ResultType, fields: &[Field]) -> Result<()> {
        self.write(&LogRecord::Result { id, typ, fields })
    }

    fn is_verbose(&self) -> bool {
        true
    }
}
