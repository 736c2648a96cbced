//! A logger that records every call, for asserting on activity traffic.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::error_info::ErrorInfo;
use crate::logger::Logger;
use crate::types::{ActivityId, ActivityType, Field, Fields, ResultType};
use crate::verbosity::Verbosity;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Log {
        level: Verbosity,
        msg: String,
    },
    ErrorInfo(ErrorInfo),
    Start {
        id: ActivityId,
        level: Verbosity,
        typ: ActivityType,
        text: String,
        fields: Fields,
        parent: ActivityId,
    },
    Stop {
        id: ActivityId,
    },
    Result {
        id: ActivityId,
        typ: ResultType,
        fields: Fields,
    },
}

/// Records calls without filtering on verbosity.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    calls: Mutex<Vec<Call>>,
    fail_stop: bool,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A recorder whose `stop_activity` records the call, then fails.
    pub fn failing_stop() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            fail_stop: true,
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages logged at `level`.
    pub fn messages(&self, level: Verbosity) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Log { level: l, msg } if l == level => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// Parent recorded when `id` was started.
    pub fn parent_of(&self, id: ActivityId) -> Option<ActivityId> {
        self.calls().into_iter().find_map(|call| match call {
            Call::Start { id: i, parent, .. } if i == id => Some(parent),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Verbosity, msg: &str) -> Result<()> {
        self.record(Call::Log {
            level,
            msg: msg.to_string(),
        });
        Ok(())
    }

    fn log_error_info(&self, info: &ErrorInfo) -> Result<()> {
        self.record(Call::ErrorInfo(info.clone()));
        Ok(())
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
        self.record(Call::Start {
            id,
            level,
            typ,
            text: text.to_string(),
            fields: fields.to_vec(),
            parent,
        });
        Ok(())
    }

    fn stop_activity(&self, id: ActivityId) -> Result<()> {
        self.record(Call::Stop { id });
        if self.fail_stop {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "sink closed",
            )));
        }
        Ok(())
    }

    fn result(&self, id: ActivityId, typ: ResultType, fields: &[Field]) -> Result<()> {
        self.record(Call::Result {
            id,
            typ,
            fields: fields.to_vec(),
        });
        Ok(())
    }

    fn is_verbose(&self) -> bool {
        true
    }
}
