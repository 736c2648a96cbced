//! Decoding side of the `@nix` protocol, for output read from another process.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::activity::Activity;
use crate::error::Result;
use crate::logger::{Logger, logger};
use crate::protocol::{InternalLog, decode_fields, strip_marker};
use crate::types::{ActivityId, ActivityType, Field, ResultType};

/// Replays protocol lines from one channel as local activities.
///
/// Remote activities become children of the activity the receiver was
/// created under. The registry is owned by whoever drains the channel, so a
/// receiver is neither `Sync` nor shared between readers. Activities still
/// registered when the receiver is dropped are stopped.
pub struct JsonLogReceiver {
    parent: ActivityId,
    /// Logger of the enclosing activity, which receives phase changes.
    parent_logger: Arc<dyn Logger>,
    /// Pinned target for replayed traffic. `None` follows the active logger.
    target: Option<Arc<dyn Logger>>,
    activities: HashMap<ActivityId, Activity>,
}

impl JsonLogReceiver {
    /// Receive under `parent`.
    ///
    /// Replayed activities, messages and warnings go to whichever logger is
    /// active when each line arrives. Phase changes are reported through
    /// `parent` itself.
    pub fn new(parent: &Activity) -> Self {
        Self {
            parent: parent.id(),
            parent_logger: Arc::clone(parent.logger()),
            target: None,
            activities: HashMap::new(),
        }
    }

    /// Receive under the activity `parent`, sending everything to `logger`.
    pub fn with_logger(parent: ActivityId, logger: Arc<dyn Logger>) -> Self {
        Self {
            parent,
            parent_logger: Arc::clone(&logger),
            target: Some(logger),
            activities: HashMap::new(),
        }
    }

    fn target(&self) -> Arc<dyn Logger> {
        self.target.clone().unwrap_or_else(logger)
    }

    fn warn(&self, msg: &str) {
        if let Err(e) = self.target().warn(msg) {
            tracing::trace!("ignoring failed decode warning: {e}");
        }
    }

    /// Handle one line of output.
    ///
    /// Returns `Ok(false)` when the line is not a protocol message or could
    /// not be decoded; the caller should then treat it as plain text. Decode
    /// failures are reported as a warning naming `source`. Only a field of an
    /// unsupported JSON type is returned as an error.
    ///
    /// On an untrusted channel only file transfers may be started.
    pub fn handle_line(&mut self, line: &str, source: &str, trusted: bool) -> Result<bool> {
        let Some(payload) = strip_marker(line) else {
            return Ok(false);
        };

        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                self.warn(&format!("bad JSON log message from {source}: {e}"));
                return Ok(false);
            }
        };

        let msg: InternalLog = match serde_json::from_value(value) {
            Ok(msg) => msg,
            Err(e) => {
                self.warn(&format!("unable to handle a JSON message from {source}: {e}"));
                return Ok(false);
            }
        };

        self.handle_message(msg, trusted)
    }

    /// Apply an already decoded message.
    pub fn handle_message(&mut self, msg: InternalLog, trusted: bool) -> Result<bool> {
        match msg {
            InternalLog::Start {
                id,
                level,
                typ,
                text,
                fields,
                ..
            } => {
                if !(trusted || typ == ActivityType::FileTransfer) {
                    tracing::trace!(remote_id = id, ?typ, "dropping start from untrusted channel");
                    return Ok(true);
                }
                if self.activities.contains_key(&id) {
                    tracing::trace!(remote_id = id, "ignoring duplicate start");
                    return Ok(true);
                }
                let fields = decode_fields(fields)?;
                let activity =
                    Activity::new(self.target(), level, typ, text, fields, self.parent)?;
                self.activities.insert(id, activity);
            }
            InternalLog::Stop { id } => {
                self.activities.remove(&id);
            }
            InternalLog::Result { id, typ, fields } => {
                if let Some(activity) = self.activities.get(&id) {
                    activity.result(typ, decode_fields(fields)?)?;
                }
            }
            InternalLog::SetPhase { phase } => {
                self.parent_logger
                    .result(self.parent, ResultType::SetPhase, &[Field::String(phase)])?;
            }
            InternalLog::Msg { level, msg, .. } => {
                self.target().log(level, &msg)?;
            }
            InternalLog::Unknown => {}
        }
        Ok(true)
    }

    /// Number of remote activities currently running.
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Whether the remote activity `id` is registered.
    pub fn contains(&self, id: ActivityId) -> bool {
        self.activities.contains_key(&id)
    }

    /// Local activity standing in for the remote activity `id`.
    pub fn local_id(&self, id: ActivityId) -> Option<ActivityId> {
        self.activities.get(&id).map(Activity::id)
    }
}
