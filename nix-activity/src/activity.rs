//! Activity guard that tracks an activity's lifecycle.

use std::sync::Arc;

use tracing::{Level, Span, span};

use crate::context::{PushActivity, current_activity};
use crate::error::Result;
use crate::logger::{Logger, logger};
use crate::types::{ActivityId, ActivityType, Field, Fields, ResultType, next_activity_id};
use crate::verbosity::Verbosity;

/// A running unit of work.
///
/// Construction is the only way to start an activity and dropping the handle
/// is the only way to stop it, so every `start_activity` is matched by exactly
/// one `stop_activity`, also when the owner unwinds.
#[must_use = "Activity will stop immediately if dropped"]
pub struct Activity {
    id: ActivityId,
    logger: Arc<dyn Logger>,
    span: Span,
}

impl Activity {
    /// Start an activity against `logger` with an explicit parent.
    pub fn new(
        logger: Arc<dyn Logger>,
        level: Verbosity,
        typ: ActivityType,
        text: impl Into<String>,
        fields: Fields,
        parent: ActivityId,
    ) -> Result<Self> {
        let id = next_activity_id();
        let text = text.into();
        logger.start_activity(id, level, typ, &text, &fields, parent)?;

        let span = span!(Level::TRACE, "activity", activity_id = id, parent_id = parent, ?typ);
        Ok(Self { id, logger, span })
    }

    /// Create a builder for an activity of the given type
    pub fn builder(typ: ActivityType) -> ActivityBuilder {
        ActivityBuilder::new(typ)
    }

    /// Get the activity ID
    pub fn id(&self) -> ActivityId {
        self.id
    }

    /// The logger this activity reports to.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Get a cloned span for this activity.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    /// Make this the current activity until the returned guard is dropped.
    pub fn push(&self) -> PushActivity {
        PushActivity::new(self.id)
    }

    pub fn result(&self, typ: ResultType, fields: Fields) -> Result<()> {
        self.logger.result(self.id, typ, &fields)
    }

    pub fn progress(&self, done: u64, expected: u64, running: u64, failed: u64) -> Result<()> {
        self.result(
            ResultType::Progress,
            vec![
                Field::Int(done),
                Field::Int(expected),
                Field::Int(running),
                Field::Int(failed),
            ],
        )
    }

    /// Announce how many units of `typ` this activity expects to process.
    pub fn set_expected(&self, typ: ActivityType, expected: u64) -> Result<()> {
        self.result(ResultType::SetExpected, vec![typ.into(), Field::Int(expected)])
    }

    pub fn set_phase(&self, phase: impl Into<String>) -> Result<()> {
        self.result(ResultType::SetPhase, vec![Field::String(phase.into())])
    }
}

impl std::fmt::Debug for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Activity").field("id", &self.id).finish()
    }
}

impl Drop for Activity {
    fn drop(&mut self) {
        if let Err(e) = self.logger.stop_activity(self.id) {
            tracing::debug!(activity_id = self.id, "ignoring error while stopping activity: {e}");
        }
    }
}

/// Builder for activities
pub struct ActivityBuilder {
    typ: ActivityType,
    level: Verbosity,
    text: String,
    fields: Fields,
    parent: Option<ActivityId>,
    logger: Option<Arc<dyn Logger>>,
}

impl ActivityBuilder {
    pub(crate) fn new(typ: ActivityType) -> Self {
        Self {
            typ,
            level: Verbosity::Info,
            text: String::new(),
            fields: Vec::new(),
            parent: None,
            logger: None,
        }
    }

    pub fn level(mut self, level: Verbosity) -> Self {
        self.level = level;
        self
    }

    /// Descriptive text. Activities without text are not printed by
    /// human-facing loggers.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    /// Explicit parent. Defaults to the current activity of this context.
    pub fn parent(mut self, parent: ActivityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Report to `logger` instead of the active one.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn start(self) -> Result<Activity> {
        let parent = self.parent.unwrap_or_else(current_activity);
        let logger = self.logger.unwrap_or_else(logger);
        Activity::new(logger, self.level, self.typ, self.text, self.fields, parent)
    }
}
