//! Current-activity context used as the implicit parent of new activities.
//!
//! Each execution context has its own value:
//! - inside a tokio task-local scope (see [`ActivityInstrument`] and
//!   [`with_activity_scope`]) the value follows the task across worker threads;
//! - everywhere else it is per OS thread.
//!
//! Nothing is inherited across `tokio::spawn` or `std::thread::spawn`. Capture
//! [`current_activity`] before crossing the boundary and pass it on explicitly.

use std::cell::Cell;
use std::future::Future;

use crate::activity::Activity;
use crate::types::ActivityId;

tokio::task_local! {
    static TASK_ACTIVITY: Cell<ActivityId>;
}

thread_local! {
    static THREAD_ACTIVITY: Cell<ActivityId> = const { Cell::new(0) };
}

/// The implicit parent for activities created here. `0` means root.
pub fn current_activity() -> ActivityId {
    TASK_ACTIVITY
        .try_with(Cell::get)
        .unwrap_or_else(|_| THREAD_ACTIVITY.with(Cell::get))
}

/// Replace the current activity of this execution context, returning the old one.
pub fn set_current_activity(id: ActivityId) -> ActivityId {
    TASK_ACTIVITY
        .try_with(|current| current.replace(id))
        .unwrap_or_else(|_| THREAD_ACTIVITY.with(|current| current.replace(id)))
}

/// Run `f` in a fresh task-local scope whose current activity is `id`.
pub fn with_activity_scope<F, R>(id: ActivityId, f: F) -> R
where
    F: FnOnce() -> R,
{
    TASK_ACTIVITY.sync_scope(Cell::new(id), f)
}

/// Makes an activity current until dropped, then restores the previous one.
#[must_use = "the previous activity is restored as soon as the guard is dropped"]
pub struct PushActivity {
    previous: ActivityId,
}

impl PushActivity {
    pub fn new(id: ActivityId) -> Self {
        Self {
            previous: set_current_activity(id),
        }
    }
}

impl Drop for PushActivity {
    fn drop(&mut self) {
        set_current_activity(self.previous);
    }
}

/// Extension trait for running futures with an activity as their context.
///
/// # Example
/// ```ignore
/// use nix_activity::{Activity, ActivityInstrument, ActivityType};
///
/// let activity = Activity::builder(ActivityType::Builds).text("building").start()?;
/// async {
///     // `activity` is the parent of anything started here
///     let child = Activity::builder(ActivityType::Build).start()?;
/// }
/// .in_activity(&activity)
/// .await;
/// ```
pub trait ActivityInstrument: Future + Sized {
    /// Scope this future to `activity` and instrument it with the activity's span.
    ///
    /// Only the id and span are captured; the returned future does not borrow
    /// `activity`.
    fn in_activity(self, activity: &Activity) -> impl Future<Output = Self::Output> + use<Self> {
        TASK_ACTIVITY.scope(
            Cell::new(activity.id()),
            tracing::Instrument::instrument(self, activity.span()),
        )
    }

    /// Scope this future to an activity known only by id, e.g. one owned by
    /// another process.
    fn in_activity_id(self, id: ActivityId) -> impl Future<Output = Self::Output> + use<Self> {
        TASK_ACTIVITY.scope(Cell::new(id), self)
    }
}

impl<F: Future> ActivityInstrument for F {}
