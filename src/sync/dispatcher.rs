//! Event routing
//!
//! Picks the handler for an event kind. Routing never touches state; the
//! handler's outcome is returned unchanged.

use super::engine::SyncEngine;
use super::event::{EventKind, SyncEvent};
use super::handlers;
use super::{Direction, SyncOutcome};
use tracing::debug;

/// Handler selected for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Attachment,
    Comment,
    Worklog,
    IssueCreated,
    Ignore,
}

/// Route an event kind.
///
/// Attachment events are checked first, then comments, worklogs and issue
/// creation. Only attachment creation is handled; edits of comments and
/// worklogs are relayed like new ones.
pub fn route(kind: &EventKind) -> Route {
    match kind {
        EventKind::AttachmentCreated => Route::Attachment,
        EventKind::AttachmentOther(_) => Route::Ignore,
        k if k.is_comment() => Route::Comment,
        k if k.is_worklog() => Route::Worklog,
        EventKind::IssueCreated => Route::IssueCreated,
        _ => Route::Ignore,
    }
}

impl SyncEngine {
    /// Process one inbound event travelling in `direction`
    pub async fn dispatch(&self, event: &SyncEvent, direction: Direction) -> SyncOutcome {
        let ctx = self.context(direction);

        match route(&event.kind) {
            Route::Attachment => handlers::attachment::copy_attachment(&ctx, event).await,
            Route::Comment => handlers::comment::relay_comment(&ctx, event).await,
            Route::Worklog => handlers::worklog::relay_worklog(&ctx, event).await,
            Route::IssueCreated => handlers::issue::replicate_issue(&ctx, event).await,
            Route::Ignore => {
                debug!(direction = %direction, event = %event.event_name(), "Ignoring event");
                SyncOutcome::ignored()
            }
        }
    }
}
