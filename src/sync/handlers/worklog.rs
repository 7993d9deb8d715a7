//! Worklog relay
//!
//! Works like the comment relay, with the provenance marker carried in the
//! worklog's comment and the logged time forwarded as reported.

use crate::sync::engine::SyncContext;
use crate::sync::event::SyncEvent;
use crate::sync::{provenance, SyncOutcome};
use crate::tracker::{NewWorklog, WorklogDuration};
use crate::Result;
use tracing::{debug, error, info, warn};

/// Handle `worklog_*` events
pub async fn relay_worklog(ctx: &SyncContext<'_>, event: &SyncEvent) -> SyncOutcome {
    let worklog = event.payload.worklog.clone().unwrap_or_default();
    let comment = worklog.comment.clone().unwrap_or_default();

    if provenance::is_echo(&comment, ctx.direction) {
        debug!(direction = %ctx.direction, issue = ?event.issue_key(), "Dropping echoed worklog");
        return SyncOutcome::ignored();
    }

    let new_worklog = NewWorklog {
        comment: provenance::tag(&comment, ctx.direction),
        duration: worklog.duration(),
    };

    match post_worklog(ctx, event.issue_key(), &new_worklog).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                direction = %ctx.direction,
                issue = ?event.issue_key(),
                kind = super::failure_kind(&e),
                error = %e,
                "Failed to relay worklog"
            );
            SyncOutcome::failed(&e)
        }
    }
}

async fn post_worklog(
    ctx: &SyncContext<'_>,
    issue_key: Option<&str>,
    worklog: &NewWorklog,
) -> Result<SyncOutcome> {
    let Some(dest_key) = ctx.dest_issue(issue_key)? else {
        debug!(direction = %ctx.direction, issue = ?issue_key, "Worklog on unmapped issue");
        return Ok(SyncOutcome::no_mapping());
    };

    let response = ctx.dest.add_worklog(&dest_key, worklog).await?;

    let spent = match &worklog.duration {
        WorklogDuration::Seconds(secs) => format!("{}s", secs),
        WorklogDuration::Text(text) => text.clone(),
    };
    if response.is_success() {
        info!(direction = %ctx.direction, dest = %dest_key, spent = %spent, "Relayed worklog");
    } else {
        warn!(
            direction = %ctx.direction,
            dest = %dest_key,
            status = response.status,
            body = %response.body,
            "Destination refused worklog"
        );
    }
    Ok(SyncOutcome::ok(response.status))
}
