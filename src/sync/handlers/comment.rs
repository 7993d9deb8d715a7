//! Comment relay

use crate::sync::engine::SyncContext;
use crate::sync::event::SyncEvent;
use crate::sync::{provenance, SyncOutcome};
use crate::Result;
use tracing::{debug, error, info, warn};

/// Handle `comment_*` events
pub async fn relay_comment(ctx: &SyncContext<'_>, event: &SyncEvent) -> SyncOutcome {
    let body = event.comment_body();

    if provenance::is_echo(body, ctx.direction) {
        debug!(direction = %ctx.direction, issue = ?event.issue_key(), "Dropping echoed comment");
        return SyncOutcome::ignored();
    }

    match post_comment(ctx, event.issue_key(), body).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                direction = %ctx.direction,
                issue = ?event.issue_key(),
                kind = super::failure_kind(&e),
                error = %e,
                "Failed to relay comment"
            );
            SyncOutcome::failed(&e)
        }
    }
}

async fn post_comment(
    ctx: &SyncContext<'_>,
    issue_key: Option<&str>,
    body: &str,
) -> Result<SyncOutcome> {
    let Some(dest_key) = ctx.dest_issue(issue_key)? else {
        debug!(direction = %ctx.direction, issue = ?issue_key, "Comment on unmapped issue");
        return Ok(SyncOutcome::no_mapping());
    };

    let response = ctx
        .dest
        .add_comment(&dest_key, &provenance::tag(body, ctx.direction))
        .await?;

    if response.is_success() {
        info!(direction = %ctx.direction, dest = %dest_key, status = response.status, "Relayed comment");
    } else {
        warn!(
            direction = %ctx.direction,
            dest = %dest_key,
            status = response.status,
            body = %response.body,
            "Destination refused comment"
        );
    }
    Ok(SyncOutcome::ok(response.status))
}
