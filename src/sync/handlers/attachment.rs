//! Attachment copy
//!
//! Downloads a newly created attachment from the source tracker and uploads
//! it to the counterpart issue. Each (source tracker, attachment id) is copied
//! at most once; the mapping store remembers where it went. A copy reported
//! back by the tracker it was uploaded to is recognized from the same rows.

use crate::store::AttachmentMapping;
use crate::sync::engine::SyncContext;
use crate::sync::event::{parse_uploaded_attachment_id, AttachmentRef, SyncEvent};
use crate::sync::SyncOutcome;
use crate::tracker::AttachmentUpload;
use crate::Result;
use serde_json::Value;
use tracing::{debug, error, info};

/// Handle `attachment_created`
pub async fn copy_attachment(ctx: &SyncContext<'_>, event: &SyncEvent) -> SyncOutcome {
    let attachment = match AttachmentRef::from_payload(&event.payload) {
        Ok(attachment) => attachment,
        Err(missing) => {
            debug!(direction = %ctx.direction, reason = missing.reason(), "Nothing to copy");
            return SyncOutcome::ignored().with_reason(missing.reason());
        }
    };

    match copy(ctx, event.issue_key(), &attachment).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                direction = %ctx.direction,
                attachment = %attachment.id,
                kind = super::failure_kind(&e),
                error = %e,
                "Failed to copy attachment"
            );
            SyncOutcome::failed(&e)
        }
    }
}

async fn copy(
    ctx: &SyncContext<'_>,
    issue_key: Option<&str>,
    attachment: &AttachmentRef,
) -> Result<SyncOutcome> {
    let source_url = ctx.source.endpoint().base_url();

    if let Some(target) = ctx.store.lookup_attachment_mapping(source_url, &attachment.id)? {
        debug!(
            direction = %ctx.direction,
            attachment = %attachment.id,
            dest_issue = %target.dest_issue_key,
            dest_attachment = %target.dest_attachment_id,
            "Attachment already copied"
        );
        return Ok(SyncOutcome::ignored().with_reason("already_mapped"));
    }

    if let Some(origin) = ctx.store.lookup_attachment_copy(source_url, &attachment.id)? {
        debug!(
            direction = %ctx.direction,
            attachment = %attachment.id,
            origin = %origin.source_url,
            origin_attachment = %origin.source_attachment_id,
            "Attachment is a copy made by the bridge"
        );
        return Ok(SyncOutcome::ignored().with_reason("already_mapped"));
    }

    let Some(dest_key) = ctx.dest_issue(issue_key)? else {
        debug!(direction = %ctx.direction, issue = ?issue_key, "Attachment on unmapped issue");
        return Ok(SyncOutcome::no_mapping());
    };

    let bytes = match ctx.source.download_attachment(&attachment.content_url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(
                direction = %ctx.direction,
                url = %attachment.content_url,
                error = %e,
                "Attachment download failed"
            );
            return Ok(SyncOutcome::failed(&e).with_reason("download_failed"));
        }
    };

    let size = bytes.len();
    let upload = AttachmentUpload {
        filename: attachment.filename.clone(),
        bytes,
    };
    let response = ctx.dest.upload_attachment(&dest_key, upload).await?;

    if !response.is_created() {
        error!(
            direction = %ctx.direction,
            dest = %dest_key,
            status = response.status,
            body = %response.body,
            "Destination rejected attachment"
        );
        return Ok(SyncOutcome::rejected(response.status, response.body));
    }

    let dest_attachment_id = parse_uploaded_attachment_id(&response.json().unwrap_or(Value::Null));

    let mapping = AttachmentMapping {
        source_url: source_url.to_string(),
        source_issue_key: issue_key.unwrap_or_default().to_string(),
        source_attachment_id: attachment.id.clone(),
        dest_url: ctx.dest.endpoint().base_url().to_string(),
        dest_issue_key: dest_key.clone(),
        dest_attachment_id: dest_attachment_id.clone(),
    };
    if let Err(e) = ctx.store.upsert_attachment_mapping(&mapping) {
        // Uploaded but unrecorded; a redelivery would copy it again
        error!(
            direction = %ctx.direction,
            source_attachment = %mapping.source_attachment_id,
            dest_issue = %mapping.dest_issue_key,
            error = %e,
            "Attachment uploaded but mapping not stored"
        );
    }

    info!(
        direction = %ctx.direction,
        file = %attachment.filename,
        bytes = size,
        dest = %dest_key,
        dest_attachment = %dest_attachment_id,
        "Copied attachment"
    );
    Ok(SyncOutcome::uploaded(response.status, dest_attachment_id))
}
