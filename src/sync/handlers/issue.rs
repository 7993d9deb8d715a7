//! Issue replication
//!
//! A newly created issue gets one replica on the other tracker, recorded in
//! the mapping store. Creation is serialized per source key and the mapping
//! is checked under the lock, so concurrent or redelivered notifications for
//! the same issue never produce a second replica.

use crate::sync::engine::SyncContext;
use crate::sync::event::SyncEvent;
use crate::sync::{provenance, SyncOutcome};
use crate::tracker::NewIssue;
use crate::Result;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Handle `jira:issue_created`
pub async fn replicate_issue(ctx: &SyncContext<'_>, event: &SyncEvent) -> SyncOutcome {
    let Some(issue_key) = event.issue_key() else {
        warn!(direction = %ctx.direction, "Issue event without an issue key");
        return SyncOutcome::ignored().with_reason("no-issue-key");
    };

    let _guard = ctx
        .issue_locks
        .lock(&format!("{}:{}", ctx.direction.as_str(), issue_key))
        .await;

    match create_replica(ctx, event, issue_key).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                direction = %ctx.direction,
                issue = %issue_key,
                kind = super::failure_kind(&e),
                error = %e,
                "Failed to replicate issue"
            );
            SyncOutcome::failed(&e)
        }
    }
}

async fn create_replica(
    ctx: &SyncContext<'_>,
    event: &SyncEvent,
    issue_key: &str,
) -> Result<SyncOutcome> {
    if let Some(dest_key) = ctx.store.lookup_dest_issue(issue_key, ctx.direction)? {
        debug!(direction = %ctx.direction, issue = %issue_key, dest = %dest_key, "Issue already mapped");
        return Ok(SyncOutcome::already_mapped(dest_key));
    }

    let fields = event.issue_fields();
    let summary = fields.and_then(|f| f.summary.clone()).unwrap_or_default();
    let description = fields
        .and_then(|f| f.description.as_deref())
        .unwrap_or_default();

    let dest = ctx.dest.endpoint();
    let new_issue = NewIssue {
        project_key: dest.project_key.clone(),
        summary,
        description: provenance::relayed_description(description, ctx.direction),
        issue_type: dest.issue_type.clone(),
    };

    let response = ctx.dest.create_issue(&new_issue).await?;
    if !response.is_created() {
        error!(
            direction = %ctx.direction,
            issue = %issue_key,
            status = response.status,
            body = %response.body,
            "Destination rejected issue creation"
        );
        return Ok(SyncOutcome::rejected(response.status, response.body));
    }

    let new_key = response
        .json()
        .ok()
        .and_then(|v| v.get("key").and_then(Value::as_str).map(str::to_string));
    let Some(new_key) = new_key else {
        error!(direction = %ctx.direction, issue = %issue_key, body = %response.body, "Creation response has no issue key");
        return Ok(SyncOutcome::rejected(response.status, response.body).with_reason("no-key-in-response"));
    };

    let (key_a, key_b) = ctx.direction.orient(issue_key, &new_key);
    if let Err(e) = ctx.store.upsert_issue_mapping(key_a, key_b) {
        // The replica exists; only the link is missing
        error!(
            direction = %ctx.direction,
            key_a = %key_a,
            key_b = %key_b,
            error = %e,
            "Issue replicated but mapping not stored, needs manual link"
        );
    }

    info!(direction = %ctx.direction, issue = %issue_key, dest = %new_key, "Created issue");
    Ok(SyncOutcome::created(new_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::{break_store, engine_with_fakes, Call};
    use crate::sync::{Direction, SyncStatus};
    use crate::tracker::RemoteResponse;
    use serde_json::json;
    use std::sync::Arc;

    fn issue_created(key: &str, summary: &str, description: &str) -> SyncEvent {
        SyncEvent::from_json(json!({
            "webhookEvent": "jira:issue_created",
            "issue": {"key": key, "fields": {"summary": summary, "description": description}}
        }))
    }

    #[tokio::test]
    async fn test_creates_replica_and_mapping() {
        let (engine, fakes, _temp) = engine_with_fakes();

        let outcome = engine
            .dispatch(&issue_created("TEST-1", "Bug", "desc"), Direction::AToB)
            .await;
        assert_eq!(outcome, SyncOutcome::created("OPS-1"));

        assert_eq!(
            fakes.b.calls(),
            vec![Call::CreateIssue(NewIssue {
                project_key: "OPS".to_string(),
                summary: "Bug".to_string(),
                description: "desc\n\n(Synced from A)".to_string(),
                issue_type: "Task".to_string(),
            })]
        );
        assert_eq!(
            engine.store().lookup_dest_issue("TEST-1", Direction::AToB).unwrap(),
            Some("OPS-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_second_delivery_is_already_mapped() {
        let (engine, fakes, _temp) = engine_with_fakes();
        let event = issue_created("TEST-1", "Bug", "desc");

        let first = engine.dispatch(&event, Direction::AToB).await;
        let second = engine.dispatch(&event, Direction::AToB).await;

        assert_eq!(first.status, SyncStatus::Created);
        assert_eq!(second, SyncOutcome::already_mapped(first.dest_key.clone().unwrap()));
        assert_eq!(fakes.b.calls().len(), 1);
        assert_eq!(engine.store().stats().unwrap().issue_mappings, 1);
    }

    #[tokio::test]
    async fn test_b_to_a_mapping_orientation() {
        let (engine, _fakes, _temp) = engine_with_fakes();

        let outcome = engine
            .dispatch(&issue_created("OPS-5", "Ops bug", ""), Direction::BToA)
            .await;
        assert_eq!(outcome, SyncOutcome::created("TEST-1"));

        let mappings = engine.store().list_issue_mappings().unwrap();
        assert_eq!(mappings[0].key_a, "TEST-1");
        assert_eq!(mappings[0].key_b, "OPS-5");
    }

    #[tokio::test]
    async fn test_concurrent_deliveries_create_once() {
        let (engine, fakes, _temp) = engine_with_fakes();
        let engine = Arc::new(engine);

        let mut handles = Vec::new();
        for _ in 0..5 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .dispatch(&issue_created("TEST-1", "Bug", "desc"), Direction::AToB)
                    .await
            }));
        }

        let mut created = 0;
        for handle in handles {
            let outcome = handle.await.unwrap();
            if outcome.status == SyncStatus::Created {
                created += 1;
            } else {
                assert_eq!(outcome.status, SyncStatus::AlreadyMapped);
            }
        }

        assert_eq!(created, 1);
        assert_eq!(fakes.b.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_writes_no_mapping() {
        let (engine, fakes, _temp) = engine_with_fakes();
        fakes
            .b
            .respond_to_create(RemoteResponse::new(400, r#"{"errors":{"issuetype":"invalid"}}"#));

        let outcome = engine
            .dispatch(&issue_created("TEST-1", "Bug", "desc"), Direction::AToB)
            .await;

        assert_eq!(outcome.status, SyncStatus::Error);
        assert_eq!(outcome.code, Some(400));
        assert!(outcome.text.unwrap().contains("issuetype"));
        assert_eq!(engine.store().stats().unwrap().issue_mappings, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_error() {
        let (engine, fakes, _temp) = engine_with_fakes();
        fakes.b.go_offline();

        let outcome = engine
            .dispatch(&issue_created("TEST-1", "Bug", "desc"), Direction::AToB)
            .await;

        assert_eq!(outcome.status, SyncStatus::Error);
        assert!(outcome.exception.unwrap().contains("connection refused"));
        assert_eq!(engine.store().stats().unwrap().issue_mappings, 0);
    }

    #[tokio::test]
    async fn test_response_without_key() {
        let (engine, fakes, _temp) = engine_with_fakes();
        fakes.b.respond_to_create(RemoteResponse::new(201, "{}"));

        let outcome = engine
            .dispatch(&issue_created("TEST-1", "Bug", "desc"), Direction::AToB)
            .await;

        assert_eq!(outcome.status, SyncStatus::Error);
        assert_eq!(outcome.reason.as_deref(), Some("no-key-in-response"));
    }

    #[tokio::test]
    async fn test_note_alone_does_not_block_replication() {
        let (engine, fakes, _temp) = engine_with_fakes();

        let outcome = engine
            .dispatch(
                &issue_created("OPS-42", "Bug", "desc\n\n(Synced from A)"),
                Direction::BToA,
            )
            .await;

        assert_eq!(outcome, SyncOutcome::created("TEST-1"));
        assert_eq!(fakes.a.calls().len(), 1);
        assert_eq!(
            engine.store().lookup_dest_issue("OPS-42", Direction::BToA).unwrap(),
            Some("TEST-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_store_failure_makes_no_call() {
        let (engine, fakes, _temp) = engine_with_fakes();
        break_store(engine.store().path());

        let outcome = engine
            .dispatch(&issue_created("TEST-1", "Bug", "desc"), Direction::AToB)
            .await;

        assert_eq!(outcome.status, SyncStatus::Error);
        assert!(outcome.exception.is_some());
        assert_eq!(outcome.code, None);
        assert!(fakes.b.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unstored_mapping_still_reports_created() {
        let (engine, fakes, _temp) = engine_with_fakes();
        fakes.b.break_store_after_write(engine.store().path());

        let outcome = engine
            .dispatch(&issue_created("TEST-1", "Bug", "desc"), Direction::AToB)
            .await;

        assert_eq!(outcome, SyncOutcome::created("OPS-1"));
        assert_eq!(fakes.b.calls().len(), 1);
        assert!(engine.store().stats().is_err());
    }

    #[tokio::test]
    async fn test_missing_key_is_ignored() {
        let (engine, fakes, _temp) = engine_with_fakes();
        let event = SyncEvent::from_json(json!({"webhookEvent": "jira:issue_created"}));

        let outcome = engine.dispatch(&event, Direction::AToB).await;
        assert_eq!(outcome.status, SyncStatus::Ignored);
        assert!(fakes.b.calls().is_empty());
    }
}
