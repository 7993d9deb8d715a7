//! Inbound webhook events
//!
//! Jira webhook bodies are decoded once, at the HTTP boundary, into a
//! [`SyncEvent`]: a closed [`EventKind`] plus the parts of the payload the
//! handlers read. Payload shapes Jira varies between versions and webhook
//! configurations (attachment object vs array, upload response list vs
//! object, duration as string vs seconds) are normalized here so handlers
//! only ever see one representation.

use crate::tracker::WorklogDuration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Jira's issue-creation webhook event name
pub const ISSUE_CREATED_EVENT: &str = "jira:issue_created";

/// Kind of webhook notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    IssueCreated,
    CommentCreated,
    CommentUpdated,
    /// Any other `comment_*` event (e.g. `comment_deleted`)
    CommentOther(String),
    WorklogCreated,
    WorklogUpdated,
    /// Any other `worklog_*` event
    WorklogOther(String),
    /// `attachment_created`, including suffixed variants
    AttachmentCreated,
    /// Any other `attachment_*` event
    AttachmentOther(String),
    /// Everything else, including `jira:issue_updated`
    Other(String),
}

impl EventKind {
    /// Classify a `webhookEvent` string
    pub fn parse(event: &str) -> Self {
        if event.starts_with("attachment_") {
            if event.starts_with("attachment_created") {
                return EventKind::AttachmentCreated;
            }
            return EventKind::AttachmentOther(event.to_string());
        }

        match event {
            "comment_created" => EventKind::CommentCreated,
            "comment_updated" => EventKind::CommentUpdated,
            e if e.starts_with("comment_") => EventKind::CommentOther(e.to_string()),
            "worklog_created" => EventKind::WorklogCreated,
            "worklog_updated" => EventKind::WorklogUpdated,
            e if e.starts_with("worklog_") => EventKind::WorklogOther(e.to_string()),
            ISSUE_CREATED_EVENT => EventKind::IssueCreated,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            EventKind::CommentCreated | EventKind::CommentUpdated | EventKind::CommentOther(_)
        )
    }

    pub fn is_worklog(&self) -> bool {
        matches!(
            self,
            EventKind::WorklogCreated | EventKind::WorklogUpdated | EventKind::WorklogOther(_)
        )
    }
}

/// Raw webhook body, as much of it as the bridge reads.
///
/// Every field decodes independently: one of an unexpected type is dropped
/// on its own instead of emptying the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "webhookEvent", default, deserialize_with = "lenient")]
    pub webhook_event: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub issue: Option<IssuePayload>,

    #[serde(default, deserialize_with = "lenient")]
    pub comment: Option<CommentPayload>,

    #[serde(default, deserialize_with = "lenient")]
    pub worklog: Option<WorklogPayload>,

    /// Single object or array depending on webhook configuration
    #[serde(default)]
    pub attachment: Option<Value>,

    #[serde(default)]
    pub attachments: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuePayload {
    #[serde(default, deserialize_with = "stringish")]
    pub key: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub fields: Option<IssueFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    #[serde(default, deserialize_with = "stringish")]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "stringish")]
    pub description: Option<String>,

    #[serde(default)]
    pub attachment: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPayload {
    #[serde(default, deserialize_with = "stringish")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorklogPayload {
    #[serde(default, deserialize_with = "stringish")]
    pub comment: Option<String>,

    #[serde(rename = "timeSpent", default)]
    pub time_spent: Option<Value>,

    #[serde(rename = "timeSpentSeconds", default)]
    pub time_spent_seconds: Option<Value>,
}

impl WorklogPayload {
    /// Duration to forward.
    ///
    /// Integer seconds are preferred; otherwise the source's duration string
    /// is passed through untouched; `0s` only when nothing was reported.
    pub fn duration(&self) -> WorklogDuration {
        let seconds = self.time_spent_seconds.as_ref();
        let spent = self.time_spent.as_ref();

        if let Some(secs) = seconds.and_then(Value::as_i64).or_else(|| spent.and_then(Value::as_i64)) {
            return WorklogDuration::Seconds(secs);
        }

        [spent, seconds]
            .into_iter()
            .flatten()
            .find_map(scalar_text)
            .map(WorklogDuration::Text)
            .unwrap_or_else(WorklogDuration::zero)
    }
}

/// Render a string or number as text; anything else is absent
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A text field that may arrive as a number, or as a structure the bridge
/// cannot relay (e.g. an Atlassian document body). The latter reads as absent
/// without failing the rest of the payload.
fn stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text))
}

/// A nested field of the wrong shape reads as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// A decoded webhook notification
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub kind: EventKind,
    pub payload: WebhookPayload,
}

impl SyncEvent {
    /// Decode a webhook body.
    ///
    /// Bodies that are not a JSON object decode as an empty payload so they
    /// are ignored rather than rejected.
    pub fn from_json(value: Value) -> Self {
        let payload = if value.is_object() {
            serde_json::from_value::<WebhookPayload>(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Malformed webhook payload, treating as empty");
                WebhookPayload::default()
            })
        } else {
            WebhookPayload::default()
        };
        Self::from_payload(payload)
    }

    /// Decode raw request bytes
    pub fn from_slice(body: &[u8]) -> Self {
        let value = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        Self::from_json(value)
    }

    pub fn from_payload(payload: WebhookPayload) -> Self {
        let kind = EventKind::parse(payload.webhook_event.as_deref().unwrap_or_default());
        Self { kind, payload }
    }

    /// The raw `webhookEvent` string, empty if absent
    pub fn event_name(&self) -> &str {
        self.payload.webhook_event.as_deref().unwrap_or_default()
    }

    pub fn issue_key(&self) -> Option<&str> {
        self.payload
            .issue
            .as_ref()
            .and_then(|i| i.key.as_deref())
            .filter(|k| !k.is_empty())
    }

    pub fn issue_fields(&self) -> Option<&IssueFields> {
        self.payload.issue.as_ref().and_then(|i| i.fields.as_ref())
    }

    /// Comment text, empty if absent
    pub fn comment_body(&self) -> &str {
        self.payload
            .comment
            .as_ref()
            .and_then(|c| c.body.as_deref())
            .unwrap_or_default()
    }
}

/// Why an attachment event carried nothing to copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingAttachment {
    NoAttachment,
    NoId,
    NoContentUrl,
}

impl MissingAttachment {
    pub fn reason(self) -> &'static str {
        match self {
            MissingAttachment::NoAttachment => "no-attachment-in-payload",
            MissingAttachment::NoId => "no-attachment-id",
            MissingAttachment::NoContentUrl => "no-content-url",
        }
    }
}

/// The attachment an `attachment_created` event refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub id: String,
    pub filename: String,
    pub content_url: String,
}

impl AttachmentRef {
    /// Find the newly created attachment in a webhook payload.
    ///
    /// Looks at `attachment`, then `attachments`, then `issue.fields.attachment`.
    /// Each may be an object or an array; for arrays the last entry is the new one.
    pub fn from_payload(payload: &WebhookPayload) -> std::result::Result<Self, MissingAttachment> {
        let issue_attachments = payload
            .issue
            .as_ref()
            .and_then(|i| i.fields.as_ref())
            .and_then(|f| f.attachment.as_ref());

        let raw = [
            payload.attachment.as_ref(),
            payload.attachments.as_ref(),
            issue_attachments,
        ]
        .into_iter()
        .flatten()
        .find_map(newest_attachment)
        .ok_or(MissingAttachment::NoAttachment)?;

        let id = raw.get("id").and_then(scalar_text).ok_or(MissingAttachment::NoId)?;

        let filename = ["filename", "name"]
            .iter()
            .filter_map(|field| raw.get(*field).and_then(Value::as_str))
            .find(|name| !name.is_empty())
            .unwrap_or("attachment")
            .to_string();

        let content_url = raw
            .get("content")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or(MissingAttachment::NoContentUrl)?
            .to_string();

        Ok(Self {
            id,
            filename,
            content_url,
        })
    }
}

fn newest_attachment(value: &Value) -> Option<&serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) if !map.is_empty() => Some(map),
        Value::Array(items) => items.last().and_then(Value::as_object),
        _ => None,
    }
}

/// Recover the new attachment id from an upload response.
///
/// Jira answers with a list of attachments, but proxies and older versions
/// have been seen to return a single object, an object wrapping an
/// `attachments` list, or a nested list. Returns an empty string when no id
/// can be found.
pub fn parse_uploaded_attachment_id(response: &Value) -> String {
    match response {
        Value::Array(items) => items
            .first()
            .map(parse_uploaded_attachment_id)
            .unwrap_or_default(),
        Value::Object(map) => map
            .get("id")
            .and_then(scalar_text)
            .or_else(|| {
                map.get("attachments")
                    .map(parse_uploaded_attachment_id)
                    .filter(|id| !id.is_empty())
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kind_parse() {
        assert_eq!(EventKind::parse("jira:issue_created"), EventKind::IssueCreated);
        assert_eq!(EventKind::parse("comment_created"), EventKind::CommentCreated);
        assert_eq!(EventKind::parse("comment_updated"), EventKind::CommentUpdated);
        assert_eq!(
            EventKind::parse("comment_deleted"),
            EventKind::CommentOther("comment_deleted".to_string())
        );
        assert_eq!(EventKind::parse("worklog_created"), EventKind::WorklogCreated);
        assert_eq!(EventKind::parse("worklog_updated"), EventKind::WorklogUpdated);
        assert_eq!(EventKind::parse("attachment_created"), EventKind::AttachmentCreated);
        assert_eq!(EventKind::parse("attachment_created_v2"), EventKind::AttachmentCreated);
        assert_eq!(
            EventKind::parse("attachment_deleted"),
            EventKind::AttachmentOther("attachment_deleted".to_string())
        );
        assert_eq!(
            EventKind::parse("jira:issue_updated"),
            EventKind::Other("jira:issue_updated".to_string())
        );
        assert_eq!(EventKind::parse(""), EventKind::Other(String::new()));
    }

    #[test]
    fn test_decode_issue_created() {
        let event = SyncEvent::from_json(json!({
            "webhookEvent": "jira:issue_created",
            "issue": {"key": "TEST-1", "fields": {"summary": "Bug", "description": "desc"}}
        }));
        assert_eq!(event.kind, EventKind::IssueCreated);
        assert_eq!(event.issue_key(), Some("TEST-1"));
        let fields = event.issue_fields().unwrap();
        assert_eq!(fields.summary.as_deref(), Some("Bug"));
        assert_eq!(fields.description.as_deref(), Some("desc"));
    }

    #[test]
    fn test_decode_null_fields() {
        let event = SyncEvent::from_json(json!({
            "webhookEvent": "comment_created",
            "issue": {"key": "TEST-1", "fields": null},
            "comment": {"body": null}
        }));
        assert_eq!(event.comment_body(), "");
        assert!(event.issue_fields().is_none());
    }

    #[test]
    fn test_decode_garbage_is_empty() {
        let event = SyncEvent::from_slice(b"not json");
        assert_eq!(event.kind, EventKind::Other(String::new()));
        assert_eq!(event.issue_key(), None);

        let event = SyncEvent::from_json(json!({"webhookEvent": 42}));
        assert_eq!(event.event_name(), "");
    }

    #[test]
    fn test_mistyped_field_keeps_the_rest() {
        let event = SyncEvent::from_json(json!({
            "webhookEvent": "comment_created",
            "issue": {"key": "TEST-1"},
            "comment": {"body": {"type": "doc", "content": []}}
        }));
        assert_eq!(event.kind, EventKind::CommentCreated);
        assert_eq!(event.issue_key(), Some("TEST-1"));
        assert_eq!(event.comment_body(), "");

        let event = SyncEvent::from_json(json!({
            "webhookEvent": "jira:issue_created",
            "issue": {"key": 123, "fields": {"summary": ["x"], "description": "desc"}}
        }));
        assert_eq!(event.issue_key(), Some("123"));
        let fields = event.issue_fields().unwrap();
        assert_eq!(fields.summary, None);
        assert_eq!(fields.description.as_deref(), Some("desc"));

        let event = SyncEvent::from_json(json!({
            "webhookEvent": "worklog_created",
            "issue": "TEST-1",
            "worklog": {"comment": 7, "timeSpentSeconds": 60}
        }));
        assert_eq!(event.kind, EventKind::WorklogCreated);
        assert_eq!(event.issue_key(), None);
        let worklog = event.payload.worklog.unwrap();
        assert_eq!(worklog.comment.as_deref(), Some("7"));
        assert_eq!(worklog.duration(), WorklogDuration::Seconds(60));
    }

    #[test]
    fn test_worklog_duration_prefers_seconds() {
        let worklog = WorklogPayload {
            comment: None,
            time_spent: Some(json!("1h")),
            time_spent_seconds: Some(json!(3600)),
        };
        assert_eq!(worklog.duration(), WorklogDuration::Seconds(3600));
    }

    #[test]
    fn test_worklog_duration_text_passthrough() {
        let worklog = WorklogPayload {
            comment: None,
            time_spent: Some(json!("2h 30m")),
            time_spent_seconds: None,
        };
        assert_eq!(worklog.duration(), WorklogDuration::Text("2h 30m".to_string()));

        let stringly_seconds = WorklogPayload {
            comment: None,
            time_spent: None,
            time_spent_seconds: Some(json!("90")),
        };
        assert_eq!(stringly_seconds.duration(), WorklogDuration::Text("90".to_string()));
    }

    #[test]
    fn test_worklog_duration_default() {
        assert_eq!(WorklogPayload::default().duration(), WorklogDuration::zero());

        let empty = WorklogPayload {
            comment: None,
            time_spent: Some(json!("")),
            time_spent_seconds: Some(Value::Null),
        };
        assert_eq!(empty.duration(), WorklogDuration::zero());
    }

    fn payload(value: Value) -> WebhookPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_attachment_single_object() {
        let p = payload(json!({
            "attachment": {"id": 100, "filename": "a.png", "content": "http://a/att/100"}
        }));
        let att = AttachmentRef::from_payload(&p).unwrap();
        assert_eq!(att.id, "100");
        assert_eq!(att.filename, "a.png");
        assert_eq!(att.content_url, "http://a/att/100");
    }

    #[test]
    fn test_attachment_array_takes_last() {
        let p = payload(json!({
            "attachments": [
                {"id": "1", "filename": "old.txt", "content": "http://a/att/1"},
                {"id": "2", "name": "new.txt", "content": "http://a/att/2"}
            ]
        }));
        let att = AttachmentRef::from_payload(&p).unwrap();
        assert_eq!(att.id, "2");
        assert_eq!(att.filename, "new.txt");
    }

    #[test]
    fn test_attachment_from_issue_fields() {
        let p = payload(json!({
            "issue": {"key": "TEST-1", "fields": {"attachment": [
                {"id": "9", "content": "http://a/att/9"}
            ]}}
        }));
        let att = AttachmentRef::from_payload(&p).unwrap();
        assert_eq!(att.id, "9");
        assert_eq!(att.filename, "attachment");
    }

    #[test]
    fn test_attachment_missing_parts() {
        assert_eq!(
            AttachmentRef::from_payload(&payload(json!({"attachments": []}))),
            Err(MissingAttachment::NoAttachment)
        );
        assert_eq!(
            AttachmentRef::from_payload(&payload(json!({"attachment": {"filename": "x"}}))),
            Err(MissingAttachment::NoId)
        );
        assert_eq!(
            AttachmentRef::from_payload(&payload(json!({"attachment": {"id": 5}}))),
            Err(MissingAttachment::NoContentUrl)
        );
    }

    #[test]
    fn test_parse_upload_response_shapes() {
        assert_eq!(parse_uploaded_attachment_id(&json!([{"id": "10"}, {"id": "11"}])), "10");
        assert_eq!(parse_uploaded_attachment_id(&json!({"id": 12})), "12");
        assert_eq!(
            parse_uploaded_attachment_id(&json!({"attachments": [{"id": "13"}]})),
            "13"
        );
        assert_eq!(parse_uploaded_attachment_id(&json!([[{"id": "14"}]])), "14");
        assert_eq!(parse_uploaded_attachment_id(&json!([])), "");
        assert_eq!(parse_uploaded_attachment_id(&json!({"attachments": []})), "");
        assert_eq!(parse_uploaded_attachment_id(&json!("ok")), "");
    }
}
