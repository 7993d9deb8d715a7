//! Remote tracker client
//!
//! The five operations the sync engine needs against one Jira instance,
//! behind the [`TrackerClient`] trait so handlers can be driven by the real
//! REST client or by a test double.
//!
//! Calls return the remote status and body as a [`RemoteResponse`] instead of
//! failing on non-success codes: whether a 4xx is an error depends on the
//! handler. An `Err` means no response was obtained at all.

mod jira;

pub use jira::{JiraClient, NO_CHECK_HEADER};

use crate::config::TrackerEndpoint;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Status code and raw body of a remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Jira acknowledges creation with 200 or 201
    pub fn is_created(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Issue to create on the destination tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub project_key: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

impl NewIssue {
    /// Request body for `POST /issue`
    pub fn to_request_body(&self) -> Value {
        json!({
            "fields": {
                "project": { "key": self.project_key },
                "summary": self.summary,
                "description": self.description,
                "issuetype": { "name": self.issue_type },
            }
        })
    }
}

/// Time logged by a worklog entry, in whichever form the source reported it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorklogDuration {
    /// Exact seconds, sent as `timeSpentSeconds`
    Seconds(i64),
    /// Jira duration string such as `"1h 30m"`, sent as `timeSpent`
    Text(String),
}

impl WorklogDuration {
    /// Zero duration, used when the source reported none
    pub fn zero() -> Self {
        WorklogDuration::Text("0s".to_string())
    }
}

/// Worklog entry to add on the destination tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorklog {
    pub comment: String,
    pub duration: WorklogDuration,
}

impl NewWorklog {
    /// Request body for `POST /issue/{key}/worklog`
    pub fn to_request_body(&self) -> Value {
        match &self.duration {
            WorklogDuration::Seconds(secs) => json!({
                "comment": self.comment,
                "timeSpentSeconds": secs,
            }),
            WorklogDuration::Text(text) => json!({
                "comment": self.comment,
                "timeSpent": text,
            }),
        }
    }
}

/// File to attach to a destination issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Operations against one tracker instance
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Configuration of the tracker this client talks to
    fn endpoint(&self) -> &TrackerEndpoint;

    /// `POST /issue`
    async fn create_issue(&self, issue: &NewIssue) -> Result<RemoteResponse>;

    /// `POST /issue/{key}/comment`
    async fn add_comment(&self, issue_key: &str, body: &str) -> Result<RemoteResponse>;

    /// `POST /issue/{key}/worklog`
    async fn add_worklog(&self, issue_key: &str, worklog: &NewWorklog) -> Result<RemoteResponse>;

    /// `POST /issue/{key}/attachments` as multipart
    async fn upload_attachment(
        &self,
        issue_key: &str,
        upload: AttachmentUpload,
    ) -> Result<RemoteResponse>;

    /// Fetch attachment content from an absolute URL. Fails on non-success status.
    async fn download_attachment(&self, content_url: &str) -> Result<Vec<u8>>;
}
