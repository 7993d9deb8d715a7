//! Result of processing one event
//!
//! Serialized as the webhook response body: `{"status": ..., ...}` with
//! optional detail fields.

use serde::Serialize;

/// What the bridge did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Issue replicated to the destination
    Created,
    /// Issue already had a counterpart
    AlreadyMapped,
    /// Comment or worklog relayed
    Ok,
    /// Nothing to do (echo, unsupported event, duplicate attachment)
    Ignored,
    /// Parent issue has no counterpart yet
    NoMapping,
    /// Attachment copied to the destination
    Uploaded,
    /// Remote call or storage failed
    Error,
}

impl SyncStatus {
    pub fn is_error(self) -> bool {
        self == SyncStatus::Error
    }
}

/// Status plus the detail fields relevant to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub status: SyncStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_attachment_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SyncOutcome {
    fn new(status: SyncStatus) -> Self {
        Self {
            status,
            dest_key: None,
            code: None,
            text: None,
            dest_attachment_id: None,
            exception: None,
            reason: None,
        }
    }

    pub fn created(dest_key: impl Into<String>) -> Self {
        Self {
            dest_key: Some(dest_key.into()),
            ..Self::new(SyncStatus::Created)
        }
    }

    pub fn already_mapped(dest_key: impl Into<String>) -> Self {
        Self {
            dest_key: Some(dest_key.into()),
            ..Self::new(SyncStatus::AlreadyMapped)
        }
    }

    pub fn ok(code: u16) -> Self {
        Self {
            code: Some(code),
            ..Self::new(SyncStatus::Ok)
        }
    }

    pub fn ignored() -> Self {
        Self::new(SyncStatus::Ignored)
    }

    pub fn no_mapping() -> Self {
        Self::new(SyncStatus::NoMapping)
    }

    pub fn uploaded(code: u16, dest_attachment_id: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            dest_attachment_id: Some(dest_attachment_id.into()),
            ..Self::new(SyncStatus::Uploaded)
        }
    }

    /// The remote answered with a non-success status
    pub fn rejected(code: u16, text: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            text: Some(text.into()),
            ..Self::new(SyncStatus::Error)
        }
    }

    /// No usable answer: transport failure or local storage failure
    pub fn failed(err: &crate::BridgeError) -> Self {
        Self {
            exception: Some(err.to_string()),
            ..Self::new(SyncStatus::Error)
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
