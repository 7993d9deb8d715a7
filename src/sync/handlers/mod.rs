//! Per-event-kind sync handlers
//!
//! Each handler turns one event into a [`SyncOutcome`](crate::sync::SyncOutcome).
//! Failures never escape a handler; they are reported in the outcome.

pub mod attachment;
pub mod comment;
pub mod issue;
pub mod worklog;

use crate::BridgeError;

/// Log label for what kind of failure ended a handler
pub(crate) fn failure_kind(err: &BridgeError) -> &'static str {
    if err.is_storage() {
        "storage"
    } else if err.is_transport() {
        "transport"
    } else {
        "other"
    }
}
