//! Bidirectional sync between two trackers
//!
//! Inbound events are decoded into [`SyncEvent`]s, routed by kind and handled
//! against the tracker pairing of their [`Direction`]. Loop prevention relies
//! on the provenance markers in [`provenance`] and the mappings kept in the
//! [`MappingStore`](crate::store::MappingStore).

mod direction;
mod dispatcher;
mod engine;
mod event;
mod locks;
mod outcome;
pub mod handlers;
pub mod provenance;

#[cfg(test)]
pub(crate) mod testing;

pub use direction::Direction;
pub use dispatcher::{route, Route};
pub use engine::{SyncContext, SyncEngine};
pub use event::{
    parse_uploaded_attachment_id, AttachmentRef, EventKind, MissingAttachment, SyncEvent,
    WebhookPayload, ISSUE_CREATED_EVENT,
};
pub use locks::KeyedLocks;
pub use outcome::{SyncOutcome, SyncStatus};
