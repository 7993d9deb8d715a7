//! Mapping store
//!
//! SQLite-backed record of which issue and attachment on one tracker
//! corresponds to which on the other.

mod sqlite;

pub use sqlite::{AttachmentMapping, AttachmentTarget, IssueMapping, MappingStore, StoreStats};
