//! jirabridge - Bidirectional sync between two Jira instances
//!
//! jirabridge listens for webhook notifications from two Jira instances ("A"
//! and "B") and replicates issues, comments, worklogs and attachments created
//! on one side to the other. Relayed text carries a provenance marker so the
//! bridge recognizes its own writes when they come back and never relays them
//! twice.
//!
//! # Architecture
//!
//! - **config**: YAML configuration for both trackers, listener and storage
//! - **store**: SQLite issue and attachment mappings
//! - **tracker**: Jira REST client behind the `TrackerClient` trait
//! - **sync**: Event decoding, routing, loop prevention and handlers
//! - **server**: axum webhook listener

pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod store;
pub mod sync;
pub mod tracker;

// Re-exports
pub use error::{BridgeError, Result};
