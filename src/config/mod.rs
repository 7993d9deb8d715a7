//! Configuration system
//!
//! Loads ~/.config/jirabridge/config.yaml with:
//! - The two tracker endpoints (A and B)
//! - Webhook listener settings
//! - Mapping database location
//! - Outbound request timeout

mod bridge_config;
mod tracker_endpoint;
pub mod validation;

pub use bridge_config::{BridgeConfig, ServerConfig, StorageConfig};
pub use tracker_endpoint::{TrackerEndpoint, DEFAULT_ISSUE_TYPE};
pub use validation::{validate_config, validate_config_result, ValidationError};
