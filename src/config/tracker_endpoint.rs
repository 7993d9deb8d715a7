//! Tracker endpoint configuration
//!
//! One Jira instance taking part in the bridge: where it lives, how to
//! authenticate against it, and which project relayed issues land in.

use serde::{Deserialize, Serialize};

/// Issue type used when creating relayed issues, unless overridden
pub const DEFAULT_ISSUE_TYPE: &str = "Task";

fn default_issue_type() -> String {
    DEFAULT_ISSUE_TYPE.to_string()
}

/// Connection settings for one side of the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerEndpoint {
    /// Short label used in logs ("A", "B")
    pub name: String,

    /// Jira base URL, e.g. `http://jira-a.internal:8081`
    pub url: String,

    /// Bearer token, either literal or a `$ENV_VAR` reference
    pub token: String,

    /// Project that relayed issues are created in
    pub project_key: String,

    /// Issue type for relayed issues (must exist in the project's scheme)
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
}

impl TrackerEndpoint {
    /// Create a new endpoint with the default issue type
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        token: impl Into<String>,
        project_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            token: token.into(),
            project_key: project_key.into(),
            issue_type: default_issue_type(),
        }
    }

    /// Base URL without a trailing slash. Attachment mappings are keyed on this.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Name of the environment variable holding the token, if the token is a reference
    pub fn token_env_var(&self) -> Option<&str> {
        self.token.strip_prefix('$')
    }

    /// Resolve the token, reading the environment for `$VAR` references.
    ///
    /// Returns `None` when the referenced variable is unset.
    pub fn resolve_token(&self) -> Option<String> {
        match self.token_env_var() {
            Some(var) => std::env::var(var).ok(),
            None => Some(self.token.clone()),
        }
    }
}
