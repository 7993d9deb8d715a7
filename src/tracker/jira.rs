//! Jira REST client
//!
//! Talks to the Jira REST API v2 with a bearer token.

use super::{AttachmentUpload, NewIssue, NewWorklog, RemoteResponse, TrackerClient};
use crate::config::TrackerEndpoint;
use crate::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info};

/// Header Jira requires on attachment uploads to skip its XSRF check
pub const NO_CHECK_HEADER: (&str, &str) = ("X-Atlassian-Token", "no-check");

/// Jira API client for one side of the bridge
pub struct JiraClient {
    client: Client,
    endpoint: TrackerEndpoint,
    api_base: String,
    auth_token: Option<String>,
}

impl JiraClient {
    /// Create a new client. Every request is bounded by `timeout`.
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoint: TrackerEndpoint, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let api_base = format!("{}/rest/api/2", endpoint.base_url());

        let auth_token = endpoint.resolve_token();
        if auth_token.is_none() {
            tracing::warn!(
                tracker = %endpoint.name,
                env_var = endpoint.token_env_var().unwrap_or_default(),
                "Token environment variable not set, requests will be unauthenticated"
            );
        }

        Ok(Self {
            client,
            endpoint,
            api_base,
            auth_token,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<RemoteResponse> {
        let url = self.api_url(path);
        debug!(tracker = %self.endpoint.name, url = %url, "POST");

        // .json() also sets Content-Type: application/json
        let response = self.authorize(self.client.post(&url)).json(body).send().await?;
        into_remote_response(response).await
    }
}

async fn into_remote_response(response: Response) -> Result<RemoteResponse> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(RemoteResponse { status, body })
}

#[async_trait]
impl TrackerClient for JiraClient {
    fn endpoint(&self) -> &TrackerEndpoint {
        &self.endpoint
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<RemoteResponse> {
        info!(
            tracker = %self.endpoint.name,
            project = %issue.project_key,
            "Creating Jira issue"
        );
        self.post_json("issue", &issue.to_request_body()).await
    }

    async fn add_comment(&self, issue_key: &str, body: &str) -> Result<RemoteResponse> {
        info!(tracker = %self.endpoint.name, key = %issue_key, "Adding comment to Jira issue");
        self.post_json(
            &format!("issue/{}/comment", issue_key),
            &serde_json::json!({ "body": body }),
        )
        .await
    }

    async fn add_worklog(&self, issue_key: &str, worklog: &NewWorklog) -> Result<RemoteResponse> {
        info!(tracker = %self.endpoint.name, key = %issue_key, "Adding worklog to Jira issue");
        self.post_json(
            &format!("issue/{}/worklog", issue_key),
            &worklog.to_request_body(),
        )
        .await
    }

    async fn upload_attachment(
        &self,
        issue_key: &str,
        upload: AttachmentUpload,
    ) -> Result<RemoteResponse> {
        let url = self.api_url(&format!("issue/{}/attachments", issue_key));

        info!(
            tracker = %self.endpoint.name,
            key = %issue_key,
            filename = %upload.filename,
            size = upload.bytes.len(),
            "Uploading attachment to Jira issue"
        );

        // Multipart sets its own Content-Type with the boundary
        let part = Part::bytes(upload.bytes).file_name(upload.filename);
        let form = Form::new().part("file", part);

        let response = self
            .authorize(self.client.post(&url))
            .header(NO_CHECK_HEADER.0, NO_CHECK_HEADER.1)
            .multipart(form)
            .send()
            .await?;

        into_remote_response(response).await
    }

    async fn download_attachment(&self, content_url: &str) -> Result<Vec<u8>> {
        debug!(tracker = %self.endpoint.name, url = %content_url, "Downloading attachment");

        let response = self
            .authorize(self.client.get(content_url))
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
