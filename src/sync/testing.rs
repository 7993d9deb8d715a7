//! In-memory tracker double for handler tests

use super::engine::SyncEngine;
use crate::config::TrackerEndpoint;
use crate::store::MappingStore;
use crate::tracker::{
    AttachmentUpload, NewIssue, NewWorklog, RemoteResponse, TrackerClient,
};
use crate::{BridgeError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A call received by [`FakeTracker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateIssue(NewIssue),
    Comment { issue_key: String, body: String },
    Worklog { issue_key: String, worklog: NewWorklog },
    Upload { issue_key: String, filename: String, bytes: Vec<u8> },
    Download(String),
}

/// Records calls and answers like a healthy Jira unless told otherwise
pub struct FakeTracker {
    endpoint: TrackerEndpoint,
    calls: Mutex<Vec<Call>>,
    counter: AtomicUsize,
    create_response: Mutex<Option<RemoteResponse>>,
    upload_response: Mutex<Option<RemoteResponse>>,
    unreachable: Mutex<bool>,
    break_store_on_write: Mutex<Option<PathBuf>>,
}

impl FakeTracker {
    pub fn new(name: &str, url: &str, project_key: &str) -> Self {
        Self {
            endpoint: TrackerEndpoint::new(name, url, "token", project_key),
            calls: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
            create_response: Mutex::new(None),
            upload_response: Mutex::new(None),
            unreachable: Mutex::new(false),
            break_store_on_write: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Answer issue creation with this response instead of 201
    pub fn respond_to_create(&self, response: RemoteResponse) {
        *self.create_response.lock().unwrap() = Some(response);
    }

    /// Answer uploads with this response instead of 200 `[{"id": ...}]`
    pub fn respond_to_upload(&self, response: RemoteResponse) {
        *self.upload_response.lock().unwrap() = Some(response);
    }

    /// Fail every call as if the network were down
    pub fn go_offline(&self) {
        *self.unreachable.lock().unwrap() = true;
    }

    /// Make the database at `path` unusable once an issue or attachment is created
    pub fn break_store_after_write(&self, path: &Path) {
        *self.break_store_on_write.lock().unwrap() = Some(path.to_path_buf());
    }

    fn after_write(&self) {
        if let Some(path) = self.break_store_on_write.lock().unwrap().take() {
            break_store(&path);
        }
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if *self.unreachable.lock().unwrap() {
            return Err(BridgeError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    fn next(&self) -> usize {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl TrackerClient for FakeTracker {
    fn endpoint(&self) -> &TrackerEndpoint {
        &self.endpoint
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<RemoteResponse> {
        self.record(Call::CreateIssue(issue.clone()))?;
        if let Some(response) = self.create_response.lock().unwrap().clone() {
            return Ok(response);
        }
        let key = format!("{}-{}", self.endpoint.project_key, self.next());
        self.after_write();
        Ok(RemoteResponse::new(201, serde_json::json!({ "key": key }).to_string()))
    }

    async fn add_comment(&self, issue_key: &str, body: &str) -> Result<RemoteResponse> {
        self.record(Call::Comment {
            issue_key: issue_key.to_string(),
            body: body.to_string(),
        })?;
        Ok(RemoteResponse::new(201, "{}"))
    }

    async fn add_worklog(&self, issue_key: &str, worklog: &NewWorklog) -> Result<RemoteResponse> {
        self.record(Call::Worklog {
            issue_key: issue_key.to_string(),
            worklog: worklog.clone(),
        })?;
        Ok(RemoteResponse::new(201, "{}"))
    }

    async fn upload_attachment(
        &self,
        issue_key: &str,
        upload: AttachmentUpload,
    ) -> Result<RemoteResponse> {
        self.record(Call::Upload {
            issue_key: issue_key.to_string(),
            filename: upload.filename,
            bytes: upload.bytes,
        })?;
        if let Some(response) = self.upload_response.lock().unwrap().clone() {
            return Ok(response);
        }
        let id = 9000 + self.next();
        self.after_write();
        Ok(RemoteResponse::new(200, serde_json::json!([{ "id": id.to_string() }]).to_string()))
    }

    async fn download_attachment(&self, content_url: &str) -> Result<Vec<u8>> {
        self.record(Call::Download(content_url.to_string()))?;
        Ok(format!("bytes of {}", content_url).into_bytes())
    }
}

/// The two fakes wired into an engine
pub struct Fakes {
    pub a: Arc<FakeTracker>,
    pub b: Arc<FakeTracker>,
}

/// Engine over two fakes and a fresh database
pub fn engine_with_fakes() -> (SyncEngine, Fakes, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = MappingStore::open(temp_dir.path().join("mappings.db")).unwrap();

    let a = Arc::new(FakeTracker::new("A", "http://jira-a:8081", "TEST"));
    let b = Arc::new(FakeTracker::new("B", "http://jira-b:8081/", "OPS"));

    let engine = SyncEngine::new(a.clone(), b.clone(), store);
    (engine, Fakes { a, b }, temp_dir)
}

/// Replace the database file with a directory so every later open fails
pub fn break_store(path: &Path) {
    for suffix in ["-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(side));
    }
    std::fs::remove_file(path).unwrap();
    std::fs::create_dir(path).unwrap();
}
