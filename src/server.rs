//! Webhook listener
//!
//! Exposes one inbound endpoint per relay direction. Jira instances are
//! configured to post their webhooks to the path matching the direction the
//! event should travel:
//!
//! - `POST /webhook/A-to-B` - events from tracker A
//! - `POST /webhook/B-to-A` - events from tracker B
//! - `GET /health` - liveness probe
//!
//! Webhook responses are always `200 OK` with the [`SyncOutcome`] as JSON;
//! failures are reported in the body, never as an HTTP error.

use crate::config::ServerConfig;
use crate::sync::{Direction, SyncEngine, SyncEvent, SyncOutcome};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

struct AppState {
    engine: SyncEngine,
}

/// HTTP front end of the sync engine
pub struct WebhookServer {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl WebhookServer {
    pub fn new(engine: SyncEngine, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState { engine }),
            config,
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route(&webhook_path(Direction::AToB), post(webhook_a_to_b))
            .route(&webhook_path(Direction::BToA), post(webhook_b_to_a))
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(self.state.clone())
    }

    /// Run the server on the given address until the process is stopped
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;

        tracing::info!(
            addr = addr,
            max_body_size = self.config.max_body_size,
            "Webhook server listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(ServerError::Io)
    }
}

/// Inbound path for events travelling in `direction`
pub fn webhook_path(direction: Direction) -> String {
    format!("/webhook/{}", direction.route_segment())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn webhook_a_to_b(State(state): State<Arc<AppState>>, body: Bytes) -> Json<SyncOutcome> {
    handle_webhook(&state, Direction::AToB, &body).await
}

async fn webhook_b_to_a(State(state): State<Arc<AppState>>, body: Bytes) -> Json<SyncOutcome> {
    handle_webhook(&state, Direction::BToA, &body).await
}

async fn handle_webhook(state: &AppState, direction: Direction, body: &[u8]) -> Json<SyncOutcome> {
    let event = SyncEvent::from_slice(body);
    tracing::info!(
        direction = %direction,
        event = %event.event_name(),
        issue = ?event.issue_key(),
        "Received event"
    );

    let outcome = state.engine.dispatch(&event, direction).await;
    tracing::debug!(direction = %direction, status = ?outcome.status, "Event processed");
    Json(outcome)
}
