//! Agent runtime HTTP server.
//!
//! Implements the downstream contract every backend must satisfy: a
//! liveness endpoint and an OpenAI-compatible chat completions endpoint
//! that appends the turn to the agent's conversation store before
//! replying. A memory-write failure is logged and swallowed; the turn is
//! still returned to the caller.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Json, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use relay_core::{
    session, ChatCompletionRequest, CompletionEnvelope, CompletionMeta, Error, Result,
};
use relay_store::ConversationStore;

use crate::responder::Responder;

/// Shared agent state.
pub struct AgentState {
    pub key: String,
    pub display_name: String,
    pub store: Arc<ConversationStore>,
    pub responder: Arc<dyn Responder>,
}

/// One backend agent process.
pub struct AgentServer {
    host: String,
    port: u16,
    state: Arc<AgentState>,
}

impl AgentServer {
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        store: Arc<ConversationStore>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8002,
            state: Arc::new(AgentState {
                key: key.into(),
                display_name: display_name.into(),
                store,
                responder,
            }),
        }
    }

    /// Set the bind address.
    pub fn with_bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/v1/chat/completions", post(chat_completions_handler))
            .route("/memory/last", get(memory_last_handler))
            .route("/memory/stats", get(memory_stats_handler))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the agent server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::internal(format!("failed to bind {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, agent = %self.state.key, "agent starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::internal(format!("server error: {}", e)))?;

        Ok(())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::auth("missing Authorization header"))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::auth("Authorization header must use the Bearer scheme"))?;

    if token.trim().is_empty() {
        return Err(Error::auth("empty bearer token"));
    }
    Ok(token.to_string())
}

async fn health_handler(State(state): State<Arc<AgentState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "agent": state.key,
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

/// OpenAI-compatible chat completions endpoint.
///
/// The append happens synchronously before the response is built, so a
/// recorded turn always happens-before its reply within a session.
async fn chat_completions_handler(
    State(state): State<Arc<AgentState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatCompletionRequest>,
) -> std::result::Result<Json<CompletionEnvelope>, ApiError> {
    bearer_token(&headers)?;

    let user_message = payload
        .first_user_message()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::invalid_request("no user message found"))?
        .to_string();

    let session_id = session::resolve(
        headers
            .get("x-session-id")
            .and_then(|v| v.to_str().ok()),
    );

    let start = Instant::now();
    let response_text = state.responder.respond(&user_message).await?;
    let elapsed = start.elapsed();

    let memory_used = match state
        .store
        .append(
            &session_id,
            &user_message,
            &response_text,
            elapsed.as_secs_f64() * 1000.0,
        )
        .await
    {
        Ok(_) => true,
        Err(e) => {
            // Never fail the user-visible request on a memory-write failure.
            tracing::warn!(
                agent = %state.key,
                session = %session_id,
                error = %e,
                "memory append failed; turn returned unrecorded"
            );
            false
        }
    };

    let meta = CompletionMeta {
        memory_used,
        processing_time: format!("{:.2}s", elapsed.as_secs_f64()),
        confidence: state.responder.confidence(),
        session_id,
    };

    Ok(Json(CompletionEnvelope::assistant(
        payload.model.clone(),
        &user_message,
        response_text,
        meta,
    )))
}

#[derive(Debug, Deserialize)]
struct MemoryQuery {
    session: Option<String>,
}

/// Debug endpoint: the most recent turn for a session.
async fn memory_last_handler(
    State(state): State<Arc<AgentState>>,
    Query(query): Query<MemoryQuery>,
) -> std::result::Result<Json<Value>, ApiError> {
    let session = query
        .session
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::invalid_request("session parameter required"))?;

    match state.store.last(&session).await? {
        Some(record) => Ok(Json(json!({
            "session": session,
            "last_conversation": record,
        }))),
        None => Ok(Json(json!({
            "session": session,
            "message": "No conversation history found",
        }))),
    }
}

/// Aggregate store statistics for this agent.
async fn memory_stats_handler(
    State(state): State<Arc<AgentState>>,
) -> std::result::Result<Json<Value>, ApiError> {
    let stats = state.store.stats().await?;
    Ok(Json(json!({
        "agent": state.key,
        "stats": stats,
    })))
}
