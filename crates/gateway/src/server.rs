//! Axum-based HTTP server exposing the OpenAI-compatible surface.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use relay_core::{
    config::DispatchConfig, session, ChatCompletionRequest, Error, HealthState, Result,
    SpeechRequest,
};

use crate::classifier::Classifier;
use crate::dispatch::Dispatcher;
use crate::health::HealthAggregator;
use crate::registry::AgentRegistry;

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub classifier: Classifier,
    pub dispatcher: Dispatcher,
    pub health: HealthAggregator,
}

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
}

impl GatewayServer {
    /// Create a new gateway server over a registry and dispatch timeouts.
    pub fn new(
        config: GatewayConfig,
        registry: Arc<AgentRegistry>,
        dispatch: &DispatchConfig,
    ) -> Self {
        let state = AppState {
            classifier: Classifier::new(registry.clone()),
            dispatcher: Dispatcher::new(
                registry.clone(),
                Duration::from_secs(dispatch.timeout_secs),
            ),
            health: HealthAggregator::new(
                registry.clone(),
                Duration::from_secs(dispatch.probe_timeout_secs),
            ),
            registry,
        };
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/v1/chat/completions", post(chat_completions_handler))
            .route("/v1/audio/speech", post(audio_speech_handler))
            .route("/v1/models", get(models_handler))
            .route("/health", get(health_handler))
            .route("/agents", get(agents_handler))
            .with_state(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any));
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::internal(format!("failed to bind {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, agents = self.state.registry.len(), "gateway starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::internal(format!("server error: {}", e)))?;

        Ok(())
    }
}

// =============================================================================
// Error mapping
// =============================================================================

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Wrapper mapping core errors onto HTTP responses.
pub struct ApiError(pub Error);

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
            Error::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::UpstreamError { .. } | Error::UpstreamUnreachable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "gateway request failed");
        }

        let body = Json(ErrorResponse {
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// Extract the bearer token; any non-empty token is accepted.
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

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-session-id").and_then(|v| v.to_str().ok())
}

// =============================================================================
// Handlers
// =============================================================================

/// OpenAI-compatible chat completions endpoint.
async fn chat_completions_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatCompletionRequest>,
) -> std::result::Result<Json<Value>, ApiError> {
    // Auth and validation are resolved before any downstream call.
    let token = bearer_token(&headers)?;
    if payload
        .first_user_message()
        .map(str::trim)
        .unwrap_or_default()
        .is_empty()
    {
        return Err(Error::invalid_request("no user message found").into());
    }

    let session_id = session::resolve(session_header(&headers));
    let agent_key = state.classifier.classify(&payload.model, &payload.user_text());

    let body = state
        .dispatcher
        .dispatch_chat(&agent_key, &payload, &session_id, &token)
        .await?;

    Ok(Json(body))
}

/// OpenAI-compatible audio speech endpoint.
async fn audio_speech_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SpeechRequest>,
) -> std::result::Result<Json<Value>, ApiError> {
    let token = bearer_token(&headers)?;
    if payload.input.trim().is_empty() {
        return Err(Error::invalid_request("empty input text").into());
    }

    let body = state.dispatcher.dispatch_speech(&payload, &token).await?;
    Ok(Json(body))
}

/// List configured model aliases as OpenAI-style model objects.
async fn models_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let created = chrono::Utc::now().timestamp();
    let data: Vec<Value> = state
        .registry
        .aliases()
        .iter()
        .map(|(model, _)| {
            json!({
                "id": model,
                "object": "model",
                "created": created,
                "owned_by": "agentrelay",
                "permission": [],
                "root": model,
                "parent": null,
            })
        })
        .collect();

    Json(json!({ "object": "list", "data": data }))
}

/// Gateway health plus the aggregate agent map.
#[derive(Debug, Serialize)]
struct GatewayHealth {
    status: &'static str,
    gateway: &'static str,
    timestamp: i64,
    agents: BTreeMap<String, HealthState>,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<GatewayHealth> {
    let agents = state.health.check_all().await;
    Json(GatewayHealth {
        status: "healthy",
        gateway: "agentrelay",
        timestamp: chrono::Utc::now().timestamp(),
        agents,
    })
}

/// Full registry and alias table.
async fn agents_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let models: BTreeMap<&str, &str> = state
        .registry
        .aliases()
        .iter()
        .map(|(model, agent)| (model.as_str(), agent.as_str()))
        .collect();

    Json(json!({
        "agents": state.registry.agents(),
        "models": models,
        "total_agents": state.registry.len(),
        "total_models": models.len(),
    }))
}
