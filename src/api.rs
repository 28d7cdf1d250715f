//! HTTP API
//!
//! Thin transport layer over the orchestrator and tool hub. Routing and
//! tool failures surface as failure values in a 200 response; only
//! malformed requests (unknown workflow type) map to a 4xx status.

use crate::config::Settings;
use crate::models::{AgentContext, WorkflowKind};
use crate::orchestrator::Orchestrator;
use crate::tools::ToolHub;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub hub: Arc<ToolHub>,
    pub settings: Arc<Settings>,
}

/// Optional caller-supplied identity; missing pieces get stable defaults
#[derive(Debug, Default, Deserialize)]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub company_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<RequestContext>,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<RequestContext>,
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToolExecuteRequest {
    #[serde(default)]
    pub parameters: serde_json::Value,
    #[serde(default)]
    pub context: Option<RequestContext>,
}

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

fn parse_or_stable_uuid(value: &str) -> uuid::Uuid {
    uuid::Uuid::parse_str(value).unwrap_or_else(|_| stable_uuid_from_string(value))
}

fn context_from_request(context: Option<RequestContext>, agent_id: &str) -> AgentContext {
    let request = context.unwrap_or_default();
    let user_id = request.user_id.unwrap_or_else(|| "anonymous".to_string());
    let company_id = request.company_id.unwrap_or_else(|| "default".to_string());

    let mut context = AgentContext::new(agent_id, user_id, company_id);
    // A caller-supplied session id maps to a stable UUID so external systems
    // can correlate requests; without one, every request keeps the fresh v4
    // generated at construction.
    if let Some(session_id) = request.session_id.as_deref().filter(|s| !s.trim().is_empty()) {
        context.session_id = parse_or_stable_uuid(session_id);
    }
    context
}

/// =============================
/// Health and Root
/// =============================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "ai-financial-agents",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/api/v1/agents/{agent_id}/invoke",
            "/api/v1/workflows/{workflow_type}/execute",
            "/api/v1/workflows/{workflow_type}/stream",
            "/api/v1/tools",
            "/api/v1/tools/{tool_name}/execute",
        ],
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "orchestrator": state.orchestrator.status().await,
        "tools": state.hub.list_tools().len(),
        "demo_mode": state.settings.demo_mode(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// =============================
/// Agent Invocation
/// =============================

async fn invoke_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(request): Json<InvokeRequest>,
) -> Json<serde_json::Value> {
    let context = context_from_request(request.context, &agent_id);
    let outcome = state
        .orchestrator
        .route_request(&request.message, Some(context), Some(&agent_id), None)
        .await;

    Json(serde_json::to_value(&outcome).unwrap_or_else(|_| {
        serde_json::json!({"success": false, "error": "Failed to serialize response"})
    }))
}

/// =============================
/// Workflows
/// =============================

async fn execute_workflow(
    State(state): State<AppState>,
    Path(workflow_type): Path<String>,
    Json(request): Json<WorkflowRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let kind: WorkflowKind = workflow_type.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Unknown workflow type: {}", workflow_type),
            })),
        )
    })?;

    let context = context_from_request(request.context, "orchestrator");
    let outcome = state
        .orchestrator
        .route_request(&request.message, Some(context), None, Some(kind))
        .await;

    Ok(Json(serde_json::to_value(&outcome).unwrap_or_else(|_| {
        serde_json::json!({"success": false, "error": "Failed to serialize response"})
    })))
}

async fn stream_workflow(
    State(state): State<AppState>,
    Path(workflow_type): Path<String>,
    Query(params): Query<StreamParams>,
) -> Result<
    Sse<impl Stream<Item = Result<Event, Infallible>>>,
    (StatusCode, Json<serde_json::Value>),
> {
    let kind: WorkflowKind = workflow_type.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Unknown workflow type: {}", workflow_type),
            })),
        )
    })?;

    let message = params
        .message
        .unwrap_or_else(|| "Run the standard workflow".to_string());
    let rx = state.orchestrator.stream_workflow(kind, message, None).await;

    let stream = ReceiverStream::new(rx).map(|event| {
        let event = match Event::default().json_data(&event) {
            Ok(event) => event,
            Err(_) => Event::default().data("{\"type\":\"error\"}"),
        };
        Ok(event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// =============================
/// Tools
/// =============================

async fn list_tools(State(state): State<AppState>) -> Json<serde_json::Value> {
    let tools = state.hub.list_tools();
    Json(serde_json::json!({
        "count": tools.len(),
        "tools": tools,
    }))
}

async fn execute_tool(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    Json(request): Json<ToolExecuteRequest>,
) -> Json<serde_json::Value> {
    let context = request
        .context
        .map(|ctx| context_from_request(Some(ctx), "tool_caller"));
    let result = state
        .hub
        .execute_tool(&tool_name, &request.parameters, context.as_ref())
        .await;

    Json(serde_json::to_value(&result).unwrap_or_else(|_| {
        serde_json::json!({"success": false, "error": "Failed to serialize response"})
    }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/agents/:agent_id/invoke", post(invoke_agent))
        .route(
            "/api/v1/workflows/:workflow_type/execute",
            post(execute_workflow),
        )
        .route(
            "/api/v1/workflows/:workflow_type/stream",
            get(stream_workflow),
        )
        .route("/api/v1/tools", get(list_tools))
        .route("/api/v1/tools/:tool_name/execute", post(execute_tool))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(state: AppState) -> crate::Result<()> {
    let port = state.settings.port;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
