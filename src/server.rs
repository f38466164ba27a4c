//! HTTP tool server.
//!
//! Exposes the gateway's tool surface as a JSON HTTP API, with the MCP
//! streamable endpoint mounted on the same listener.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `*`    | `/mcp` | MCP streamable HTTP endpoint |
//!
//! # Envelope Contract
//!
//! Tool calls always answer `200`. A failed invocation carries the uniform
//! envelope in the body instead of an HTTP error status:
//!
//! ```json
//! { "isError": true, "message": "data source 'crm' is not registered" }
//! ```
//!
//! The dispatcher guarantees no raw lower-level fault escapes unformatted.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients and cross-origin tool calls.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::mcp::McpBridge;
use crate::registry::Registry;
use crate::tools::{dispatch, ToolContext, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    tools: Arc<ToolRegistry>,
    ctx: Arc<ToolContext>,
}

/// Start the gateway server.
///
/// Binds to `[server].bind` and serves the tool API and the MCP endpoint
/// until the process is terminated.
pub async fn run_server(config: &Config, registry: Arc<Registry>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let tools = Arc::new(ToolRegistry::with_builtins());
    let ctx = Arc::new(ToolContext::new(registry.clone()));

    tracing::info!(
        sources = registry.len(),
        tools = tools.len(),
        "starting data gateway"
    );
    for tool in tools.tools() {
        println!("  POST /tools/{} - {}", tool.name(), tool.description());
    }

    let mcp_service = McpBridge::streamable_service(tools.clone(), ctx.clone());

    let state = AppState { tools, ctx };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(state);

    println!("data gateway listening on http://{bind_addr}");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

/// JSON response body for `GET /tools/list`.
#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.parameters_schema(),
        })
        .collect();

    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Unified tool dispatch. The response is always `200`; failures live in
/// the envelope body.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    Json(dispatch(&state.tools, &state.ctx, &name, params).await)
}
