use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(server_info))
}

/// Index document describing the transports and where to reach them.
async fn server_info() -> Json<Value> {
    Json(json!({
        "name": "Coda MCP Server (HTTP)",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Model Context Protocol server for the Coda API with Streamable HTTP (/mcp) and legacy SSE transport",
        "transport": "Streamable HTTP + SSE (legacy)",
        "endpoints": {
            "health": "GET /health",
            "mcp": "GET/POST/DELETE /mcp",
            "sse": "GET /sse",
            "message": "POST /message",
        },
        "documentation": "https://github.com/coda-mcp/coda-mcp",
        "coda_tools_count": coda_mcp_runtime::tool_count(),
    }))
}
