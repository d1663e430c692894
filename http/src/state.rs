use coda_mcp_runtime::McpServer;

use crate::session::{SseSessions, StreamableSessions};

/// How the HTTP transport introduces itself in `/health`.
pub const SERVER_NAME: &str = "coda-mcp-http";

/// One MCP server shared by every session; the registries route requests to
/// the transport that should answer them.
#[derive(Clone)]
pub struct AppState {
    pub server: McpServer,
    pub sse: SseSessions,
    pub streamable: StreamableSessions,
}
