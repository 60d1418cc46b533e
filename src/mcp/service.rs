//! MCP Streamable HTTP service creation.
//!
//! Produces the service nested into the Axum router by the binary.

use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use super::server::McpServer;

/// Create the MCP Streamable HTTP service.
///
/// Each session gets its own [`McpServer`] instance; they all share the same
/// connection pool.
pub fn create_mcp_service(
    pool: SqlitePool,
    cancellation_token: CancellationToken,
) -> StreamableHttpService<McpServer, LocalSessionManager> {
    // Service factory: one McpServer per session.
    // Note: returns io::Error to match rmcp's expected signature.
    let service_factory = move || -> Result<McpServer, std::io::Error> {
        Ok(McpServer::new(pool.clone()))
    };

    // StreamableHttpServerConfig is #[non_exhaustive]; build from Default and
    // set the fields this service overrides.
    let mut config = StreamableHttpServerConfig::default();
    config.sse_keep_alive = None; // Use default (15s)
    config.sse_retry = None; // Use default retry behavior
    config.stateful_mode = true; // Enable session management
    config.cancellation_token = cancellation_token;

    StreamableHttpService::new(
        service_factory,
        LocalSessionManager::default().into(),
        config,
    )
}
