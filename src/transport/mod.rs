//! HTTP transport bindings for the MCP server.
//!
//! A binding only decides which routes speak MCP. Binding the listener,
//! serving, and draining live in [`crate::lifecycle`] and are shared by
//! both bindings.

mod sse;

use std::fmt;
use std::time::Duration;

use axum::{Router, http::StatusCode, response::Json, routing::get};
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::server::GitHubMcpServer;

/// Path the streamable binding serves MCP on.
pub const STREAMABLE_PATH: &str = "/mcp";

const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Which wire protocol clients use to reach the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportBinding {
    /// MCP streamable HTTP on `/mcp`.
    Streamable,
    /// Legacy MCP HTTP+SSE on `/sse` and `/message`. Clients are told to
    /// post to `base_url`, so it must be the publicly reachable address.
    EventStream { base_url: Url },
}

impl TransportBinding {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Streamable => "streamable-http",
            Self::EventStream { .. } => "sse",
        }
    }

    /// Build the router for this binding.
    ///
    /// Long-lived streams end when `shutdown` is cancelled so the server
    /// can drain.
    pub fn router(&self, server: GitHubMcpServer, shutdown: &CancellationToken) -> Router {
        let mcp = match self {
            Self::Streamable => {
                let service = StreamableHttpService::new(
                    move || Ok(server.clone()),
                    LocalSessionManager::default().into(),
                    StreamableHttpServerConfig {
                        sse_keep_alive: Some(SSE_KEEP_ALIVE),
                        cancellation_token: shutdown.child_token(),
                        ..Default::default()
                    },
                );
                Router::new().nest_service(STREAMABLE_PATH, service)
            }
            Self::EventStream { base_url } => {
                sse::router(server, base_url.clone(), shutdown.child_token())
            }
        };

        mcp.route("/health", get(health_check)).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
    }
}

impl fmt::Display for TransportBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
