//! MCP server implementation using rmcp.
//!
//! Every tool call gets a fresh [`Context`] built from the HTTP request that
//! carried it, so credentials never outlive or cross requests.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};
use tokio_util::sync::CancellationToken;

use crate::auth::{AuthError, Context, context_from_headers, retrieve};
use crate::clients::{ClientError, ClientProvider};
use crate::resources::{RepositoryResources, ResourceError};
use crate::tools::{InvalidArgument, ToolContext, ToolRegistry, error_result};
use crate::translations::Translations;

/// Type alias for HTTP request parts stored in rmcp extensions.
type HttpParts = http::request::Parts;

/// MCP server that delegates tool calls to the registry and resource reads
/// to the repository contents API.
///
/// The registry is shared read-only by every session.
#[derive(Clone)]
pub struct GitHubMcpServer {
    tool_registry: Arc<ToolRegistry>,
    resources: Arc<RepositoryResources>,
}

impl GitHubMcpServer {
    pub fn new(tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            tool_registry,
            resources: Arc::new(RepositoryResources::new(
                ClientProvider::default(),
                &Translations::default(),
            )),
        }
    }

    pub fn with_resources(mut self, resources: RepositoryResources) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    /// Get the tool registry.
    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }
}

/// Build the execution context for one MCP request.
///
/// Both HTTP bindings attach the inbound `http::request::Parts` to every
/// request; anything else (such as a test harness) runs anonymously.
pub fn request_context(extensions: &Extensions, cancel: &CancellationToken) -> Context {
    match extensions.get::<HttpParts>() {
        Some(parts) => context_from_headers(&parts.headers, cancel),
        None => Context::with_cancellation(cancel),
    }
}

/// Turn a tool's outcome into what the client sees.
///
/// Missing credentials, bad arguments, and GitHub API failures become tool
/// error results the model can read. Anything else is an internal error.
pub fn into_call_result(
    tool: &str,
    result: anyhow::Result<CallToolResult>,
) -> Result<CallToolResult, McpError> {
    let err = match result {
        Ok(result) => return Ok(result),
        Err(err) => err,
    };

    if let Some(auth) = err.downcast_ref::<AuthError>() {
        tracing::info!(tool, "Tool call rejected: no credential");
        return Ok(error_result(auth.to_string()));
    }
    if let Some(arg) = err.downcast_ref::<InvalidArgument>() {
        return Ok(error_result(arg.to_string()));
    }
    if let Some(api) = err.downcast_ref::<ClientError>() {
        tracing::warn!(tool, error = %api, "GitHub API call failed");
        return Ok(error_result(api.to_string()));
    }

    tracing::error!(tool, error = %err, "Tool execution failed");
    Err(McpError::internal_error(
        format!("Tool execution failed: {}", err),
        None,
    ))
}

/// Map a failed resource read to a JSON-RPC error.
pub fn resource_error(err: ResourceError) -> McpError {
    match err {
        // -32002: resource not found
        ResourceError::NotFound(uri) => McpError::new(
            ErrorCode(-32002),
            format!("Resource not found: {}", uri),
            None,
        ),
        ResourceError::InvalidUri(uri) => {
            McpError::invalid_params(format!("Invalid URI: {}", uri), None)
        }
        ResourceError::Auth(auth) => {
            tracing::info!("Resource read rejected: no credential");
            McpError::invalid_request(auth.to_string(), None)
        }
        ResourceError::Api(api) => {
            tracing::warn!(error = %api, "GitHub API call failed");
            McpError::internal_error(format!("Failed to read resource: {}", api), None)
        }
    }
}

impl ServerHandler for GitHubMcpServer {
    fn ping(
        &self,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), McpError>> + Send + '_ {
        std::future::ready(Ok(()))
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let result = ListToolsResult {
            tools: self.tool_registry.list_tools(),
            next_cursor: None,
            ..Default::default()
        };
        std::future::ready(Ok(result))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_name = request.name.to_string();
        let args = request.arguments.unwrap_or_default();
        let registry = self.tool_registry.clone();
        let ctx = request_context(&context.extensions, &context.ct);

        async move {
            tracing::debug!(
                tool = %tool_name,
                authenticated = retrieve(&ctx).is_ok(),
                "Calling tool"
            );

            let tool_ctx = ToolContext::new(ctx);
            match registry.call_tool(&tool_name, args, &tool_ctx).await {
                Some(result) => into_call_result(&tool_name, result),
                None => Err(McpError::invalid_params(
                    format!("Tool not found: {}", tool_name),
                    None,
                )),
            }
        }
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListResourceTemplatesResult::with_all_items(
            self.resources.templates(),
        )))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        let resources = self.resources.clone();
        let ctx = request_context(&context.extensions, &context.ct);

        async move {
            resources
                .read(&ctx, &request.uri)
                .await
                .map_err(resource_error)
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "GitHub MCP server. Authenticate every HTTP request with \
                 `Authorization: Bearer <token>`; tools act as that token's user."
                    .to_string(),
            ),
        }
    }
}
