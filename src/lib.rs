pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod resources;
pub mod server;
pub mod tools;
pub mod translations;
pub mod transport;

// Re-export key types and functions
pub use auth::{AuthError, Context, Credential, attach, extract_bearer, retrieve};
pub use clients::{ClientProvider, GraphQLClient, RestClient, query_client, rest_client};
pub use config::{Config, ServerConfig};
pub use error::ServerError;
pub use lifecycle::{Lifecycle, LifecycleState, ShutdownOutcome};
pub use resources::RepositoryResources;
pub use server::GitHubMcpServer;
pub use tools::{ToolHandler, ToolRegistry, init_toolsets};
pub use translations::Translations;
pub use transport::TransportBinding;

use std::sync::Arc;

/// Build the MCP server for `config`: register the enabled toolsets and the
/// repository resources with the default client factories.
pub fn create_server(config: &ServerConfig) -> Result<GitHubMcpServer, ServerError> {
    let clients = ClientProvider::default();
    let translations = Translations::from_env();
    let registry = init_toolsets(&config.toolsets, config.read_only, clients, &translations)?;
    Ok(GitHubMcpServer::new(Arc::new(registry))
        .with_resources(RepositoryResources::new(clients, &translations)))
}

/// Serve until `lifecycle` is shut down.
pub async fn run(
    config: ServerConfig,
    lifecycle: &Lifecycle,
) -> Result<ShutdownOutcome, ServerError> {
    let server = create_server(&config)?;
    lifecycle.run(config.addr, &config.binding, server).await
}
