//! Credential-scoped GitHub API clients.
//!
//! Clients are built on demand from a request [`Context`] and are never
//! cached or shared between requests. Building a client performs no I/O; a
//! request without a credential fails with [`AuthError::MissingCredential`]
//! before anything is sent.

mod graphql;
mod rest;
pub mod transport;

use std::fmt;

use bytes::Bytes;
use http::Request;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

use crate::auth::{AuthError, Context, retrieve};
use transport::{BearerAuthLayer, BoxError, HttpTransport};

pub use graphql::{GRAPHQL_URL, GraphQLClient, GraphQLError, GraphQLTransport};
pub use rest::{REST_API_URL, RestClient};

/// `User-Agent` presented on every outbound API call.
pub const USER_AGENT: &str = concat!("github-mcp-remote/", env!("CARGO_PKG_VERSION"));

/// Errors from outbound API calls.
#[derive(Debug)]
pub enum ClientError {
    /// The request could not be built
    InvalidRequest(String),
    /// The transport failed before a response arrived
    Transport(BoxError),
    /// The API answered with a non-success status
    Status { status: u16, body: String },
    /// The GraphQL endpoint returned an `errors` array
    GraphQL(Vec<GraphQLError>),
    /// The response body could not be decoded
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Status { status, body } => {
                write!(f, "GitHub API returned status {}: {}", status, body)
            }
            Self::GraphQL(errors) => {
                let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
                write!(f, "GraphQL errors: {}", messages.join("; "))
            }
            Self::Decode(msg) => write!(f, "Failed to decode response: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(Box::new(e))
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Build a REST client for the credential carried by `ctx`.
pub fn rest_client(ctx: &Context) -> Result<RestClient, AuthError> {
    let credential = retrieve(ctx)?;
    Ok(RestClient::new(credential.clone()))
}

/// Build a GraphQL client for the credential carried by `ctx`.
pub fn query_client(ctx: &Context) -> Result<GraphQLClient, AuthError> {
    query_client_over(ctx, HttpTransport::new())
}

/// Build a GraphQL client that sends through `base`, with the bearer
/// decorator layered on top.
pub fn query_client_over<S>(ctx: &Context, base: S) -> Result<GraphQLClient, AuthError>
where
    S: Service<Request<Bytes>, Response = http::Response<Bytes>, Error = BoxError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let credential = retrieve(ctx)?;
    let transport = BearerAuthLayer::new(credential).layer(base);
    Ok(GraphQLClient::new(
        GRAPHQL_URL,
        BoxCloneSyncService::new(transport),
    ))
}

/// Signature of a REST client factory.
pub type RestClientFn = fn(&Context) -> Result<RestClient, AuthError>;

/// Signature of a GraphQL client factory.
pub type QueryClientFn = fn(&Context) -> Result<GraphQLClient, AuthError>;

/// The pair of client factories handed to toolsets at registration.
#[derive(Clone, Copy)]
pub struct ClientProvider {
    pub rest: RestClientFn,
    pub query: QueryClientFn,
}

impl ClientProvider {
    pub fn rest(&self, ctx: &Context) -> Result<RestClient, AuthError> {
        (self.rest)(ctx)
    }

    pub fn query(&self, ctx: &Context) -> Result<GraphQLClient, AuthError> {
        (self.query)(ctx)
    }
}

impl Default for ClientProvider {
    fn default() -> Self {
        Self {
            rest: rest_client,
            query: query_client,
        }
    }
}

impl fmt::Debug for ClientProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProvider").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, attach};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::service_fn;

    fn authed(token: &str) -> Context {
        attach(&Context::background(), Credential::new(token).unwrap())
    }

    #[test]
    fn test_rest_client_requires_credential() {
        let err = rest_client(&Context::background()).unwrap_err();
        assert_eq!(err, AuthError::MissingCredential);
    }

    #[test]
    fn test_rest_client_presents_request_credential() {
        let client = rest_client(&authed("abc123")).unwrap();
        let req = client
            .request(reqwest::Method::GET, &["user"])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.headers()["authorization"], "Bearer abc123");
    }

    #[test]
    fn test_query_client_requires_credential() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let base = service_fn(move |_req: Request<Bytes>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, BoxError>(http::Response::new(Bytes::new())) }
        });

        let err = query_client_over(&Context::background(), base).unwrap_err();
        assert_eq!(err, AuthError::MissingCredential);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_query_client_targets_graphql_endpoint() {
        let client = query_client(&authed("abc123")).unwrap();
        assert_eq!(client.endpoint(), GRAPHQL_URL);
    }

    #[tokio::test]
    async fn test_query_clients_are_isolated_per_credential() {
        let base = service_fn(|req: Request<Bytes>| async move {
            tokio::task::yield_now().await;
            let auth = req.headers()[http::header::AUTHORIZATION]
                .to_str()
                .unwrap_or_default()
                .to_string();
            let body = serde_json::to_vec(&json!({ "data": { "auth": auth } }))?;
            Ok::<_, BoxError>(http::Response::new(Bytes::from(body)))
        });

        let a = query_client_over(&authed("token-a"), base.clone()).unwrap();
        let b = query_client_over(&authed("token-b"), base).unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let (client, expected) = if i % 2 == 0 {
                (a.clone(), "Bearer token-a")
            } else {
                (b.clone(), "Bearer token-b")
            };
            handles.push(tokio::spawn(async move {
                let data: Value = client.query("query { viewer { login } }", json!({})).await.unwrap();
                assert_eq!(data["auth"], expected);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[test]
    fn test_provider_defaults_to_real_factories() {
        let provider = ClientProvider::default();
        assert!(provider.rest(&Context::background()).is_err());
        assert!(provider.query(&authed("abc123")).is_ok());
    }

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Status {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "GitHub API returned status 404: Not Found");
        let err = ClientError::GraphQL(vec![GraphQLError {
            message: "boom".to_string(),
            kind: None,
        }]);
        assert_eq!(err.to_string(), "GraphQL errors: boom");
    }
}
