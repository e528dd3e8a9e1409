//! GitHub GraphQL client speaking through a decorated transport.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use http::{Method, Request};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower::util::BoxCloneSyncService;

use crate::clients::transport::BoxError;
use crate::clients::{ClientError, USER_AGENT};

/// Fixed GraphQL endpoint.
pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Type-erased transport the GraphQL client sends through.
pub type GraphQLTransport = BoxCloneSyncService<Request<Bytes>, http::Response<Bytes>, BoxError>;

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

/// Client for the GraphQL endpoint.
///
/// Authentication lives entirely in the transport; this type never sees
/// the credential.
#[derive(Clone)]
pub struct GraphQLClient {
    endpoint: String,
    transport: GraphQLTransport,
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GraphQLClient {
    pub fn new(endpoint: impl Into<String>, transport: GraphQLTransport) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run `query` with `variables` and decode `data` into `T`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_vec(&json!({
            "query": query,
            "variables": variables,
        }))?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT_HEADER, USER_AGENT)
            .body(Bytes::from(body))
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let resp = self
            .transport
            .clone()
            .oneshot(req)
            .await
            .map_err(ClientError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(resp.body()).into_owned(),
            });
        }

        let parsed: GraphQLResponse = serde_json::from_slice(resp.body())?;
        if !parsed.errors.is_empty() {
            return Err(ClientError::GraphQL(parsed.errors));
        }
        let data = parsed.data.unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }
}
