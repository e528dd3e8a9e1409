//! Handler for the `get_viewer` tool, served over GraphQL.

use std::pin::Pin;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::{Value, json};

use crate::clients::ClientProvider;
use crate::tools::{ToolContext, ToolHandler, json_result, object_schema};
use crate::translations::Translations;

const VIEWER_QUERY: &str = "query { viewer { login name url company location createdAt } }";

pub struct GetViewerHandler {
    clients: ClientProvider,
    description: String,
}

impl GetViewerHandler {
    pub fn new(clients: ClientProvider, t: &Translations) -> Self {
        Self {
            clients,
            description: t.get(
                "TOOL_GET_VIEWER_DESCRIPTION",
                "Get the login, name and profile URL of the authenticated user via GraphQL.",
            ),
        }
    }
}

impl ToolHandler for GetViewerHandler {
    fn name(&self) -> &str {
        "get_viewer"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({}), &[])
    }

    fn execute(
        &self,
        _args: JsonObject,
        ctx: &ToolContext,
    ) -> Pin<Box<dyn std::future::Future<Output = anyhow::Result<CallToolResult>> + Send + '_>>
    {
        let client = self.clients.query(&ctx.ctx);

        Box::pin(async move {
            let data: Value = client?.query(VIEWER_QUERY, json!({})).await?;
            json_result(&data["viewer"])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, Context, Credential, attach};
    use crate::clients::transport::BoxError;
    use crate::clients::{GraphQLClient, query_client_over, rest_client};
    use bytes::Bytes;
    use tower::service_fn;

    fn fake_query_client(ctx: &Context) -> Result<GraphQLClient, AuthError> {
        query_client_over(
            ctx,
            service_fn(|req: http::Request<Bytes>| async move {
                let auth = req.headers()[http::header::AUTHORIZATION]
                    .to_str()
                    .unwrap_or_default()
                    .to_string();
                let body = serde_json::to_vec(&json!({
                    "data": { "viewer": { "login": "octocat", "seen_auth": auth } }
                }))?;
                Ok::<_, BoxError>(http::Response::new(Bytes::from(body)))
            }),
        )
    }

    fn provider() -> ClientProvider {
        ClientProvider {
            rest: rest_client,
            query: fake_query_client,
        }
    }

    #[tokio::test]
    async fn test_get_viewer_uses_request_credential() {
        let handler = GetViewerHandler::new(provider(), &Translations::default());
        let ctx = ToolContext::new(attach(
            &Context::background(),
            Credential::new("abc123").unwrap(),
        ));

        let result = handler.execute(JsonObject::new(), &ctx).await.unwrap();
        let text = result.content[0].as_text().unwrap().text.clone();
        let viewer: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(viewer["login"], "octocat");
        assert_eq!(viewer["seen_auth"], "Bearer abc123");
    }

    #[tokio::test]
    async fn test_get_viewer_without_credential() {
        let handler = GetViewerHandler::new(provider(), &Translations::default());
        let ctx = ToolContext::new(Context::background());

        let err = handler.execute(JsonObject::new(), &ctx).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<AuthError>(),
            Some(&AuthError::MissingCredential)
        );
    }
}
