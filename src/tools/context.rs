//! Handler for the `get_me` tool.

use std::pin::Pin;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::{Value, json};

use crate::clients::ClientProvider;
use crate::tools::{ToolContext, ToolHandler, json_result, object_schema};
use crate::translations::Translations;

/// Returns the profile of the user the request's token belongs to.
pub struct GetMeHandler {
    clients: ClientProvider,
    title: String,
    description: String,
}

impl GetMeHandler {
    pub fn new(clients: ClientProvider, t: &Translations) -> Self {
        Self {
            clients,
            title: t.get("TOOL_GET_ME_USER_TITLE", "Get my user profile"),
            description: t.get(
                "TOOL_GET_ME_DESCRIPTION",
                "Get details of the authenticated GitHub user. Use this when a request \
                 includes \"me\", \"my\". The output will not change unless the user \
                 changes their profile, so only call this once.",
            ),
        }
    }
}

impl ToolHandler for GetMeHandler {
    fn name(&self) -> &str {
        "get_me"
    }

    fn title(&self) -> Option<&str> {
        Some(&self.title)
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
        let client = self.clients.rest(&ctx.ctx);

        Box::pin(async move {
            let user: Value = client?.get(&["user"]).await?;
            json_result(&user)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, Context};

    #[tokio::test]
    async fn test_get_me_without_credential() {
        let handler = GetMeHandler::new(ClientProvider::default(), &Translations::default());
        let ctx = ToolContext::new(Context::background());

        let err = handler.execute(JsonObject::new(), &ctx).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<AuthError>(),
            Some(&AuthError::MissingCredential)
        );
    }

    #[test]
    fn test_get_me_uses_translations() {
        let t = Translations::from_vars(vec![(
            "GITHUB_MCP_TOOL_GET_ME_DESCRIPTION".to_string(),
            "Describe me".to_string(),
        )]);
        let handler = GetMeHandler::new(ClientProvider::default(), &t);
        assert_eq!(handler.description(), "Describe me");
        assert_eq!(handler.title(), Some("Get my user profile"));
        assert!(handler.read_only());
    }
}
