//! Handler for the `get_repository` tool.

use std::pin::Pin;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::{Value, json};

use crate::clients::ClientProvider;
use crate::tools::{ToolContext, ToolHandler, json_result, object_schema, required_str};
use crate::translations::Translations;

pub struct GetRepositoryHandler {
    clients: ClientProvider,
    description: String,
}

impl GetRepositoryHandler {
    pub fn new(clients: ClientProvider, t: &Translations) -> Self {
        Self {
            clients,
            description: t.get(
                "TOOL_GET_REPOSITORY_DESCRIPTION",
                "Get details of a GitHub repository",
            ),
        }
    }
}

impl ToolHandler for GetRepositoryHandler {
    fn name(&self) -> &str {
        "get_repository"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(
            json!({
                "owner": { "type": "string", "description": "Repository owner" },
                "repo": { "type": "string", "description": "Repository name" },
            }),
            &["owner", "repo"],
        )
    }

    fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Pin<Box<dyn std::future::Future<Output = anyhow::Result<CallToolResult>> + Send + '_>>
    {
        let client = self.clients.rest(&ctx.ctx);

        Box::pin(async move {
            let owner = required_str(&args, "owner")?;
            let repo = required_str(&args, "repo")?;
            let repository: Value = client?
                .get(&["repos", owner, repo])
                .await?;
            json_result(&repository)
        })
    }
}
