//! Issue tools: `get_issue` and the write tool `create_issue`.

use std::pin::Pin;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::{Map, Value, json};

use crate::clients::ClientProvider;
use crate::tools::{
    ToolContext, ToolHandler, json_result, object_schema, optional_str, required_str,
    required_u64,
};
use crate::translations::Translations;

pub struct GetIssueHandler {
    clients: ClientProvider,
    description: String,
}

impl GetIssueHandler {
    pub fn new(clients: ClientProvider, t: &Translations) -> Self {
        Self {
            clients,
            description: t.get(
                "TOOL_GET_ISSUE_DESCRIPTION",
                "Get details of a specific issue in a GitHub repository.",
            ),
        }
    }
}

impl ToolHandler for GetIssueHandler {
    fn name(&self) -> &str {
        "get_issue"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(
            json!({
                "owner": { "type": "string", "description": "The owner of the repository" },
                "repo": { "type": "string", "description": "The name of the repository" },
                "issue_number": { "type": "number", "description": "The number of the issue" },
            }),
            &["owner", "repo", "issue_number"],
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
            let number = required_u64(&args, "issue_number")?.to_string();
            let issue: Value = client?
                .get(&["repos", owner, repo, "issues", &number])
                .await?;
            json_result(&issue)
        })
    }
}

pub struct CreateIssueHandler {
    clients: ClientProvider,
    description: String,
}

impl CreateIssueHandler {
    pub fn new(clients: ClientProvider, t: &Translations) -> Self {
        Self {
            clients,
            description: t.get(
                "TOOL_CREATE_ISSUE_DESCRIPTION",
                "Create a new issue in a GitHub repository.",
            ),
        }
    }
}

impl ToolHandler for CreateIssueHandler {
    fn name(&self) -> &str {
        "create_issue"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn read_only(&self) -> bool {
        false
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(
            json!({
                "owner": { "type": "string", "description": "Repository owner" },
                "repo": { "type": "string", "description": "Repository name" },
                "title": { "type": "string", "description": "Issue title" },
                "body": { "type": "string", "description": "Issue body content" },
            }),
            &["owner", "repo", "title"],
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
            let title = required_str(&args, "title")?;

            let mut payload = Map::new();
            payload.insert("title".to_string(), json!(title));
            if let Some(body) = optional_str(&args, "body")? {
                payload.insert("body".to_string(), json!(body));
            }

            let issue: Value = client?
                .post(&["repos", owner, repo, "issues"], &payload)
                .await?;
            json_result(&issue)
        })
    }
}
