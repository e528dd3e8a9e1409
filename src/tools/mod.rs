//! GitHub tools exposed over MCP.
//!
//! Tools are grouped into toolsets and registered once at startup. Handlers
//! never see HTTP headers; they ask the [`ClientProvider`] for a client
//! built from the request's context.
//!
//! [`ClientProvider`]: crate::clients::ClientProvider

mod registry;
mod toolsets;

mod context;
mod issues;
mod repos;
mod users;

pub use registry::{ToolContext, ToolHandler, ToolRegistry};
pub use toolsets::{ALL_TOOLSETS, Toolset, available_toolsets, init_toolsets};

pub use context::GetMeHandler;
pub use issues::{CreateIssueHandler, GetIssueHandler};
pub use repos::GetRepositoryHandler;
pub use users::GetViewerHandler;

use std::fmt;

use rmcp::model::{CallToolResult, Content, JsonObject};
use serde_json::{Value, json};

/// A tool argument was missing or had the wrong type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArgument(pub String);

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid argument: {}", self.0)
    }
}

impl std::error::Error for InvalidArgument {}

fn required_str<'a>(args: &'a JsonObject, name: &str) -> Result<&'a str, InvalidArgument> {
    match args.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(_) => Err(InvalidArgument(format!("`{}` must be a non-empty string", name))),
        None => Err(InvalidArgument(format!("missing required parameter `{}`", name))),
    }
}

fn optional_str<'a>(args: &'a JsonObject, name: &str) -> Result<Option<&'a str>, InvalidArgument> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(InvalidArgument(format!("`{}` must be a string", name))),
    }
}

fn required_u64(args: &JsonObject, name: &str) -> Result<u64, InvalidArgument> {
    match args.get(name) {
        Some(v) => v
            .as_u64()
            .ok_or_else(|| InvalidArgument(format!("`{}` must be a positive integer", name))),
        None => Err(InvalidArgument(format!("missing required parameter `{}`", name))),
    }
}

/// Build an object schema from a `properties` map and required names.
fn object_schema(properties: Value, required: &[&str]) -> JsonObject {
    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), properties);
    schema.insert("required".to_string(), json!(required));
    schema
}

/// Successful result carrying `value` as pretty JSON text.
fn json_result(value: &Value) -> anyhow::Result<CallToolResult> {
    let text = serde_json::to_string_pretty(value)?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Failed result the model can read and react to.
pub fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}
