//! Tool registry for managing MCP tool handlers.
//!
//! Provides a `ToolHandler` trait for implementing tools and a `ToolRegistry`
//! for registering and invoking them. The registry is built once at startup
//! and only read afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use rmcp::model::{CallToolResult, JsonObject, Tool as McpTool};

use crate::auth::Context;

/// Context passed to tool handlers during execution.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Request-scoped context carrying the caller's credential, if any.
    pub ctx: Context,
}

impl ToolContext {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

/// Trait for handling MCP tool invocations.
///
/// Each tool implements this trait to define its schema and execution logic.
pub trait ToolHandler: Send + Sync {
    /// Returns the tool's name (e.g., "get_me").
    fn name(&self) -> &str;

    /// Returns the tool's human-readable title.
    fn title(&self) -> Option<&str> {
        None
    }

    /// Returns the tool's description.
    fn description(&self) -> &str;

    /// Returns the input schema for this tool.
    fn input_schema(&self) -> JsonObject;

    /// Whether the tool only reads from GitHub.
    fn read_only(&self) -> bool {
        true
    }

    /// Executes the tool with the given arguments.
    fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<CallToolResult>> + Send + '_>>;

    /// Converts this handler to an `McpTool` for use in `list_tools`.
    fn to_mcp_tool(&self) -> McpTool {
        use std::borrow::Cow;

        McpTool {
            name: Cow::Owned(self.name().to_string()),
            title: self.title().map(|s| s.to_string()),
            description: Some(Cow::Owned(self.description().to_string())),
            input_schema: Arc::new(self.input_schema()),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }
}

/// Registry for managing tool handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool handler.
    pub fn register(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.insert(handler.name().to_string(), handler);
        self
    }

    /// Register a tool handler from a type that implements `ToolHandler`.
    pub fn register_handler<T: ToolHandler + 'static>(self, handler: T) -> Self {
        self.register(Arc::new(handler))
    }

    /// Get a tool handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// List all registered tool names, sorted.
    pub fn list_names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Get all registered tools as `McpTool` instances for `list_tools`.
    pub fn list_tools(&self) -> Vec<McpTool> {
        self.handlers
            .values()
            .map(|handler| handler.to_mcp_tool())
            .collect()
    }

    /// Execute a tool by name with the given arguments.
    ///
    /// Returns `None` when no tool with that name is registered.
    pub async fn call_tool(
        &self,
        name: &str,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Option<Result<CallToolResult>> {
        let handler = self.get(name)?;
        Some(handler.execute(args, ctx).await)
    }

    /// Check if a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Return the number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Return `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;
    use serde_json::json;

    struct Echo;

    impl ToolHandler for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the arguments"
        }

        fn input_schema(&self) -> JsonObject {
            let mut schema = JsonObject::new();
            schema.insert("type".to_string(), json!("object"));
            schema
        }

        fn execute(
            &self,
            args: JsonObject,
            _ctx: &ToolContext,
        ) -> Pin<Box<dyn Future<Output = Result<CallToolResult>> + Send + '_>> {
            Box::pin(async move {
                let text = serde_json::to_string(&args)?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            })
        }
    }

    #[test]
    fn test_register_and_list() {
        let registry = ToolRegistry::new().register_handler(Echo);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
        assert_eq!(registry.list_names(), vec!["echo".to_string()]);

        let tools = registry.list_tools();
        assert_eq!(tools[0].name, "echo");
        assert_eq!(tools[0].description.as_deref(), Some("Echo the arguments"));
    }

    #[tokio::test]
    async fn test_call_tool() {
        let registry = ToolRegistry::new().register_handler(Echo);
        let ctx = ToolContext::new(Context::background());
        let mut args = JsonObject::new();
        args.insert("a".to_string(), json!(1));

        let result = registry.call_tool("echo", args, &ctx).await.unwrap().unwrap();
        assert_ne!(result.is_error, Some(true));
    }

    #[test]
    fn test_debug_lists_tool_names() {
        let registry = ToolRegistry::new().register_handler(Echo);
        assert_eq!(format!("{:?}", registry), r#"ToolRegistry { tools: ["echo"] }"#);
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let registry = ToolRegistry::new();
        let ctx = ToolContext::new(Context::background());
        assert!(
            registry
                .call_tool("missing", JsonObject::new(), &ctx)
                .await
                .is_none()
        );
    }
}
