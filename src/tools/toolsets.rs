//! Toolset grouping and one-shot registration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::ClientProvider;
use crate::error::ServerError;
use crate::tools::{
    CreateIssueHandler, GetIssueHandler, GetMeHandler, GetRepositoryHandler, GetViewerHandler,
    ToolHandler, ToolRegistry,
};
use crate::translations::Translations;

/// Name that enables every toolset.
pub const ALL_TOOLSETS: &str = "all";

const CONTEXT_TOOLSET: &str = "context";

/// A named group of tools enabled or disabled together.
pub struct Toolset {
    name: &'static str,
    description: String,
    tools: Vec<Arc<dyn ToolHandler>>,
}

impl Toolset {
    fn new(name: &'static str, description: String) -> Self {
        Self {
            name,
            description,
            tools: Vec::new(),
        }
    }

    fn with_tool<T: ToolHandler + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tools this toolset contributes, without write tools when `read_only`.
    pub fn tools(&self, read_only: bool) -> impl Iterator<Item = &Arc<dyn ToolHandler>> {
        self.tools
            .iter()
            .filter(move |tool| !read_only || tool.read_only())
    }
}

/// Every toolset this server knows about.
pub fn available_toolsets(clients: ClientProvider, t: &Translations) -> Vec<Toolset> {
    vec![
        Toolset::new(
            CONTEXT_TOOLSET,
            t.get(
                "TOOLSET_CONTEXT_DESCRIPTION",
                "Tools that describe the current user and the context they are working in",
            ),
        )
        .with_tool(GetMeHandler::new(clients, t)),
        Toolset::new(
            "repos",
            t.get("TOOLSET_REPOS_DESCRIPTION", "GitHub repository related tools"),
        )
        .with_tool(GetRepositoryHandler::new(clients, t)),
        Toolset::new(
            "issues",
            t.get("TOOLSET_ISSUES_DESCRIPTION", "GitHub issues related tools"),
        )
        .with_tool(GetIssueHandler::new(clients, t))
        .with_tool(CreateIssueHandler::new(clients, t)),
        Toolset::new(
            "users",
            t.get("TOOLSET_USERS_DESCRIPTION", "GitHub user related tools"),
        )
        .with_tool(GetViewerHandler::new(clients, t)),
    ]
}

/// Build the registry from the enabled toolset names.
///
/// The `context` toolset is always registered. Unknown names are a startup
/// error. With `read_only`, write tools are left out.
pub fn init_toolsets(
    enabled: &[String],
    read_only: bool,
    clients: ClientProvider,
    t: &Translations,
) -> Result<ToolRegistry, ServerError> {
    let toolsets = available_toolsets(clients, t);
    let all = enabled.iter().any(|name| name == ALL_TOOLSETS);

    for name in enabled {
        if name != ALL_TOOLSETS && !toolsets.iter().any(|ts| ts.name() == name) {
            return Err(ServerError::StartupConfiguration(format!(
                "unknown toolset `{}`",
                name
            )));
        }
    }

    let mut registry = ToolRegistry::new();
    for toolset in &toolsets {
        let on = all
            || toolset.name() == CONTEXT_TOOLSET
            || enabled.iter().any(|name| name == toolset.name());
        if !on {
            debug!(toolset = toolset.name(), "Toolset disabled");
            continue;
        }
        for tool in toolset.tools(read_only) {
            registry = registry.register(tool.clone());
        }
    }

    info!(
        tools = registry.len(),
        read_only,
        "Registered GitHub toolsets"
    );
    Ok(registry)
}
