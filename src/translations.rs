//! Overridable user-facing strings.
//!
//! Every tool, toolset, and resource string is looked up by a key starting
//! with `TOOL_`, `TOOLSET_`, or `RESOURCE_`. An environment variable
//! `GITHUB_MCP_<KEY>` replaces the built-in text. Other `GITHUB_MCP_*`
//! variables, such as `GITHUB_MCP_SERVER_URL`, are configuration and never
//! load as translations.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

const ENV_PREFIX: &str = "GITHUB_MCP_";
const KEY_PREFIXES: &[&str] = &["TOOL_", "TOOLSET_", "RESOURCE_"];

/// Key-to-text lookup shared by all toolsets.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    overrides: Arc<HashMap<String, String>>,
}

impl Translations {
    /// Collect overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::vars_os()
                .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?))),
        )
    }

    /// Collect overrides from `(name, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides = vars
            .into_iter()
            .filter_map(|(name, value)| {
                let key = name.strip_prefix(ENV_PREFIX)?;
                KEY_PREFIXES
                    .iter()
                    .any(|prefix| key.starts_with(prefix))
                    .then(|| (key.to_string(), value))
            })
            .collect();
        Self {
            overrides: Arc::new(overrides),
        }
    }

    /// Text for `key`, or `default` when no override exists.
    pub fn get(&self, key: &str, default: &str) -> String {
        self.overrides
            .get(&key.to_uppercase())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}
