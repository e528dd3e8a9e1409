//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use url::Url;

use crate::error::ServerError;
use crate::lifecycle::DEFAULT_SHUTDOWN_GRACE;
use crate::tools::ALL_TOOLSETS;
use crate::transport::TransportBinding;

pub const DEFAULT_PORT: u16 = 3020;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// MCP streamable HTTP on `/mcp`
    #[value(name = "streamable-http")]
    StreamableHttp,
    /// Legacy MCP HTTP+SSE on `/sse` and `/message`
    Sse,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "github-mcp-remote")]
#[command(about = "Remote GitHub MCP server over HTTP", version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(
        long,
        env = "GITHUB_MCP_TRANSPORT",
        value_enum,
        default_value_t = TransportKind::StreamableHttp
    )]
    pub transport: TransportKind,

    /// Public URL clients reach this server at (required for `sse`)
    #[arg(long, env = "GITHUB_MCP_SERVER_URL")]
    pub base_url: Option<String>,

    /// Comma-separated toolsets to enable, or `all`
    #[arg(long, env = "GITHUB_TOOLSETS", value_delimiter = ',', default_value = ALL_TOOLSETS)]
    pub toolsets: Vec<String>,

    /// Leave out tools that modify GitHub state
    #[arg(long, env = "GITHUB_READ_ONLY", default_value_t = true, action = ArgAction::Set)]
    pub read_only: bool,

    /// Seconds in-flight requests get to finish after a shutdown signal
    #[arg(long, default_value_t = DEFAULT_SHUTDOWN_GRACE.as_secs())]
    pub shutdown_grace_secs: u64,
}

/// Validated settings the server runs with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub binding: TransportBinding,
    pub toolsets: Vec<String>,
    pub read_only: bool,
    pub shutdown_grace: Duration,
}

impl Config {
    pub fn validate(self) -> Result<ServerConfig, ServerError> {
        let binding = match self.transport {
            TransportKind::StreamableHttp => TransportBinding::Streamable,
            TransportKind::Sse => {
                let raw = self
                    .base_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        ServerError::StartupConfiguration(
                            "GITHUB_MCP_SERVER_URL must be set for the sse transport".to_string(),
                        )
                    })?;
                TransportBinding::EventStream {
                    base_url: parse_base_url(raw)?,
                }
            }
        };

        let toolsets: Vec<String> = self
            .toolsets
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(ServerConfig {
            addr: SocketAddr::new(self.host, self.port),
            binding,
            toolsets,
            read_only: self.read_only,
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ServerError> {
    let url = Url::parse(raw).map_err(|e| {
        ServerError::StartupConfiguration(format!("invalid GITHUB_MCP_SERVER_URL `{}`: {}", raw, e))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ServerError::StartupConfiguration(format!(
            "GITHUB_MCP_SERVER_URL must be http or https, got `{}`",
            other
        ))),
    }
}
