//! Process-level errors. Every variant here is fatal.

use std::fmt;
use std::io;
use std::net::SocketAddr;

#[derive(Debug)]
pub enum ServerError {
    /// Configuration or toolset registration is invalid; nothing was served.
    StartupConfiguration(String),
    /// The listener could not bind its address.
    ListenerBind { addr: SocketAddr, source: io::Error },
    /// The accept loop failed while serving.
    Serve(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartupConfiguration(msg) => write!(f, "Startup configuration error: {}", msg),
            Self::ListenerBind { addr, source } => {
                write!(f, "Failed to bind listener on {}: {}", addr, source)
            }
            Self::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ListenerBind { source, .. } => Some(source),
            Self::Serve(e) => Some(e),
            Self::StartupConfiguration(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        assert_eq!(
            ServerError::StartupConfiguration("missing base URL".to_string()).to_string(),
            "Startup configuration error: missing base URL"
        );

        let err = ServerError::ListenerBind {
            addr: "127.0.0.1:3020".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to bind listener on 127.0.0.1:3020: address in use"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
