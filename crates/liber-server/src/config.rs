//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Default TTL for an in-flight sign-in attempt (10 minutes).
pub const DEFAULT_FLOW_TTL: Duration = Duration::from_secs(10 * 60);

/// Default idle TTL for browser sessions (8 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// Name of the browser session cookie.
pub const SESSION_COOKIE: &str = "liber_session";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Public base URL of this deployment, used to build the deep link
    /// encoded into each book's QR artifact.
    pub public_base_url: String,

    /// How long an in-flight sign-in attempt stays valid.
    pub flow_ttl: Duration,

    /// Idle TTL for browser sessions (`None` means sessions never expire).
    pub session_ttl: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".parse().unwrap(),
            public_base_url: "http://localhost:8000".to_string(),
            flow_ttl: DEFAULT_FLOW_TTL,
            session_ttl: Some(DEFAULT_SESSION_TTL),
        }
    }
}

impl ServerConfig {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: trim_trailing_slash(public_base_url.into()),
            ..Default::default()
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the sign-in flow TTL.
    pub fn with_flow_ttl(mut self, ttl: Duration) -> Self {
        self.flow_ttl = ttl;
        self
    }

    /// Set the session idle TTL.
    pub fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session_ttl = ttl;
        self
    }
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::new("https://books.example.com/")
            .with_bind_address("0.0.0.0:9000".parse().unwrap())
            .with_flow_ttl(Duration::from_secs(60))
            .with_session_ttl(None);

        assert_eq!(config.public_base_url, "https://books.example.com");
        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.flow_ttl, Duration::from_secs(60));
        assert!(config.session_ttl.is_none());
    }
}
