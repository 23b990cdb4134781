//! HTTP Server Configuration
//!
//! Listen address, CORS origins, request body cap and per-IP rate limit.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::errors::{HttpServerError, HttpServerResult};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 6667)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body in bytes (default: 32 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Requests per client IP per window; 0 disables limiting
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Rate limit window in seconds (default: 60)
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    6667
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_rate_limit() -> u32 {
    100
}

fn default_rate_window_secs() -> u64 {
    60
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
            rate_limit: default_rate_limit(),
            rate_window_secs: default_rate_window_secs(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Config bound to `addr`, in `host:port` or `:port` form
    pub fn from_listen_addr(addr: &str) -> HttpServerResult<Self> {
        let (host, port) = parse_listen_addr(addr)?;
        Ok(Self {
            host,
            port,
            ..Default::default()
        })
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Resolve the bind address
    pub fn bind_addr(&self) -> HttpServerResult<SocketAddr> {
        self.socket_addr()
            .parse()
            .map_err(|_| HttpServerError::InvalidListenAddr(self.socket_addr()))
    }
}

/// Split `host:port`; an empty host binds every interface
fn parse_listen_addr(addr: &str) -> HttpServerResult<(String, u16)> {
    let invalid = || HttpServerError::InvalidListenAddr(addr.to_string());

    let (host, port) = addr.trim().rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    let host = match host.trim_start_matches('[').trim_end_matches(']') {
        "" => default_host(),
        h => h.to_string(),
    };
    Ok((host, port))
}
