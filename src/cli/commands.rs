//! CLI command implementations
//!
//! Flags and environment are resolved into a role config, validated, and
//! only then is anything opened: the namespace directory, the broker
//! connection, the listener. Any failure before serving is fatal.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http_server::{HttpServer, HttpServerConfig};
use crate::notifier::{ChangeNotifier, RedisPublisher};
use crate::observability::{init_logging, Event, MetricsRegistry};
use crate::routing::NodeTable;
use crate::service::{ServiceConfig, StorageService};

use super::args::{Cli, Command, ServerArgs};
use super::errors::{CliError, CliResult};

/// Storage node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    pub http: HttpServerConfig,
    pub ns_dir: PathBuf,
    pub redis_url: Option<String>,
    pub stream: bool,
    pub stream_limit: u64,
    pub stream_prefix: String,
    pub compression_level: i32,
}

impl VolumeConfig {
    /// Validate values clap cannot check on its own
    pub fn validate(&self) -> CliResult<()> {
        let levels = zstd::compression_level_range();
        if !levels.contains(&self.compression_level) {
            return Err(CliError::config_error(format!(
                "compression_level must be within {}..={}, got {}",
                levels.start(),
                levels.end(),
                self.compression_level
            )));
        }

        if self.stream_limit == 0 {
            return Err(CliError::config_error("stream_limit must be > 0"));
        }

        if self.stream_prefix.is_empty() || self.stream_prefix.contains(char::is_whitespace) {
            return Err(CliError::config_error(format!(
                "Invalid stream_prefix: '{}'",
                self.stream_prefix
            )));
        }

        if self.stream && self.redis_url.is_none() {
            return Err(CliError::config_error(
                "stream is enabled but no broker is configured (RD_REDIS_URL)",
            ));
        }

        Ok(())
    }

    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            ns_dir: self.ns_dir.clone(),
            stream: self.stream,
            compression_level: self.compression_level,
        }
    }
}

/// Routing front configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub http: HttpServerConfig,
    pub nodes: Vec<String>,
}

impl RouterConfig {
    /// Build the node table, rejecting an empty or malformed list
    pub fn node_table(&self) -> CliResult<NodeTable> {
        Ok(NodeTable::new(&self.nodes)?)
    }
}

fn http_config(server: &ServerArgs) -> CliResult<HttpServerConfig> {
    let mut config = HttpServerConfig::from_listen_addr(&server.listen_addr)?;
    config.rate_limit = server.rate_limit;
    config.max_body_bytes = server.max_body_bytes;
    config.cors_origins = server
        .cors_origins
        .iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    Ok(config)
}

/// Main CLI entry point
///
/// Parses arguments, installs logging and dispatches to the role.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(cli.log_format)?;
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Volume {
            server,
            ns_dir,
            redis_url,
            stream,
            stream_limit,
            stream_prefix,
            compression_level,
        } => {
            let config = VolumeConfig {
                http: http_config(&server)?,
                ns_dir,
                redis_url,
                stream,
                stream_limit,
                stream_prefix,
                compression_level,
            };
            volume(config)
        }
        Command::Router { server, nodes } => {
            let config = RouterConfig {
                http: http_config(&server)?,
                nodes,
            };
            router(config)
        }
    }
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Run a storage node until Ctrl-C
pub fn volume(config: VolumeConfig) -> CliResult<()> {
    config.validate()?;
    tracing::info!(
        event = %Event::ConfigLoaded,
        role = "volume",
        addr = %config.http.socket_addr(),
        ns_dir = %config.ns_dir.display(),
        stream = config.stream,
        broker = config.redis_url.is_some(),
    );

    let rt = runtime()?;
    rt.block_on(async {
        tracing::info!(event = %Event::BootStart, role = "volume");
        let metrics = Arc::new(MetricsRegistry::new());

        let notifier = match &config.redis_url {
            Some(url) => {
                let publisher = RedisPublisher::connect(url, config.stream_limit).await?;
                Some(
                    ChangeNotifier::new(Arc::new(publisher), config.stream_prefix.clone())
                        .with_metrics(metrics.clone()),
                )
            }
            None => None,
        };

        let service = StorageService::open(&config.service_config(), notifier, metrics)?;
        HttpServer::volume(config.http.clone(), service).start().await?;
        Ok::<(), CliError>(())
    })
}

/// Run the routing front until Ctrl-C
pub fn router(config: RouterConfig) -> CliResult<()> {
    let nodes = config.node_table()?;
    tracing::info!(
        event = %Event::ConfigLoaded,
        role = "router",
        addr = %config.http.socket_addr(),
        nodes = nodes.len(),
    );

    let rt = runtime()?;
    rt.block_on(async {
        tracing::info!(event = %Event::BootStart, role = "router");
        HttpServer::router_role(config.http.clone(), nodes).start().await?;
        Ok::<(), CliError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume_config() -> VolumeConfig {
        VolumeConfig {
            http: HttpServerConfig::default(),
            ns_dir: PathBuf::from("data/"),
            redis_url: None,
            stream: false,
            stream_limit: crate::notifier::DEFAULT_MAX_LEN,
            stream_prefix: crate::notifier::DEFAULT_STREAM_PREFIX.to_string(),
            compression_level: crate::service::DEFAULT_COMPRESSION_LEVEL,
        }
    }

    #[test]
    fn test_default_volume_config_is_valid() {
        assert!(volume_config().validate().is_ok());
    }

    #[test]
    fn test_compression_level_out_of_range() {
        let mut config = volume_config();
        config.compression_level = 99;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stream_requires_broker() {
        let mut config = volume_config();
        config.stream = true;
        assert!(config.validate().is_err());

        config.redis_url = Some("redis://localhost:6379/0".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_stream_settings() {
        let mut config = volume_config();
        config.stream_limit = 0;
        assert!(config.validate().is_err());

        let mut config = volume_config();
        config.stream_prefix = "R D".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_router_requires_nodes() {
        let config = RouterConfig {
            http: HttpServerConfig::default(),
            nodes: vec![],
        };
        assert!(config.node_table().is_err());

        let config = RouterConfig {
            http: HttpServerConfig::default(),
            nodes: vec!["a:1".into(), "b:2".into()],
        };
        assert_eq!(config.node_table().unwrap().len(), 2);
    }

    #[test]
    fn test_http_config_from_args() {
        let args = ServerArgs {
            listen_addr: "127.0.0.1:7000".into(),
            rate_limit: 5,
            max_body_bytes: 1024,
            cors_origins: vec![" http://localhost:5173 ".into(), "".into()],
        };
        let config = http_config(&args).unwrap();
        assert_eq!(config.socket_addr(), "127.0.0.1:7000");
        assert_eq!(config.rate_limit, 5);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173".to_string()]);
    }
}
