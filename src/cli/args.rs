//! CLI argument definitions using clap
//!
//! Commands:
//! - rawstore volume [--listen-addr ..] [--ns-dir ..] [--redis-url ..]
//! - rawstore router --nodes <url,url,..> [--listen-addr ..]
//!
//! Every flag can also be set through its `RD_*` environment variable.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::notifier::{DEFAULT_MAX_LEN, DEFAULT_STREAM_PREFIX};
use crate::observability::LogFormat;
use crate::service::DEFAULT_COMPRESSION_LEVEL;

/// rawstore - namespace-partitioned raw object store
#[derive(Parser, Debug)]
#[command(name = "rawstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format: pretty or json
    #[arg(long, env = "RD_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by both roles
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to listen on, `host:port` or `:port`
    #[arg(long, env = "RD_LISTEN_ADDR", default_value = ":6667")]
    pub listen_addr: String,

    /// Requests per client IP per minute; 0 disables limiting
    #[arg(long, env = "RD_RATE_LIMIT", default_value_t = 100)]
    pub rate_limit: u32,

    /// Largest accepted request body in bytes
    #[arg(long, env = "RD_MAX_BODY_BYTES", default_value_t = 32 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// CORS allowed origins (comma separated); empty allows any
    #[arg(long, env = "RD_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a storage node
    Volume {
        #[command(flatten)]
        server: ServerArgs,

        /// Directory holding one database file per namespace
        #[arg(long, env = "RD_NS_DIR", default_value = "data/")]
        ns_dir: PathBuf,

        /// Stream broker URL; change events are disabled without one
        #[arg(long, env = "RD_REDIS_URL")]
        redis_url: Option<String>,

        /// Emit change events for namespaces that do not choose
        #[arg(long, env = "RD_STREAM", default_value_t = false)]
        stream: bool,

        /// Approximate per-stream length cap
        #[arg(long, env = "RD_STREAM_LIMIT", default_value_t = DEFAULT_MAX_LEN)]
        stream_limit: u64,

        /// Prefix of per-namespace stream names
        #[arg(long, env = "RD_STREAM_PREFIX", default_value = DEFAULT_STREAM_PREFIX)]
        stream_prefix: String,

        /// zstd level for stored payloads
        #[arg(long, env = "RD_COMPRESSION_LEVEL", default_value_t = DEFAULT_COMPRESSION_LEVEL)]
        compression_level: i32,
    },

    /// Run the routing front
    Router {
        #[command(flatten)]
        server: ServerArgs,

        /// Storage node addresses, in bucket order (comma separated)
        #[arg(long, env = "RD_NODES", value_delimiter = ',', required = true)]
        nodes: Vec<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
