//! CLI module for rawstore
//!
//! Provides command-line interface for:
//! - volume: Run a storage node
//! - router: Run the routing front

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, ServerArgs};
pub use commands::{router, run, run_command, volume, RouterConfig, VolumeConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
