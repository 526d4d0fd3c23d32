//! Command-line interface for the taskgate-server binary.

use clap::Parser;
use std::path::PathBuf;

/// taskgate - token-gated task tracking API
///
/// Serves the task API behind stateless bearer-token authentication.
/// The signing secret is read from the environment variable named in the
/// configuration file (`JWT_SECRET` unless overridden).
#[derive(Parser, Debug)]
#[command(
    name = "taskgate-server",
    version,
    about = "taskgate - token-gated task tracking API",
    after_help = "EXAMPLES:\n    \
                  taskgate-server                        # Start with ./taskgate.toml or defaults\n    \
                  taskgate-server --config prod.toml     # Use a custom config file\n    \
                  taskgate-server --port 9000 --verbose  # Override the port, debug logging"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "taskgate.toml", env = "TASKGATE_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the listen host from the configuration file
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port from the configuration file
    #[arg(long)]
    pub port: Option<u16>,
}
