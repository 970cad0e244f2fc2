//! Command-line argument parsing

use std::path::PathBuf;

use clap::Parser;

use super::constants::{
    ENV_BACKPRESSURE_POLICY, ENV_CONFIG, ENV_DEV, ENV_HOST, ENV_MAX_QUEUE_SIZE, ENV_PORT,
    ENV_RING_BUFFER_SIZE,
};
use super::config::BackpressurePolicy;

#[derive(Parser)]
#[command(name = "fanout")]
#[command(version, about = "In-process publish/subscribe broker kernel", long_about = None)]
pub struct Cli {
    /// Server host address
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to a JSON config file
    #[arg(long, short = 'c', env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Per-subscriber outbound queue capacity
    #[arg(long, env = ENV_MAX_QUEUE_SIZE)]
    pub max_queue_size: Option<usize>,

    /// Per-topic replay history capacity (0 disables replay)
    #[arg(long, env = ENV_RING_BUFFER_SIZE)]
    pub ring_buffer_size: Option<usize>,

    /// Backpressure policy applied when a subscriber's queue is full
    #[arg(long, env = ENV_BACKPRESSURE_POLICY, value_parser = parse_backpressure_policy)]
    pub backpressure_policy: Option<BackpressurePolicy>,

    /// Expose internal error detail in 500 responses (development only)
    #[arg(long, env = ENV_DEV)]
    pub dev: bool,
}

fn parse_backpressure_policy(s: &str) -> Result<BackpressurePolicy, String> {
    match s.to_uppercase().as_str() {
        "DROP_OLDEST" => Ok(BackpressurePolicy::DropOldest),
        "DISCONNECT" => Ok(BackpressurePolicy::Disconnect),
        _ => Err(format!(
            "Invalid backpressure policy '{}'. Valid options: DROP_OLDEST, DISCONNECT",
            s
        )),
    }
}

/// Configuration derived from CLI arguments, decoupled from `clap` for testing.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub max_queue_size: Option<usize>,
    pub ring_buffer_size: Option<usize>,
    pub backpressure_policy: Option<BackpressurePolicy>,
    pub dev: bool,
}

/// Parse CLI arguments and environment variables.
pub fn parse() -> CliConfig {
    let cli = Cli::parse();
    CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        max_queue_size: cli.max_queue_size,
        ring_buffer_size: cli.ring_buffer_size,
        backpressure_policy: cli.backpressure_policy,
        dev: cli.dev,
    }
}
