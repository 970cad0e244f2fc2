//! Core application infrastructure: CLI, config, shutdown, banner.

pub(crate) mod banner;
pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;

pub use cli::CliConfig;
pub use config::AppConfig;
pub use shutdown::Shutdown;
