// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths, env var prefixes, log targets)
pub const APP_NAME_LOWER: &str = "fanout";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "fanout.json";

/// Environment variable for an explicit config file path
pub const ENV_CONFIG: &str = "BROKER_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_LOG: &str = "BROKER_LOG";
pub const ENV_HOST: &str = "BROKER_HOST";
pub const ENV_PORT: &str = "BROKER_PORT";
pub const ENV_MAX_QUEUE_SIZE: &str = "BROKER_MAX_QUEUE_SIZE";
pub const ENV_RING_BUFFER_SIZE: &str = "BROKER_RING_BUFFER_SIZE";
pub const ENV_BACKPRESSURE_POLICY: &str = "BROKER_BACKPRESSURE_POLICY";
pub const ENV_DEV: &str = "BROKER_DEV";

// =============================================================================
// Server Defaults
// =============================================================================

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7777;

// =============================================================================
// Kernel Defaults (spec.md §6 Configuration)
// =============================================================================

/// Per-subscriber outbound queue capacity.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

/// Per-topic replay history capacity. Zero disables replay.
pub const DEFAULT_RING_BUFFER_SIZE: usize = 100;

// =============================================================================
// Heartbeat / Shutdown (spec.md §4.4, §5)
// =============================================================================

/// Heartbeat interval: the controller pings and expects a pong within it.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Ceiling on how long graceful shutdown waits for subscriber queues to drain.
pub const SHUTDOWN_DRAIN_TIMEOUT_SECS: u64 = 5;

/// Ceiling on how long graceful shutdown waits for background tasks overall.
pub const SHUTDOWN_TASK_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// WebSocket close codes (spec.md §6)
// =============================================================================

pub const CLOSE_CODE_SERVER_SHUTDOWN: u16 = 1001;
pub const CLOSE_CODE_SLOW_CONSUMER: u16 = 1008;
/// Not named by spec.md's two explicit close codes; 1000 (normal closure)
/// is the sensible default for a session the heartbeat declared dead.
pub const CLOSE_CODE_HEARTBEAT_TIMEOUT: u16 = 1000;
pub const REASON_SERVER_SHUTDOWN: &str = "Server shutting down";
pub const REASON_SLOW_CONSUMER: &str = "SLOW_CONSUMER";
pub const REASON_HEARTBEAT_TIMEOUT: &str = "HEARTBEAT_TIMEOUT";
