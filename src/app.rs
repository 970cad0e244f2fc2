//! Application wiring: config, registry, HTTP/WS server, shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::api;
use crate::core::banner::print_banner;
use crate::core::constants;
use crate::core::{AppConfig, CliConfig, Shutdown};
use crate::kernel::{Registry, Transport};

/// Initialize `tracing`: `BROKER_LOG` takes precedence, falling back to
/// `RUST_LOG`, falling back to a sensible default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(constants::ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info,fanout_server=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub struct App {
    config: AppConfig,
    registry: Arc<Registry>,
    shutdown: Shutdown,
}

impl App {
    pub fn new(cli: CliConfig) -> Result<Self> {
        let config = AppConfig::load(&cli).context("Failed to load configuration")?;
        let registry = Arc::new(Registry::new(config.kernel.clone()));
        let shutdown = Shutdown::new(registry.clone());
        Ok(Self {
            config,
            registry,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        print_banner(
            &self.config.server.host,
            self.config.server.port,
            self.config.kernel.backpressure_policy,
        );
        self.shutdown.install_signal_handlers();

        let heartbeat =
            tokio::spawn(heartbeat_loop(self.registry.clone(), self.shutdown.subscribe()));
        self.shutdown.register(heartbeat).await;

        let state = api::AppState {
            registry: self.registry.clone(),
            shutdown: self.shutdown.clone(),
            dev: self.config.dev,
        };
        let router = api::build_router(state);

        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .context("Invalid bind address")?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!(%addr, "Listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(self.shutdown.wait())
            .await
            .context("Server error")?;

        self.shutdown.shutdown().await;
        Ok(())
    }
}

/// Periodic liveness sweep over every connected subscriber (spec.md §4.4).
async fn heartbeat_loop(registry: Arc<Registry>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(constants::HEARTBEAT_INTERVAL_SECS));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for transport in registry.heartbeat_tick() {
                    transport.ping();
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
