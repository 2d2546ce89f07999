//! mb-speedtest: an HTTP bandwidth-test server
//!
//! Endpoints:
//! - `GET /api/download/Mb/{size}`: stream `size` megabits of synthetic data
//! - `POST /api/upload/Mb/{size}`: consume and discard `size` megabits
//! - `GET /api/ping`: liveness check
//!
//! Clients time the transfers themselves; the server only moves bytes.
//! Configuration via CLI arguments, environment, or TOML file.

mod config;
mod endpoints;
mod error;
mod generator;
mod server;

use config::Config;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        workers = config.workers,
        build_mode = ?config.build_mode,
        version = config::build_version(),
        "Starting mb-speedtest server"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(Server::new(config).run())
}
