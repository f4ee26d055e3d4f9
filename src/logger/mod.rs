//! Logger module
//!
//! Named logging entry points for the server, emitted as `tracing` events:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - API outcome, store, error and warning logging
//!
//! `init` installs the `tracing-subscriber` formatter that renders them.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use std::io;
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};

/// Initialize the global subscriber
///
/// Should be called once at application startup. `RUST_LOG` overrides
/// `logging.level`.
pub fn init(config: &LoggingConfig) -> io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let writer = writer::make_writer(config.log_file.as_deref())?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.log_file.is_none());

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(io::Error::other)
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    info!("======================================");
    info!("Issue tracker started successfully");
    info!("Listening on: http://{addr}/api/issues/{{project}}");
    info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        info!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.log_file {
        info!("Log file: {path}");
    }
    info!("CORS: {}", if config.http.enable_cors { "enabled" } else { "disabled" });
    info!("======================================");
}

pub fn log_store_opened(location: &str, documents: usize) {
    info!(location, documents, "Issue store ready");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    error!("{message}");
}

pub fn log_warning(message: &str) {
    warn!("{message}");
}

/// Outcome of one issue API call, as reported to the client
pub fn log_api_request(method: &str, project: &str, outcome: &str) {
    info!(target: "issue_tracker::api", method, project, outcome);
}

/// A store failure hidden behind a generic client error
pub fn log_store_error(operation: &str, err: &impl std::fmt::Display) {
    error!(operation, "Issue store failure: {err}");
}

pub fn log_unknown_filter(key: &str) {
    debug!(key, "Query key names no issue field; no issue can match");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    info!(target: "issue_tracker::access", "{}", entry.format(format));
}

pub fn log_shutdown(reason: &str) {
    info!("Shutting down: {reason}");
}

pub fn log_drain_complete(remaining: usize) {
    if remaining == 0 {
        info!("All connections closed");
    } else {
        warn!("Exiting with {remaining} connection(s) still open");
    }
}
