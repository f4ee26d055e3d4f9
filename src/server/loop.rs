// Server loop module
// Accepts connections until shutdown, then waits for open ones to drain

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Shutdown behaviour of the accept loop
pub struct ServerLoopConfig {
    /// Fired once to stop accepting
    pub shutdown: Arc<Notify>,
    /// How long open connections get to finish after shutdown
    pub drain_timeout: Duration,
}

/// Run the accept loop until `shutdown` fires, then drain.
///
/// Returns the number of connections still open when the drain timed out.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    config: ServerLoopConfig,
) -> usize {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = config.shutdown.notified() => break,
        }
    }

    drop(listener);
    let remaining = drain(&active_connections, config.drain_timeout).await;
    logger::log_drain_complete(remaining);
    remaining
}

async fn drain(active_connections: &AtomicUsize, timeout: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let open = active_connections.load(Ordering::SeqCst);
        if open == 0 || tokio::time::Instant::now() >= deadline {
            return open;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
