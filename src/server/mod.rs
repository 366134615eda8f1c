// Server module entry
// Listener setup, connection serving and the accept loop

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use connection::accept_connection;
pub use listener::create_reusable_listener;
pub use signal::{start_signal_handler, ShutdownSignal};

/// Accept connections until shutdown is requested
///
/// Connections already being served finish in their own tasks.
pub async fn run(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<ShutdownSignal>) {
    let active_connections = Arc::new(AtomicUsize::new(0));

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
            () = shutdown.wait() => {
                logger::log_info("Listener closed");
                break;
            }
        }
    }
}
