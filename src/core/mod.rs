//! Process-wide serve state and graceful shutdown.
//!
//! Two orthogonal flags:
//! - `SERVING`: initial route table is built, requests can be resolved
//! - `SHUTDOWN`: Ctrl+C received, subsystems should wind down

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Site is ready to serve requests (initial build complete)
static SERVING: AtomicBool = AtomicBool::new(false);

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the watch/hmr subsystems
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Check if the site is ready to serve requests
pub fn is_serving() -> bool {
    SERVING.load(Ordering::SeqCst)
}

/// Mark the site as ready to serve (call after the initial build completes)
pub fn set_serving() {
    SERVING.store(true, Ordering::SeqCst);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// Before `register_server()` the handler exits the process directly; after,
/// it unblocks the HTTP server and notifies the background subsystems.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown.
///
/// Call after binding, before entering the request loop.
pub fn register_server(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serving_flag() {
        SERVING.store(false, Ordering::SeqCst);
        assert!(!is_serving());
        set_serving();
        assert!(is_serving());
    }
}
