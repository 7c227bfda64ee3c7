//! Development server.
//!
//! Resolution order for a request: plugin extra routes, then the current
//! route-table snapshot, then static files (assets dir, content dir), 404.

mod path;
mod response;
mod session;

pub use path::{resolve_path, url_to_route};
pub use response::render_shell;
pub use session::{WatchSession, spawn_watch_session};

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::config::BreezeConfig;
use crate::plugin::ServerHandle;
use crate::routes::RouteStore;
use crate::{debug, log};

/// Default WebSocket port for hot updates
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Route the client bootstrap script is served from (in-memory).
pub const HOTUPDATE_JS_ROUTE: &str = "/__breeze/hotupdate.js";

/// Reconnect attempts the client makes before forcing a reload.
pub const MAX_CLIENT_RECONNECTS: u32 = 10;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Actual WebSocket port (may differ from DEFAULT_WS_PORT after retry).
/// Zero means the hot update channel is not running.
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Record the bound WebSocket port (called after the channel binds)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

fn get_actual_ws_port() -> Option<u16> {
    match ACTUAL_WS_PORT.load(Ordering::Relaxed) {
        0 => None,
        port => Some(port),
    }
}

/// Shared request-handling state.
pub struct ServeContext {
    pub config: Arc<BreezeConfig>,
    pub routes: Arc<RouteStore>,
    /// Plugin-registered (route, body, content-type) responses.
    pub extra_routes: Vec<(String, String, &'static str)>,
}

impl ServeContext {
    pub fn new(config: Arc<BreezeConfig>, routes: Arc<RouteStore>, handle: ServerHandle) -> Self {
        Self {
            config,
            routes,
            extra_routes: handle.extra_routes,
        }
    }
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop.
///
/// Lets the caller run the initial build and spawn the watch session first
/// while early requests get a loading page.
pub fn bind_server(config: &BreezeConfig) -> Result<BoundServer> {
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        addr,
        shutdown_rx,
    })
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: std::net::IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

impl BoundServer {
    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Take the shutdown receiver for the watch session.
    pub fn shutdown_rx(&self) -> channel::Receiver<()> {
        self.shutdown_rx.clone()
    }

    /// Start the request loop (blocking until shutdown unblocks the server).
    pub fn run(self, ctx: ServeContext) {
        let ctx = Arc::new(ctx);
        // Thread pool keeps one slow request from blocking the rest
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .expect("failed to create thread pool");

        for request in self.server.incoming_requests() {
            let ctx = Arc::clone(&ctx);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &ctx) {
                    log!("serve"; "request error: {e}");
                }
            });
        }
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    // Bootstrap script is served from memory; it never touches disk
    let ws_port = get_actual_ws_port();
    if request.url() == HOTUPDATE_JS_ROUTE {
        if let Some(port) = ws_port {
            return response::respond_hotupdate_js(request, port);
        }
        return response::respond_not_found(request, &ctx.config);
    }

    let route = url_to_route(request.url());

    if let Some((_, body, content_type)) = ctx
        .extra_routes
        .iter()
        .find(|(extra, _, _)| url_to_route(extra) == route)
    {
        return response::respond_extra_route(request, body, content_type);
    }

    if !crate::core::is_serving() {
        return response::respond_loading(request);
    }

    if let Some(file) = ctx.routes.resolve(&route) {
        debug!("serve"; "route hit: {}", route);
        return response::respond_page(request, &file, &ctx.config, ws_port.is_some());
    }

    // Static fallback: assets dir first, then raw files beside content
    for root in [&ctx.config.build.assets, &ctx.config.build.content] {
        if let Some(path) = resolve_path(request.url(), root) {
            return response::respond_file(request, &path, &ctx.config);
        }
    }

    response::respond_not_found(request, &ctx.config)
}
