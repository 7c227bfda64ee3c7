//! Client registry and broadcast delivery.

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::event::HmrEvent;

/// A registered WebSocket client
struct RegisteredClient {
    id: u64,
    ws: WebSocket<TcpStream>,
}

/// Shared broadcast channel to all connected browser clients.
///
/// Cloneable; the client list is shared between the acceptor thread and
/// whoever broadcasts. Delivery is best-effort: a client whose send fails
/// is dropped from the list.
#[derive(Clone)]
pub struct HmrChannel {
    clients: Arc<Mutex<Vec<RegisteredClient>>>,
    next_id: Arc<AtomicU64>,
    /// Last error, replayed to clients that connect while it stands
    pending_error: Arc<Mutex<Option<HmrEvent>>>,
}

impl Default for HmrChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl HmrChannel {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            pending_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Register a freshly accepted connection. Performs the WebSocket
    /// handshake and sends the `connected` greeting.
    pub(super) fn add_client(&self, stream: TcpStream) {
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);

                let greeting = HmrEvent::connected(id);
                if let Err(e) = ws.send(Message::Text(greeting.to_json().into())) {
                    crate::log!("hmr"; "failed to send connected message: {}", e);
                    return;
                }

                // Replay a standing error so a fresh tab shows the overlay
                if let Some(ref err) = *self.pending_error.lock() {
                    let _ = ws.send(Message::Text(err.to_json().into()));
                }

                let mut clients = self.clients.lock();
                crate::debug!("hmr"; "client {} connected (total: {})", id, clients.len() + 1);
                clients.push(RegisteredClient { id, ws });
            }
            Err(e) => {
                crate::log!("hmr"; "handshake failed: {}", e);
            }
        }
    }

    /// Broadcast an event to all connected clients, pruning dead ones.
    /// Returns the number of clients that received it.
    pub fn broadcast(&self, event: &HmrEvent) -> usize {
        let msg = Message::Text(event.to_json().into());

        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("hmr"; "no clients connected");
            return 0;
        }

        let mut sent = 0;
        clients.retain_mut(|client| match client.ws.send(msg.clone()) {
            Ok(_) => {
                sent += 1;
                true
            }
            Err(e) => {
                let err = crate::error::Error::ChannelBroadcast(e.to_string());
                crate::debug!("hmr"; "client {} pruned: {}", client.id, err);
                false
            }
        });
        crate::debug!("hmr"; "broadcast to {} clients", sent);
        sent
    }

    /// Ask all clients to reload the page.
    pub fn request_reload(&self, path: Option<String>) -> usize {
        *self.pending_error.lock() = None;
        self.broadcast(&HmrEvent::reload(path))
    }

    /// Push a stylesheet update.
    pub fn push_style_update(&self, paths: Vec<String>) -> usize {
        *self.pending_error.lock() = None;
        self.broadcast(&HmrEvent::css_update(paths))
    }

    /// Push a script update.
    pub fn push_script_update(&self, paths: Vec<String>) -> usize {
        *self.pending_error.lock() = None;
        self.broadcast(&HmrEvent::js_update(paths))
    }

    /// Push a build error overlay. The error is remembered and replayed to
    /// clients that connect before the next successful update.
    pub fn push_error(&self, message: impl Into<String>, path: Option<String>) -> usize {
        let event = HmrEvent::error(message, path);
        *self.pending_error.lock() = Some(event.clone());
        self.broadcast(&event)
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Close every connection and clear the registry.
    pub fn close_all(&self) {
        let mut clients = self.clients.lock();
        for mut client in clients.drain(..) {
            let _ = client.ws.close(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_without_clients() {
        let channel = HmrChannel::new();
        assert_eq!(channel.request_reload(None), 0);
        assert_eq!(channel.client_count(), 0);
    }

    #[test]
    fn test_error_is_remembered_until_next_update() {
        let channel = HmrChannel::new();
        channel.push_error("boom", Some("a.md".into()));
        assert!(channel.pending_error.lock().is_some());
        channel.request_reload(None);
        assert!(channel.pending_error.lock().is_none());
    }
}
