//! Hot update broadcast.
//!
//! ```text
//! watch loop --[HmrEvent]--> HmrChannel --[JSON over WebSocket]--> browsers
//! ```

mod channel;
mod event;
mod server;

pub use channel::HmrChannel;
pub use event::{HmrEvent, UpdateKind};
pub use server::start_hmr_server;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_receives_broadcast() {
        let channel = HmrChannel::new();
        let port = start_hmr_server(0, channel.clone()).unwrap();

        let (mut ws, _) =
            tungstenite::connect(format!("ws://127.0.0.1:{}", port)).expect("connect failed");

        // Greeting arrives first
        let greeting = ws.read().unwrap();
        let parsed = HmrEvent::from_json(greeting.to_text().unwrap()).unwrap();
        assert!(matches!(parsed, HmrEvent::Connected { .. }));

        // Wait for the acceptor to register the client before broadcasting
        for _ in 0..50 {
            if channel.client_count() == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(channel.client_count(), 1);

        assert_eq!(channel.request_reload(Some("/post.md".into())), 1);
        let msg = ws.read().unwrap();
        let parsed = HmrEvent::from_json(msg.to_text().unwrap()).unwrap();
        assert!(matches!(parsed, HmrEvent::Reload { path: Some(p), .. } if p == "/post.md"));
    }

    #[test]
    fn test_dead_client_is_pruned() {
        let channel = HmrChannel::new();
        let port = start_hmr_server(0, channel.clone()).unwrap();

        let (ws, _) =
            tungstenite::connect(format!("ws://127.0.0.1:{}", port)).expect("connect failed");
        for _ in 0..50 {
            if channel.client_count() == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        drop(ws);
        std::thread::sleep(Duration::from_millis(50));

        // The first send may still reach a half-closed socket; keep
        // broadcasting until the write error surfaces and the client is
        // dropped from the registry
        for _ in 0..20 {
            channel.request_reload(None);
            if channel.client_count() == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(channel.client_count(), 0);
    }
}
