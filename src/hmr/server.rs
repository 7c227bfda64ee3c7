//! WebSocket server for hot updates.
//!
//! Binds a local TCP listener and hands accepted connections to the
//! [`HmrChannel`](super::HmrChannel) for the handshake.

use std::net::TcpListener;

use anyhow::Result;

use super::channel::HmrChannel;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Start the WebSocket server on `base_port` (or the first free port above
/// it). Returns the port actually bound.
pub fn start_hmr_server(base_port: u16, channel: HmrChannel) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    // Acceptor thread; exits with the process
    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("hmr"; "connection from {}", addr);
                    // Blocking mode for the handshake
                    let _ = stream.set_nonblocking(false);
                    channel.add_client(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("hmr"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{}", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind hot-update server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_retry_on_conflict() {
        let held = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = held.local_addr().unwrap().port();

        let (listener, port) = try_bind_port(base, MAX_PORT_RETRIES).unwrap();
        assert_ne!(port, base);
        assert_eq!(listener.local_addr().unwrap().port(), port);
    }
}
