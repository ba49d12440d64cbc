//! WebSocket transport for the client.
//!
//! Provides [`ConnectedTransport`] which handles WebSocket I/O for frame
//! transport. This is a thin layer that just moves text frames - protocol
//! logic remains in the Sans-IO [`crate::Codec`].
//!
//! There is no retry or reconnection here: when the connection dies the task
//! reports one terminal event and stops. Reconnecting is the owner's call.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::protocol::Message};

use crate::conn::WireFrame;

/// Close code used when the peer vanished without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code used when the peer closed without a status.
const NO_STATUS: u16 = 1005;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),
}

/// I/O notifications delivered to the driver.
#[derive(Debug)]
pub enum TransportEvent {
    /// The opening handshake finished; queued sends may flush.
    Open,
    /// One inbound frame.
    Frame(WireFrame),
    /// The peer closed the connection.
    Closed {
        /// WebSocket close code.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
    /// Transport-level failure.
    Error(String),
}

/// Handle to a connected WebSocket with channel-based frame transport.
///
/// Frames are sent/received via the channels; an internal task handles the
/// socket I/O.
pub struct ConnectedTransport {
    /// Send text frames to the server.
    pub to_server: mpsc::UnboundedSender<String>,
    /// Receive I/O events from the connection task.
    pub from_server: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedTransport {
    /// Stop the connection task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Derive the WebSocket endpoint from an origin.
///
/// `http(s)` origins upgrade to `ws(s)`; a bare `host[:port]` gets the
/// default `/ws` path on a plain `ws` scheme. Explicit `ws(s)` URLs pass
/// through untouched.
pub fn endpoint_url(origin: &str) -> String {
    if origin.starts_with("ws://") || origin.starts_with("wss://") {
        return origin.to_owned();
    }
    if let Some(rest) = origin.strip_prefix("https://") {
        return format!("wss://{}", with_default_path(rest));
    }
    if let Some(rest) = origin.strip_prefix("http://") {
        return format!("ws://{}", with_default_path(rest));
    }
    format!("ws://{}", with_default_path(origin))
}

fn with_default_path(host: &str) -> String {
    if host.contains('/') { host.to_owned() } else { format!("{host}/ws") }
}

/// Connect to a chat server endpoint.
///
/// Returns a [`ConnectedTransport`] once the opening handshake completes;
/// the spawned task emits [`TransportEvent::Open`] as its first event so the
/// driver can flush sends queued while connecting.
///
/// # Errors
///
/// [`TransportError::Connection`] when the endpoint is unreachable or the
/// handshake fails.
pub async fn connect(url: &str) -> Result<ConnectedTransport, TransportError> {
    let (socket, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| TransportError::Connection(format!("cannot connect to {url}: {e}")))?;

    let (to_server_tx, to_server_rx) = mpsc::unbounded_channel();
    let (from_server_tx, from_server_rx) = mpsc::channel(32);

    let handle = tokio::spawn(run_connection(socket, to_server_rx, from_server_tx));

    Ok(ConnectedTransport {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the connection, bridging between channels and the socket.
async fn run_connection(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut to_server: mpsc::UnboundedReceiver<String>,
    from_server: mpsc::Sender<TransportEvent>,
) {
    let (mut sink, mut stream) = socket.split();

    if from_server.send(TransportEvent::Open).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            outbound = to_server.recv() => match outbound {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::error!(error = %e, "websocket send failed");
                        let _ = from_server
                            .send(TransportEvent::Error(format!("send failed: {e}")))
                            .await;
                        return;
                    }
                },
                None => {
                    // Owner dropped the handle: close politely and stop
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                },
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if from_server.send(TransportEvent::Frame(WireFrame::Text(text))).await.is_err() {
                        return;
                    }
                },
                Some(Ok(Message::Binary(data))) => {
                    if from_server.send(TransportEvent::Frame(WireFrame::Binary(data))).await.is_err() {
                        return;
                    }
                },
                Some(Ok(Message::Close(close))) => {
                    let (code, reason) = match close {
                        Some(frame) => (u16::from(frame.code), frame.reason.into_owned()),
                        None => (NO_STATUS, String::new()),
                    };
                    let _ = from_server.send(TransportEvent::Closed { code, reason }).await;
                    return;
                },
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {},
                Some(Err(e)) => {
                    tracing::error!(error = %e, "websocket receive failed");
                    let _ = from_server
                        .send(TransportEvent::Error(format!("connection error: {e}")))
                        .await;
                    return;
                },
                None => {
                    let _ = from_server
                        .send(TransportEvent::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: "connection lost".to_owned(),
                        })
                        .await;
                    return;
                },
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_upgrades_http_schemes() {
        assert_eq!(endpoint_url("http://chat.example"), "ws://chat.example/ws");
        assert_eq!(endpoint_url("https://chat.example"), "wss://chat.example/ws");
        assert_eq!(endpoint_url("https://chat.example/socket"), "wss://chat.example/socket");
    }

    #[test]
    fn endpoint_url_defaults_bare_hosts() {
        assert_eq!(endpoint_url("localhost:8080"), "ws://localhost:8080/ws");
    }

    #[test]
    fn endpoint_url_passes_ws_through() {
        assert_eq!(endpoint_url("wss://chat.example/ws"), "wss://chat.example/ws");
    }
}
