//! Async session loop.
//!
//! Drives a [`Bridge`] against the WebSocket transport: UI commands flow in
//! through a channel, [`Update`]s flow out, and the loop stops once the
//! connection is lost. There is no automatic reconnection - the owner calls
//! [`connect`] again when it wants a new session.

use palaver_client::transport::{self, ConnectedTransport, TransportError, TransportEvent};
use tokio::sync::mpsc;

use crate::{Bridge, Command, Update};

/// Handle to a running chat session.
pub struct Session {
    /// Commands from the UI.
    pub commands: mpsc::UnboundedSender<Command>,
    /// Updates for the UI.
    pub updates: mpsc::Receiver<Update>,
    abort_handle: tokio::task::AbortHandle,
}

impl Session {
    /// Stop the session task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Connect to a chat server and run the protocol loop.
///
/// `origin` is resolved through [`transport::endpoint_url`], so both HTTP
/// origins and explicit `ws(s)` URLs work.
///
/// # Errors
///
/// [`TransportError`] when the connection cannot be established. After a
/// later connection loss the session delivers [`Update::ConnectionLost`] and
/// ends; reconnecting is the caller's decision.
pub async fn connect(origin: &str) -> Result<Session, TransportError> {
    let url = transport::endpoint_url(origin);

    let mut bridge = Bridge::new();
    bridge.open_connection();

    let transport = transport::connect(&url).await?;

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::channel(32);

    let handle = tokio::spawn(run_session(bridge, transport, command_rx, update_tx));

    Ok(Session { commands: command_tx, updates: update_rx, abort_handle: handle.abort_handle() })
}

/// Run one session until the connection dies or the owner goes away.
async fn run_session(
    mut bridge: Bridge,
    mut transport: ConnectedTransport,
    mut commands: mpsc::UnboundedReceiver<Command>,
    updates: mpsc::Sender<Update>,
) {
    loop {
        let batch = tokio::select! {
            command = commands.recv() => match command {
                Some(command) => bridge.handle_command(command),
                None => break,
            },
            event = transport.from_server.recv() => match event {
                Some(TransportEvent::Open) => bridge.connection_opened(),
                Some(TransportEvent::Frame(frame)) => bridge.take_frame(frame),
                Some(TransportEvent::Closed { code, reason }) => {
                    bridge.connection_closed(code, &reason)
                },
                Some(TransportEvent::Error(message)) => bridge.transport_error(&message),
                None => break,
            },
        };

        for text in bridge.take_outgoing() {
            if transport.to_server.send(text).is_err() {
                tracing::error!("connection task is gone; dropping outgoing frames");
                break;
            }
        }

        let mut lost = false;
        for update in batch {
            if matches!(update, Update::ConnectionLost { .. }) {
                lost = true;
            }
            if updates.send(update).await.is_err() {
                // UI went away; nothing left to drive
                transport.stop();
                return;
            }
        }
        if lost {
            break;
        }
    }

    transport.stop();
}
