//! Async WebSocket client for the scenario debug bridge.
//!
//! [`BridgeClient::connect`] opens the WebSocket, performs the
//! `bridge.hello` handshake to learn the peer's capture capabilities, and
//! spawns a background task that owns the connection. Typed requests go
//! through a clonable [`BridgeHandle`]; unsolicited console/network events
//! arrive on the client's event receiver.
//!
//! There is no automatic reconnection: capture runs are one-shot, and a
//! lost connection simply fails the remaining live-capture paths, which
//! then degrade to their fallback sources.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use vigil_core::prelude::*;

use crate::protocol::{
    parse_bridge_message, parse_capabilities, BridgeMessage, BridgeRequest, Capability,
    RequestTracker,
};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Capacity of the command channel (bounded, to apply backpressure).
const CMD_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the event channel (bounded, events can be bursty).
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ── Public types ──────────────────────────────────────────────────────────────

/// Current connection state of a [`BridgeClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial connection attempt in progress.
    Connecting,
    /// Connected and ready to exchange messages.
    Connected,
    /// Connection closed or lost; requests will fail.
    Disconnected,
}

/// Internal messages sent from the public API to the background task.
enum ClientCommand {
    /// Send a request and deliver the response to `response_tx`.
    SendRequest {
        method: String,
        params: Option<Value>,
        response_tx: oneshot::Sender<Result<Value>>,
    },
    /// Gracefully close the WebSocket and stop the background task.
    Disconnect,
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// ── BridgeHandle ──────────────────────────────────────────────────────────────

/// A clonable handle for making bridge requests.
///
/// Shares the underlying WebSocket connection with the [`BridgeClient`] that
/// created it. The handle becomes inoperable when the client (or its
/// background task) is dropped — requests return [`Error::ChannelClosed`].
#[derive(Clone)]
pub struct BridgeHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    state: Arc<std::sync::RwLock<ConnectionState>>,
    capabilities: Arc<std::sync::RwLock<HashSet<Capability>>>,
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("connection_state", &self.connection_state())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

impl BridgeHandle {
    /// Send a request and wait for the peer's response.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelClosed`] if the background task has exited.
    /// - [`Error::Protocol`] if the peer returned an error response.
    /// - [`Error::Bridge`] for transport failures.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let (response_tx, response_rx) = oneshot::channel();

        self.cmd_tx
            .send(ClientCommand::SendRequest {
                method: method.to_string(),
                params,
                response_tx,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;

        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Whether the peer advertised a capability in its hello ack.
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&capability)
    }

    /// Snapshot of the advertised capability set.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.capabilities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .copied()
            .collect()
    }

    /// Return the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Return `true` if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// A permanently disconnected handle with no capabilities.
    ///
    /// Used when the bridge endpoint is unreachable or not configured:
    /// every capability check fails and capture falls back to the backend
    /// sources.
    pub fn offline() -> Self {
        let (cmd_tx, _cmd_rx) = mpsc::channel(1);
        Self {
            cmd_tx,
            state: Arc::new(std::sync::RwLock::new(ConnectionState::Disconnected)),
            capabilities: Arc::new(std::sync::RwLock::new(HashSet::new())),
        }
    }

    /// A handle that reports the given capabilities but is backed by a
    /// disconnected dummy channel. Requests return [`Error::ChannelClosed`].
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn new_for_test(capabilities: &[Capability]) -> Self {
        let handle = Self::offline();
        {
            let mut guard = handle
                .state
                .write()
                .unwrap_or_else(|e| e.into_inner());
            *guard = ConnectionState::Connected;
        }
        handle.replace_capabilities(capabilities.to_vec());
        handle
    }

    pub(crate) fn replace_capabilities(&self, capabilities: Vec<Capability>) {
        let mut guard = self
            .capabilities
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *guard = capabilities.into_iter().collect();
    }
}

// ── BridgeClient ──────────────────────────────────────────────────────────────

/// Async WebSocket client for the scenario debug bridge.
///
/// Create with [`BridgeClient::connect`], issue requests via
/// [`BridgeClient::handle`], and consume streamed console/network events
/// from [`BridgeClient::event_receiver`].
pub struct BridgeClient {
    handle: BridgeHandle,
    /// Streamed-event receiver (not clonable; owned exclusively by this client).
    event_rx: mpsc::Receiver<BridgeMessage>,
}

impl BridgeClient {
    /// Connect to the debug bridge at `endpoint` and perform the handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::Endpoint`] if `endpoint` is not a `ws://`/`wss://` URL.
    /// - [`Error::Bridge`] if the connection cannot be established.
    /// - [`Error::Protocol`] if the peer rejects the `bridge.hello` handshake.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint).map_err(|_| Error::endpoint(endpoint))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::endpoint(endpoint));
        }

        info!("Connecting to debug bridge at {}", endpoint);
        let (ws_stream, _response) = connect_async(endpoint)
            .await
            .map_err(|err| Error::bridge(format!("failed to connect to bridge: {err}")))?;

        let (cmd_tx, cmd_rx) = mpsc::channel::<ClientCommand>(CMD_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<BridgeMessage>(EVENT_CHANNEL_CAPACITY);

        let handle = BridgeHandle {
            cmd_tx,
            state: Arc::new(std::sync::RwLock::new(ConnectionState::Connected)),
            capabilities: Arc::new(std::sync::RwLock::new(HashSet::new())),
        };

        // Pass the Arcs individually — handing the task a full handle clone
        // would keep cmd_tx alive and the task could never observe the
        // client being dropped.
        tokio::spawn(run_client_task(
            ws_stream,
            cmd_rx,
            event_tx,
            Arc::clone(&handle.state),
            Arc::clone(&handle.capabilities),
        ));

        // Handshake: announce ourselves and learn the peer's capabilities.
        let ack = handle.request("bridge.hello", None).await?;
        let capabilities = parse_capabilities(&ack);
        debug!("Bridge handshake complete: {:?}", capabilities);
        handle.replace_capabilities(capabilities);

        Ok(Self { handle, event_rx })
    }

    /// Create a clonable request handle that shares this client's connection.
    pub fn handle(&self) -> BridgeHandle {
        self.handle.clone()
    }

    /// Return a mutable reference to the streamed-event receiver.
    pub fn event_receiver(&mut self) -> &mut mpsc::Receiver<BridgeMessage> {
        &mut self.event_rx
    }

    /// Take ownership of the streamed-event receiver.
    pub fn into_event_receiver(self) -> mpsc::Receiver<BridgeMessage> {
        self.event_rx
    }

    /// Gracefully close the WebSocket connection.
    pub async fn disconnect(&self) {
        // Ignore the send error — if the channel is already closed the task
        // has already exited.
        let _ = self.handle.cmd_tx.send(ClientCommand::Disconnect).await;
    }

    /// Return `true` if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }
}

// ── Background task ───────────────────────────────────────────────────────────

/// Read/write select loop owning the WebSocket connection.
async fn run_client_task(
    ws_stream: WsStream,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
    event_tx: mpsc::Sender<BridgeMessage>,
    state: Arc<std::sync::RwLock<ConnectionState>>,
    capabilities: Arc<std::sync::RwLock<HashSet<Capability>>>,
) {
    let mut tracker = RequestTracker::new();
    let (mut ws_sink, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            // ── Incoming WebSocket message ───────────────────────────────
            frame = ws_read.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_ws_text(text.as_str(), &mut tracker, &event_tx, &capabilities);
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        debug!("Bridge: received Close frame");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong/Binary — ignore
                    }
                    Some(Err(err)) => {
                        warn!("Bridge: WebSocket read error: {}", err);
                        break;
                    }
                    None => {
                        debug!("Bridge: WebSocket stream ended");
                        break;
                    }
                }
            }

            // ── Outgoing command from the public API ─────────────────────
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::SendRequest { method, params, response_tx }) => {
                        send_request(&method, params, response_tx, &mut tracker, &mut ws_sink)
                            .await;
                    }
                    Some(ClientCommand::Disconnect) | None => {
                        // Client dropped or asked to close — shut down cleanly.
                        let _ = ws_sink.send(WsMessage::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    tracker.fail_all("bridge connection closed");
    {
        let mut guard = state.write().unwrap_or_else(|e| e.into_inner());
        *guard = ConnectionState::Disconnected;
    }
    debug!("Bridge background task exiting");
}

/// Route an incoming WebSocket text frame to the tracker or event channel.
fn handle_ws_text(
    text: &str,
    tracker: &mut RequestTracker,
    event_tx: &mpsc::Sender<BridgeMessage>,
    capabilities: &Arc<std::sync::RwLock<HashSet<Capability>>>,
) {
    match parse_bridge_message(text) {
        Some(BridgeMessage::Response { id, result, error }) => {
            let outcome = match error {
                Some(message) => Err(Error::protocol(message)),
                None => Ok(result.unwrap_or(Value::Null)),
            };
            if !tracker.resolve(id, outcome) {
                debug!("Bridge: response for unknown request id {}", id);
            }
        }
        Some(BridgeMessage::Hello {
            capabilities: advertised,
        }) => {
            // The peer re-announced itself (e.g. after a reload).
            let mut guard = capabilities.write().unwrap_or_else(|e| e.into_inner());
            *guard = advertised.into_iter().collect();
        }
        Some(event) => {
            if let Err(err) = event_tx.try_send(event) {
                warn!("Bridge: event channel full or closed, dropping event: {}", err);
            }
        }
        None => {
            debug!("Bridge: ignoring unparseable frame: {}", &text[..text.len().min(120)]);
        }
    }
}

/// Register a pending request, serialize it, and write it to the sink.
///
/// Delivers an error to the caller if serialization or the send fails.
async fn send_request(
    method: &str,
    params: Option<Value>,
    response_tx: oneshot::Sender<Result<Value>>,
    tracker: &mut RequestTracker,
    ws_sink: &mut SplitSink<WsStream, WsMessage>,
) {
    // Register before touching the wire so the slot exists if the response
    // races the send.
    let id = tracker.register_sender(response_tx);
    let request = BridgeRequest::new(id, method, params);

    let json = match serde_json::to_string(&request) {
        Ok(j) => j,
        Err(err) => {
            let _ = tracker.resolve(
                id,
                Err(Error::protocol(format!("failed to serialize request: {err}"))),
            );
            return;
        }
    };

    if let Err(err) = ws_sink.send(WsMessage::Text(json.into())).await {
        let _ = tracker.resolve(
            id,
            Err(Error::bridge(format!("failed to send request: {err}"))),
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_handle_reports_disconnected() {
        let handle = BridgeHandle::offline();
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
        assert!(!handle.is_connected());
        assert!(!handle.supports(Capability::Console));
        assert!(handle.capabilities().is_empty());
    }

    #[tokio::test]
    async fn test_offline_handle_request_fails_channel_closed() {
        let handle = BridgeHandle::offline();
        let outcome = handle.request("logs.requestBatch", None).await;
        assert!(matches!(outcome, Err(Error::ChannelClosed)));
    }

    #[test]
    fn test_test_handle_advertises_capabilities() {
        let handle = BridgeHandle::new_for_test(&[Capability::Console, Capability::Network]);
        assert!(handle.is_connected());
        assert!(handle.supports(Capability::Console));
        assert!(handle.supports(Capability::Network));
        assert!(!handle.supports(Capability::Screenshot));
    }

    #[test]
    fn test_replace_capabilities_overwrites_previous_set() {
        let handle = BridgeHandle::new_for_test(&[Capability::Console]);
        handle.replace_capabilities(vec![Capability::Screenshot]);
        assert!(!handle.supports(Capability::Console));
        assert!(handle.supports(Capability::Screenshot));
    }

    #[tokio::test]
    async fn test_connect_rejects_non_websocket_endpoint() {
        let outcome = BridgeClient::connect("http://localhost:9222").await;
        assert!(matches!(outcome, Err(Error::Endpoint { .. })));

        let outcome = BridgeClient::connect("not a url").await;
        assert!(matches!(outcome, Err(Error::Endpoint { .. })));
    }
}
