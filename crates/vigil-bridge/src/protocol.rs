//! Bridge message envelope parsing and request correlation.
//!
//! The debug bridge speaks a small JSON envelope over WebSocket: requests
//! `{id, method, params}`, responses `{id, result?, error?}`, and
//! unsolicited events `{event, params}`. The envelope itself is an external
//! contract; this module only parses it into typed messages and correlates
//! request ids with waiting callers.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;

use vigil_core::prelude::*;
use vigil_core::{ConsoleEntry, NetworkEntry};

// ── Capability ────────────────────────────────────────────────────────────────

/// Capture capabilities a bridge peer can advertise in its hello ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Console,
    Network,
    Screenshot,
    Inspect,
}

impl Capability {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "console" => Some(Self::Console),
            "network" => Some(Self::Network),
            "screenshot" => Some(Self::Screenshot),
            "inspect" => Some(Self::Inspect),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Network => "network",
            Self::Screenshot => "screenshot",
            Self::Inspect => "inspect",
        }
    }
}

/// Parse the capability list out of a `bridge.hello` result object.
///
/// Unrecognized capability names are skipped — newer peers may advertise
/// capabilities this client does not know about.
pub fn parse_capabilities(result: &Value) -> Vec<Capability> {
    result
        .get("capabilities")
        .and_then(Value::as_array)
        .map(|caps| {
            caps.iter()
                .filter_map(Value::as_str)
                .filter_map(Capability::parse)
                .collect()
        })
        .unwrap_or_default()
}

// ── Request envelope ──────────────────────────────────────────────────────────

/// Outgoing request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl BridgeRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            id,
            method: method.to_string(),
            params,
        }
    }
}

// ── Incoming messages ─────────────────────────────────────────────────────────

/// Fully typed incoming bridge message.
#[derive(Debug, Clone)]
pub enum BridgeMessage {
    /// Reply to a request this client sent.
    Response {
        id: u64,
        result: Option<Value>,
        error: Option<String>,
    },
    /// Console entry streamed by the peer.
    ConsoleEvent(ConsoleEntry),
    /// Network request summary streamed by the peer.
    NetworkEvent(NetworkEntry),
    /// Peer re-announced its capabilities (e.g. after a reload).
    Hello { capabilities: Vec<Capability> },
    /// Fallback for events this client does not understand.
    UnknownEvent { event: String, params: Value },
}

/// Parse one WebSocket text frame into a [`BridgeMessage`].
///
/// Returns `None` for frames that are not valid JSON or match neither the
/// response nor the event shape.
pub fn parse_bridge_message(text: &str) -> Option<BridgeMessage> {
    let value: Value = serde_json::from_str(text).ok()?;

    if let Some(event) = value.get("event").and_then(Value::as_str) {
        let params = value.get("params").cloned().unwrap_or(Value::Null);
        return Some(parse_event(event, params));
    }

    if let Some(id) = value.get("id").and_then(Value::as_u64) {
        let result = value.get("result").cloned();
        let error = value.get("error").map(error_message);
        return Some(BridgeMessage::Response { id, result, error });
    }

    None
}

/// Extract a human-readable message from a response `error` field, which may
/// be a bare string or an object carrying a `message`.
fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

fn parse_event(event: &str, params: Value) -> BridgeMessage {
    match event {
        "bridge.hello" => BridgeMessage::Hello {
            capabilities: parse_capabilities(&params),
        },
        "console.entry" => match parse_console_entry(&params) {
            Some(entry) => BridgeMessage::ConsoleEvent(entry),
            None => unknown(event, params),
        },
        "network.request" => match serde_json::from_value::<NetworkEntry>(params.clone()) {
            Ok(entry) => BridgeMessage::NetworkEvent(entry.sanitized()),
            Err(_) => unknown(event, params),
        },
        _ => unknown(event, params),
    }
}

fn unknown(event: &str, params: Value) -> BridgeMessage {
    BridgeMessage::UnknownEvent {
        event: event.to_string(),
        params,
    }
}

/// Parse a console entry leniently: the wire level is free-form text, so the
/// entry goes through [`ConsoleEntry::normalized`] rather than strict serde.
pub fn parse_console_entry(params: &Value) -> Option<ConsoleEntry> {
    let message = params.get("message").and_then(Value::as_str)?;
    let level = params.get("level").and_then(Value::as_str).unwrap_or("log");
    let timestamp_ms = params.get("timestampMs").and_then(Value::as_i64);
    let source = params
        .get("source")
        .and_then(Value::as_str)
        .map(str::to_owned);
    Some(ConsoleEntry::normalized(level, message, timestamp_ms, source))
}

// ── Request correlation ───────────────────────────────────────────────────────

/// Correlates outgoing request ids with oneshot response senders.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_id: u64,
    pending: HashMap<u64, oneshot::Sender<Result<Value>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and register a slot for its response.
    pub fn register(&mut self) -> (u64, oneshot::Receiver<Result<Value>>) {
        let (tx, rx) = oneshot::channel();
        let id = self.register_sender(tx);
        (id, rx)
    }

    /// Allocate an id for a caller-supplied response sender.
    ///
    /// Lets the I/O loop route a response straight to the requester without
    /// an intermediate forwarding task.
    pub fn register_sender(&mut self, tx: oneshot::Sender<Result<Value>>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.pending.insert(id, tx);
        id
    }

    /// Deliver a response to the waiting caller.
    ///
    /// Returns `false` if no request with that id is pending (stale or
    /// duplicate response).
    pub fn resolve(&mut self, id: u64, outcome: Result<Value>) -> bool {
        match self.pending.remove(&id) {
            Some(tx) => {
                // Receiver may have been dropped; nothing to do then.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Fail every pending request, e.g. when the connection drops.
    pub fn fail_all(&mut self, message: &str) {
        for (_, tx) in self.pending.drain() {
            let _ = tx.send(Err(Error::bridge(message)));
        }
    }

    /// Number of requests still awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
