//! # vigil-bridge - Debug-Bridge Client
//!
//! Typed async client for the scenario debug bridge. The bridge protocol
//! itself is an external contract (a small JSON envelope over WebSocket);
//! this crate owns the client plumbing:
//!
//! - [`BridgeClient`] / [`BridgeHandle`] - connection, handshake, and
//!   request/response correlation over a background task
//! - [`capture`] - typed capture operations (`logs.requestBatch`,
//!   `network.requestBatch`, `logs.configure`, `network.configure`)
//! - [`RecentBuffer`] - bounded rolling buffers of streamed events, the
//!   soft-fallback source when a live batch request fails
//! - [`protocol`] - envelope parsing and the request tracker
//!
//! Enable the `test-helpers` feature to construct disconnected
//! [`BridgeHandle`]s with a chosen capability set in downstream tests.

pub mod buffer;
pub mod capture;
pub mod client;
pub mod protocol;

pub use buffer::RecentBuffer;
pub use capture::{
    configure_logs, configure_network, request_log_batch, request_network_batch, ConsoleBatch,
    LogBatchOptions, LogCaptureConfig, NetworkBatch, NetworkBatchOptions, NetworkCaptureConfig,
};
pub use client::{BridgeClient, BridgeHandle, ConnectionState};
pub use protocol::{parse_bridge_message, BridgeMessage, Capability};
