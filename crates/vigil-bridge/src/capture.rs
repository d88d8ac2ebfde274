//! Typed capture operations over the bridge.
//!
//! Thin wrappers that build request params, call [`BridgeHandle::request`],
//! and parse the result into core types. Capability checks happen here so
//! callers get [`Error::CaptureUnavailable`] instead of a peer-side
//! method-not-found error.

use serde_json::{json, Value};

use vigil_core::prelude::*;
use vigil_core::{ConsoleEntry, ConsoleLevel, NetworkEntry};

use crate::client::BridgeHandle;
use crate::protocol::{parse_console_entry, Capability};

// ── Options and results ───────────────────────────────────────────────────────

/// Options for a console log batch request.
#[derive(Debug, Clone)]
pub struct LogBatchOptions {
    /// Upper bound on entries the peer should return.
    pub max_entries: usize,
}

/// Options for a network batch request.
#[derive(Debug, Clone)]
pub struct NetworkBatchOptions {
    /// Upper bound on events the peer should return.
    pub max_events: usize,
}

/// A console batch as returned by the peer.
#[derive(Debug, Clone, Default)]
pub struct ConsoleBatch {
    pub entries: Vec<ConsoleEntry>,
    /// Total entries the peer has seen, before its own windowing.
    pub total: usize,
}

/// A network batch as returned by the peer.
#[derive(Debug, Clone, Default)]
pub struct NetworkBatch {
    pub entries: Vec<NetworkEntry>,
    /// Total events the peer has seen, before its own windowing.
    pub total: usize,
}

/// Console capture configuration pushed to the peer.
#[derive(Debug, Clone)]
pub struct LogCaptureConfig {
    pub capture: bool,
    /// Minimum severity worth streaming; `None` streams everything.
    pub min_level: Option<ConsoleLevel>,
}

/// Network capture configuration pushed to the peer.
#[derive(Debug, Clone)]
pub struct NetworkCaptureConfig {
    pub capture: bool,
    /// Whether the peer should include request/response bodies in events.
    pub include_bodies: bool,
}

// ── Batch requests ────────────────────────────────────────────────────────────

/// Request a batch of recent console entries from the peer.
///
/// # Errors
///
/// - [`Error::CaptureUnavailable`] when the peer never advertised console
///   capture.
/// - Transport/protocol errors from the underlying request.
pub async fn request_log_batch(
    handle: &BridgeHandle,
    options: &LogBatchOptions,
) -> Result<ConsoleBatch> {
    if !handle.supports(Capability::Console) {
        return Err(Error::capture_unavailable("console"));
    }
    let result = handle
        .request(
            "logs.requestBatch",
            Some(json!({ "maxEntries": options.max_entries })),
        )
        .await?;
    Ok(parse_console_batch(&result))
}

/// Request a batch of recent network events from the peer.
pub async fn request_network_batch(
    handle: &BridgeHandle,
    options: &NetworkBatchOptions,
) -> Result<NetworkBatch> {
    if !handle.supports(Capability::Network) {
        return Err(Error::capture_unavailable("network"));
    }
    let result = handle
        .request(
            "network.requestBatch",
            Some(json!({ "maxEvents": options.max_events })),
        )
        .await?;
    Ok(parse_network_batch(&result))
}

// ── Capture configuration ─────────────────────────────────────────────────────

/// Configure console streaming on the peer. Best-effort on callers' part —
/// a failure here degrades to batch-only capture.
pub async fn configure_logs(handle: &BridgeHandle, config: &LogCaptureConfig) -> Result<()> {
    let params = json!({
        "capture": config.capture,
        "minLevel": config.min_level.map(ConsoleLevel::as_str),
    });
    handle.request("logs.configure", Some(params)).await?;
    Ok(())
}

/// Configure network streaming on the peer.
pub async fn configure_network(handle: &BridgeHandle, config: &NetworkCaptureConfig) -> Result<()> {
    let params = json!({
        "capture": config.capture,
        "includeBodies": config.include_bodies,
    });
    handle.request("network.configure", Some(params)).await?;
    Ok(())
}

// ── Result parsing ────────────────────────────────────────────────────────────

/// Parse a `logs.requestBatch` result, dropping malformed entries.
fn parse_console_batch(result: &Value) -> ConsoleBatch {
    let entries: Vec<ConsoleEntry> = result
        .get("entries")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_console_entry).collect())
        .unwrap_or_default();
    let total = total_or_len(result, entries.len());
    ConsoleBatch { entries, total }
}

/// Parse a `network.requestBatch` result, dropping malformed events and
/// applying the per-field trims.
fn parse_network_batch(result: &Value) -> NetworkBatch {
    let entries: Vec<NetworkEntry> = result
        .get("entries")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<NetworkEntry>(item.clone()).ok())
                .map(NetworkEntry::sanitized)
                .collect()
        })
        .unwrap_or_default();
    let total = total_or_len(result, entries.len());
    NetworkBatch { entries, total }
}

/// Read the peer-reported `total`, falling back to the parsed length.
///
/// The fallback never under-reports: a peer that omits `total` (or reports
/// fewer than it sent) still yields a consistent truncation computation.
fn total_or_len(result: &Value, len: usize) -> usize {
    result
        .get("total")
        .and_then(Value::as_u64)
        .map(|t| t as usize)
        .unwrap_or(len)
        .max(len)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_console_batch_with_total() {
        let result = json!({
            "total": 500,
            "entries": [
                {"level": "warn", "message": "a"},
                {"level": "bogus", "message": "b"},
            ]
        });
        let batch = parse_console_batch(&result);
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.total, 500);
        assert_eq!(batch.entries[0].level, ConsoleLevel::Warn);
        assert_eq!(batch.entries[1].level, ConsoleLevel::Log);
    }

    #[test]
    fn test_parse_console_batch_missing_total_uses_len() {
        let result = json!({"entries": [{"level": "info", "message": "x"}]});
        let batch = parse_console_batch(&result);
        assert_eq!(batch.total, 1);
    }

    #[test]
    fn test_parse_console_batch_drops_malformed_entries() {
        let result = json!({
            "entries": [
                {"level": "info"},
                {"level": "info", "message": "kept"},
            ]
        });
        let batch = parse_console_batch(&result);
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.entries[0].message, "kept");
    }

    #[test]
    fn test_parse_network_batch_sanitizes_and_counts() {
        let result = json!({
            "total": 3,
            "entries": [
                {"method": "GET", "url": format!("https://x.dev/{}", "q".repeat(3000))},
                {"not": "an entry"},
            ]
        });
        let batch = parse_network_batch(&result);
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.total, 3);
        assert_eq!(
            batch.entries[0].url.chars().count(),
            vigil_core::MAX_URL_CHARS
        );
    }

    #[test]
    fn test_total_never_under_reports_parsed_length() {
        let result = json!({
            "total": 1,
            "entries": [
                {"method": "GET", "url": "https://x.dev/a"},
                {"method": "GET", "url": "https://x.dev/b"},
            ]
        });
        let batch = parse_network_batch(&result);
        assert_eq!(batch.total, 2);
    }

    #[tokio::test]
    async fn test_request_log_batch_without_capability() {
        let handle = BridgeHandle::new_for_test(&[Capability::Network]);
        let outcome = request_log_batch(&handle, &LogBatchOptions { max_entries: 10 }).await;
        assert!(matches!(outcome, Err(Error::CaptureUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_request_network_batch_without_capability() {
        let handle = BridgeHandle::new_for_test(&[]);
        let outcome =
            request_network_batch(&handle, &NetworkBatchOptions { max_events: 10 }).await;
        assert!(matches!(outcome, Err(Error::CaptureUnavailable { .. })));
    }
}
