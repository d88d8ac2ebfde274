//! Shared domain vocabulary for captured scenario data.
//!
//! These types are the common language between:
//! - `vigil-bridge` (parsing debug-bridge batches and events)
//! - `vigil-app` (panel state management and report assembly)
//! - the `vigil` binary (headless capture output)
//!
//! Free-text fields are trimmed at the capture boundary so a single noisy
//! entry cannot blow up an outgoing report payload.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::format::trim_for_payload;

// ── Retention caps ────────────────────────────────────────────────────────────

/// Maximum combined app-log lines retained per capture.
pub const MAX_APP_LOG_LINES: usize = 200;
/// Maximum console entries retained per capture.
pub const MAX_CONSOLE_ENTRIES: usize = 150;
/// Maximum network events retained per capture.
pub const MAX_NETWORK_EVENTS: usize = 150;

/// Maximum characters kept from a single console message.
pub const MAX_CONSOLE_MESSAGE_CHARS: usize = 2000;
/// Maximum characters kept from a request URL.
pub const MAX_URL_CHARS: usize = 2048;
/// Maximum characters kept from a network error description.
pub const MAX_ERROR_TEXT_CHARS: usize = 1500;
/// Maximum characters kept from a request identifier.
pub const MAX_REQUEST_ID_CHARS: usize = 128;

// ── ConsoleLevel ──────────────────────────────────────────────────────────────

/// Normalized console severity.
///
/// The wire carries free-form level strings ("warning", "err", "fatal", …);
/// [`ConsoleLevel::normalize`] folds them into this closed set. Anything
/// unrecognized becomes [`ConsoleLevel::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Error,
    Warn,
    Info,
    Log,
    Debug,
    Trace,
}

impl ConsoleLevel {
    /// Map a free-form level string to the closed severity set.
    ///
    /// Matching is case-insensitive. Aliases follow the conventions of the
    /// usual browser/logger vocabularies:
    /// - `error`, `err`, `fatal`, `critical`, `severe`, `exception` → Error
    /// - `warn`, `warning`, `caution` → Warn
    /// - `info`, `information`, `notice` → Info
    /// - `debug` → Debug
    /// - `trace`, `verbose`, `finest` → Trace
    /// - everything else (including `log`) → Log
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" | "err" | "fatal" | "critical" | "severe" | "exception" => Self::Error,
            "warn" | "warning" | "caution" => Self::Warn,
            "info" | "information" | "notice" => Self::Info,
            "debug" => Self::Debug,
            "trace" | "verbose" | "finest" => Self::Trace,
            _ => Self::Log,
        }
    }

    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Log => "log",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Whether this level indicates something went wrong.
    pub fn is_problem(self) -> bool {
        matches!(self, Self::Error | Self::Warn)
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ConsoleEntry ──────────────────────────────────────────────────────────────

/// A single captured console message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleEntry {
    /// Normalized severity.
    pub level: ConsoleLevel,
    /// Message body, trimmed to [`MAX_CONSOLE_MESSAGE_CHARS`].
    pub message: String,
    /// Milliseconds since Unix epoch, if the source provided one.
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
    /// Originating logger/source name, if any.
    #[serde(default)]
    pub source: Option<String>,
}

impl ConsoleEntry {
    /// Build an entry from raw wire fields, applying level normalization and
    /// the message trim.
    pub fn normalized(
        level: &str,
        message: &str,
        timestamp_ms: Option<i64>,
        source: Option<String>,
    ) -> Self {
        Self {
            level: ConsoleLevel::normalize(level),
            message: trim_for_payload(message, MAX_CONSOLE_MESSAGE_CHARS),
            timestamp_ms,
            source,
        }
    }
}

// ── NetworkEntry ──────────────────────────────────────────────────────────────

/// A single captured network request/response summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEntry {
    /// Request identifier assigned by the capture source.
    #[serde(default)]
    pub request_id: Option<String>,
    /// HTTP method: GET, POST, etc.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// HTTP status code. `None` while in-flight or on transport failure.
    #[serde(default)]
    pub status: Option<u16>,
    /// Request start time (milliseconds since Unix epoch).
    #[serde(default)]
    pub started_at_ms: Option<i64>,
    /// Total duration in milliseconds. `None` if still pending.
    #[serde(default)]
    pub duration_ms: Option<f64>,
    /// Error description if the request failed at transport level.
    #[serde(default)]
    pub error: Option<String>,
    /// Whether the response was served from a local cache.
    #[serde(default)]
    pub from_cache: bool,
}

impl NetworkEntry {
    /// Apply the per-field trims so the entry is safe to embed in a payload.
    pub fn sanitized(mut self) -> Self {
        self.url = trim_for_payload(&self.url, MAX_URL_CHARS);
        self.request_id = self
            .request_id
            .map(|id| trim_for_payload(&id, MAX_REQUEST_ID_CHARS));
        self.error = self
            .error
            .map(|e| trim_for_payload(&e, MAX_ERROR_TEXT_CHARS));
        self
    }

    /// Whether the request resulted in an error (non-2xx/3xx or explicit error).
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.status.is_some_and(|s| s >= 400)
    }
}

// ── NamedStream ───────────────────────────────────────────────────────────────

/// Descriptor of a named app-log stream (e.g. a service or container name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedStream {
    /// Stable key used for selection toggles and refetch filters.
    pub key: String,
    /// Human-readable display name.
    pub name: String,
}

// ── Capped retention ──────────────────────────────────────────────────────────

/// Keep at most `cap` items, preferring the tail (most recent).
///
/// Capture sources order items oldest-first, so keeping the tail keeps the
/// most recent activity — the part worth attaching to a report.
pub fn tail_capped<T>(items: Vec<T>, cap: usize) -> Vec<T> {
    let len = items.len();
    if len <= cap {
        items
    } else {
        items.into_iter().skip(len - cap).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_network_entry(url: &str) -> NetworkEntry {
        NetworkEntry {
            request_id: Some("req-1".to_string()),
            method: "GET".to_string(),
            url: url.to_string(),
            status: Some(200),
            started_at_ms: Some(1_700_000_000_000),
            duration_ms: Some(42.0),
            error: None,
            from_cache: false,
        }
    }

    // ── ConsoleLevel::normalize ───────────────────────────────────────────

    #[test]
    fn test_normalize_case_insensitive() {
        assert_eq!(ConsoleLevel::normalize("WARN"), ConsoleLevel::Warn);
        assert_eq!(ConsoleLevel::normalize("Error"), ConsoleLevel::Error);
        assert_eq!(ConsoleLevel::normalize("INFO"), ConsoleLevel::Info);
    }

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(ConsoleLevel::normalize("warning"), ConsoleLevel::Warn);
        assert_eq!(ConsoleLevel::normalize("err"), ConsoleLevel::Error);
        assert_eq!(ConsoleLevel::normalize("fatal"), ConsoleLevel::Error);
        assert_eq!(ConsoleLevel::normalize("severe"), ConsoleLevel::Error);
        assert_eq!(ConsoleLevel::normalize("verbose"), ConsoleLevel::Trace);
    }

    #[test]
    fn test_normalize_unrecognized_defaults_to_log() {
        assert_eq!(ConsoleLevel::normalize("banana"), ConsoleLevel::Log);
        assert_eq!(ConsoleLevel::normalize(""), ConsoleLevel::Log);
        assert_eq!(ConsoleLevel::normalize("log"), ConsoleLevel::Log);
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(ConsoleLevel::normalize("  warn  "), ConsoleLevel::Warn);
    }

    #[test]
    fn test_level_is_problem() {
        assert!(ConsoleLevel::Error.is_problem());
        assert!(ConsoleLevel::Warn.is_problem());
        assert!(!ConsoleLevel::Info.is_problem());
        assert!(!ConsoleLevel::Trace.is_problem());
    }

    #[test]
    fn test_level_serde_roundtrip() {
        let json = serde_json::to_string(&ConsoleLevel::Warn).unwrap();
        assert_eq!(json, "\"warn\"");
        let back: ConsoleLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ConsoleLevel::Warn);
    }

    // ── ConsoleEntry ──────────────────────────────────────────────────────

    #[test]
    fn test_console_entry_normalized_trims_message() {
        let long = "x".repeat(MAX_CONSOLE_MESSAGE_CHARS + 100);
        let entry = ConsoleEntry::normalized("warn", &long, None, None);
        assert_eq!(entry.message.chars().count(), MAX_CONSOLE_MESSAGE_CHARS);
        assert!(entry.message.ends_with('…'));
        assert_eq!(entry.level, ConsoleLevel::Warn);
    }

    #[test]
    fn test_console_entry_short_message_unchanged() {
        let entry = ConsoleEntry::normalized("info", "hello", Some(123), None);
        assert_eq!(entry.message, "hello");
        assert_eq!(entry.timestamp_ms, Some(123));
    }

    // ── NetworkEntry ──────────────────────────────────────────────────────

    #[test]
    fn test_network_entry_sanitized_trims_fields() {
        let mut entry = make_network_entry(&"u".repeat(MAX_URL_CHARS + 10));
        entry.request_id = Some("i".repeat(MAX_REQUEST_ID_CHARS + 10));
        entry.error = Some("e".repeat(MAX_ERROR_TEXT_CHARS + 10));

        let sanitized = entry.sanitized();
        assert_eq!(sanitized.url.chars().count(), MAX_URL_CHARS);
        assert_eq!(
            sanitized.request_id.unwrap().chars().count(),
            MAX_REQUEST_ID_CHARS
        );
        assert_eq!(
            sanitized.error.unwrap().chars().count(),
            MAX_ERROR_TEXT_CHARS
        );
    }

    #[test]
    fn test_network_entry_sanitized_short_fields_unchanged() {
        let entry = make_network_entry("https://example.com/api");
        let sanitized = entry.clone().sanitized();
        assert_eq!(sanitized, entry);
    }

    #[test]
    fn test_network_entry_is_failure() {
        let mut entry = make_network_entry("https://example.com");
        assert!(!entry.is_failure());
        entry.status = Some(404);
        assert!(entry.is_failure());
        entry.status = Some(200);
        entry.error = Some("connection reset".to_string());
        assert!(entry.is_failure());
    }

    #[test]
    fn test_network_entry_deserializes_camel_case() {
        let json = r#"{
            "requestId": "abc",
            "method": "POST",
            "url": "https://example.com",
            "status": 201,
            "startedAtMs": 1700000000000,
            "durationMs": 12.5,
            "fromCache": true
        }"#;
        let entry: NetworkEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.request_id.as_deref(), Some("abc"));
        assert!(entry.from_cache);
        assert_eq!(entry.duration_ms, Some(12.5));
    }

    // ── tail_capped ───────────────────────────────────────────────────────

    #[test]
    fn test_tail_capped_under_cap_unchanged() {
        let items = vec![1, 2, 3];
        assert_eq!(tail_capped(items, 5), vec![1, 2, 3]);
    }

    #[test]
    fn test_tail_capped_keeps_most_recent() {
        let items: Vec<usize> = (0..500).collect();
        let capped = tail_capped(items, 200);
        assert_eq!(capped.len(), 200);
        assert_eq!(capped[0], 300);
        assert_eq!(capped[199], 499);
    }

    #[test]
    fn test_tail_capped_exact_cap() {
        let items = vec![1, 2, 3];
        assert_eq!(tail_capped(items, 3), vec![1, 2, 3]);
    }

    #[test]
    fn test_tail_capped_zero_cap() {
        let items = vec![1, 2, 3];
        assert!(tail_capped(items, 0).is_empty());
    }
}
