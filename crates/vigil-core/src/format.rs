//! Payload-safe text and timestamp formatting helpers.

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Ellipsis marker appended to trimmed fields.
const ELLIPSIS: char = '…';

/// Bound a free-text field to `max` characters for inclusion in a payload.
///
/// Returns the value unchanged when it already fits. Otherwise truncates to
/// `max - 1` characters and appends an ellipsis so the result is exactly
/// `max` characters. Trimming twice at the same limit is a no-op.
///
/// Counts `char`s, not bytes, so multi-byte text is never split mid-character.
pub fn trim_for_payload(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

/// Format an optional capture timestamp as a local wall-clock time string.
///
/// Returns `None` when there is no timestamp. Never panics — this feeds
/// directly into display code.
pub fn format_optional_timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
}

/// Format a timestamp as ISO-8601 with millisecond precision (UTC).
///
/// This is the wire format for `*CapturedAt` report fields.
pub fn iso8601(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
