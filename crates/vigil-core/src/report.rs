//! Outgoing issue-report payload.
//!
//! The payload is sparse by design: a section appears only when the
//! corresponding panel's include flag was set and its capture produced data.
//! Serialized field names match the report-submission API (camelCase).

use serde::{Deserialize, Serialize};

use crate::types::{ConsoleEntry, NetworkEntry};

/// Issue-report payload assembled from the capture panels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportPayload {
    /// Scenario the report is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,

    /// Free-text description (user-written plus generated diagnostics).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // ── App logs ──────────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_total: Option<usize>,
    /// ISO-8601 capture time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_captured_at: Option<String>,

    // ── Console logs ──────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_logs: Option<Vec<ConsoleEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_logs_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_logs_captured_at: Option<String>,

    // ── Network requests ──────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_requests: Option<Vec<NetworkEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_requests_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_captured_at: Option<String>,

    // ── Diagnostics ───────────────────────────────────────────────────────
    /// Generated diagnostics body (scan findings + runtime issues).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl ReportPayload {
    /// Whether any capture section made it into the payload.
    pub fn has_attachments(&self) -> bool {
        self.logs.is_some()
            || self.console_logs.is_some()
            || self.network_requests.is_some()
            || self.diagnostics.is_some()
    }
}
