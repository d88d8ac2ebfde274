//! Health-check and auto-heal domain types.
//!
//! Vocabulary shared by the auto-heal dashboard state in `vigil-app` and the
//! health backend seam, plus CSV export for check history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── HealthStatus ──────────────────────────────────────────────────────────────

/// Outcome of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Passing,
    Degraded,
    Failing,
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passing => "passing",
            Self::Degraded => "degraded",
            Self::Failing => "failing",
            Self::Unknown => "unknown",
        }
    }

    /// Severity rank for aggregation: higher is worse.
    fn severity(self) -> u8 {
        match self {
            Self::Passing => 0,
            Self::Unknown => 1,
            Self::Degraded => 2,
            Self::Failing => 3,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── HealthCheck / HealthSnapshot ──────────────────────────────────────────────

/// A single health check's latest result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub id: String,
    pub name: String,
    pub status: HealthStatus,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Failure detail or status note from the last run.
    #[serde(default)]
    pub message: Option<String>,
    /// Whether auto-heal is allowed to act on this check.
    #[serde(default)]
    pub auto_heal_eligible: bool,
}

/// All checks as of one backend poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthSnapshot {
    pub checks: Vec<HealthCheck>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    pub fn passing_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == HealthStatus::Passing)
            .count()
    }

    pub fn failing_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == HealthStatus::Failing)
            .count()
    }

    /// Worst status across all checks; `Unknown` when there are none.
    pub fn overall(&self) -> HealthStatus {
        self.checks
            .iter()
            .map(|c| c.status)
            .max_by_key(|s| s.severity())
            .unwrap_or(HealthStatus::Unknown)
    }
}

// ── Trends ────────────────────────────────────────────────────────────────────

/// One point in a health-check trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub at: DateTime<Utc>,
    pub status: HealthStatus,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// Lookback window for trend queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendWindow {
    Hour,
    Day,
    Week,
}

impl TrendWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

// ── Settings / score / status ─────────────────────────────────────────────────

/// Auto-heal configuration as held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoHealSettings {
    pub enabled: bool,
    /// Seconds between heal sweeps.
    pub interval_secs: u64,
    /// Heal attempts per check before giving up.
    pub max_attempts: u32,
}

impl Default for AutoHealSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 300,
            max_attempts: 3,
        }
    }
}

/// Scenario completeness score reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletenessScore {
    /// 0–100.
    pub percent: f64,
    /// Named gaps keeping the score below 100.
    pub missing: Vec<String>,
}

/// Coarse app status for the status panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppStatus {
    pub running: bool,
    pub version: Option<String>,
    pub uptime_secs: Option<u64>,
}

// ── CSV export ────────────────────────────────────────────────────────────────

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render health checks as CSV with a header row.
///
/// Column order is fixed so exports diff cleanly across runs.
pub fn health_checks_to_csv(checks: &[HealthCheck]) -> String {
    let mut out = String::from("id,name,status,lastRun,durationMs,message\n");
    for check in checks {
        let row = [
            csv_escape(&check.id),
            csv_escape(&check.name),
            check.status.as_str().to_string(),
            check
                .last_run
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            check
                .duration_ms
                .map(|d| d.to_string())
                .unwrap_or_default(),
            csv_escape(check.message.as_deref().unwrap_or("")),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Render a trend series as CSV with a header row.
pub fn trend_to_csv(points: &[TrendPoint]) -> String {
    let mut out = String::from("at,status,durationMs\n");
    for point in points {
        out.push_str(&format!(
            "{},{},{}\n",
            point.at.to_rfc3339(),
            point.status.as_str(),
            point.duration_ms.map(|d| d.to_string()).unwrap_or_default(),
        ));
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
