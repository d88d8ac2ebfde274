//! Backend service seams.
//!
//! The app and health backends are opaque collaborators: REST APIs owned by
//! the surrounding platform. Orchestration code only sees these traits;
//! expected failures come back as `Err` values whose messages surface
//! verbatim in panel error state. [`http`](crate::http) provides the
//! concrete clients used by the binary; tests substitute hand-rolled fakes.

use vigil_core::prelude::*;
use vigil_core::{
    AppStatus, AutoHealSettings, CompletenessScore, ConsoleEntry, HealthSnapshot, NamedStream,
    ScanReport, TrendPoint, TrendWindow,
};

// ── App service payloads ──────────────────────────────────────────────────────

/// Which slice of app logs to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// The recent window the backend keeps hot.
    Recent,
    /// Everything the backend still has for the scenario.
    Full,
}

impl LogMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Full => "full",
        }
    }
}

/// App logs as returned by the backend: combined lines plus the streams
/// they were merged from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppLogBundle {
    /// Combined log lines, oldest first.
    pub lines: Vec<String>,
    /// Streams that contributed to `lines`.
    pub streams: Vec<NamedStream>,
    /// Upstream line count before any backend windowing.
    pub total: usize,
}

/// Diagnostics snapshot served by the backend when live capture is
/// unavailable (e.g. the preview context has no bridge).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackDiagnostics {
    /// Console entries the backend collected out-of-band.
    pub console: Vec<ConsoleEntry>,
    /// Free-text notes about the snapshot's provenance.
    pub notes: Vec<String>,
}

// ── Service traits ────────────────────────────────────────────────────────────

/// Scenario/app backend operations consumed by the capture panels.
#[trait_variant::make(AppService: Send)]
pub trait LocalAppService {
    /// Fetch app logs for a scenario, optionally restricted to the given
    /// stream keys.
    async fn fetch_app_logs(
        &self,
        identifier: &str,
        mode: LogMode,
        streams: Option<&[String]>,
    ) -> Result<AppLogBundle>;

    /// Fetch the out-of-band diagnostics snapshot used when live capture is
    /// unavailable.
    async fn fetch_fallback_diagnostics(
        &self,
        identifier: &str,
        preview_url: Option<&str>,
    ) -> Result<FallbackDiagnostics>;

    /// Fetch the latest scan report, if the scenario has been scanned.
    async fn fetch_scan_report(&self, identifier: &str) -> Result<Option<ScanReport>>;

    /// Fetch coarse app status.
    async fn fetch_app_status(&self, identifier: &str) -> Result<AppStatus>;

    /// Fetch the scenario completeness score.
    async fn fetch_completeness(&self, identifier: &str) -> Result<CompletenessScore>;
}

/// Health backend operations consumed by the auto-heal dashboard.
#[trait_variant::make(HealthService: Send)]
pub trait LocalHealthService {
    /// Fetch the current snapshot of all health checks.
    async fn fetch_snapshot(&self) -> Result<HealthSnapshot>;

    /// Fetch the trend series for one check over a lookback window.
    async fn fetch_trend(&self, check_id: &str, window: TrendWindow) -> Result<Vec<TrendPoint>>;

    /// Persist auto-heal settings; returns the settings as applied.
    async fn set_auto_heal(&self, settings: &AutoHealSettings) -> Result<AutoHealSettings>;
}

// ── Test fakes ────────────────────────────────────────────────────────────────
