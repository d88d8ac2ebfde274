//! Auto-heal dashboard state.
//!
//! Holds the health snapshot and per-check trend in fetch stores, and the
//! auto-heal settings toggle. Snapshot polling retries transient failures
//! with fixed exponential backoff — distinct from the capture panels, which
//! never auto-retry.

use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use vigil_core::prelude::*;
use vigil_core::{
    AutoHealSettings, FetchAction, FetchState, FetchStore, HealthSnapshot, TrendPoint, TrendWindow,
};

use crate::services::HealthService;

/// Initial retry backoff for snapshot polling.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum retry backoff (cap).
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Compute exponential backoff duration for retry attempt `n` (1-indexed).
///
/// The formula is `INITIAL_BACKOFF * 2^(n-1)`, capped at `MAX_BACKOFF`.
fn compute_backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let multiplier: u64 = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    let secs = INITIAL_BACKOFF.as_secs().saturating_mul(multiplier);
    Duration::from_secs(secs.min(MAX_BACKOFF.as_secs()))
}

/// State for the auto-heal dashboard.
#[derive(Debug)]
pub struct AutoHealDashboard {
    snapshot: FetchStore<HealthSnapshot>,
    trend: FetchStore<Vec<TrendPoint>>,
    /// Check the trend store currently holds data for.
    trend_check: Option<String>,
    settings: AutoHealSettings,
    /// Last settings-toggle failure, shown next to the toggle.
    settings_error: Option<String>,
}

impl Default for AutoHealDashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoHealDashboard {
    pub fn new() -> Self {
        Self {
            snapshot: FetchStore::new(HealthSnapshot::default()),
            trend: FetchStore::new(Vec::new()),
            trend_check: None,
            settings: AutoHealSettings::default(),
            settings_error: None,
        }
    }

    pub fn snapshot(&self) -> &FetchState<HealthSnapshot> {
        self.snapshot.state()
    }

    pub fn trend(&self) -> &FetchState<Vec<TrendPoint>> {
        self.trend.state()
    }

    pub fn trend_check(&self) -> Option<&str> {
        self.trend_check.as_deref()
    }

    pub fn settings(&self) -> &AutoHealSettings {
        &self.settings
    }

    pub fn settings_error(&self) -> Option<&str> {
        self.settings_error.as_deref()
    }

    /// Fetch the health snapshot once; failure lands in the store.
    pub async fn refresh_snapshot<S: HealthService + Sync>(&mut self, service: &S) {
        let token = self.snapshot.begin();
        match service.fetch_snapshot().await {
            Ok(snapshot) => {
                let count = snapshot.checks.len();
                self.snapshot.complete(
                    token,
                    FetchAction::Success {
                        data: snapshot,
                        total: Some(count),
                        fetched_at: Utc::now(),
                    },
                );
            }
            Err(err) => {
                self.snapshot
                    .complete(token, FetchAction::Error(err.to_string()));
            }
        }
    }

    /// Fetch the health snapshot, retrying transient failures with fixed
    /// exponential backoff up to `max_retries` additional attempts.
    pub async fn poll_snapshot<S: HealthService + Sync>(&mut self, service: &S, max_retries: u32) {
        let token = self.snapshot.begin();
        let mut attempt: u32 = 1;
        loop {
            match service.fetch_snapshot().await {
                Ok(snapshot) => {
                    let count = snapshot.checks.len();
                    self.snapshot.complete(
                        token,
                        FetchAction::Success {
                            data: snapshot,
                            total: Some(count),
                            fetched_at: Utc::now(),
                        },
                    );
                    return;
                }
                Err(err) if attempt <= max_retries => {
                    let backoff = compute_backoff(attempt);
                    warn!(
                        "health snapshot poll failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        max_retries + 1,
                        backoff,
                        err
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    self.snapshot
                        .complete(token, FetchAction::Error(err.to_string()));
                    return;
                }
            }
        }
    }

    /// Load the trend series for one check.
    pub async fn load_trend<S: HealthService + Sync>(
        &mut self,
        service: &S,
        check_id: &str,
        window: TrendWindow,
    ) {
        let token = self.trend.begin();
        match service.fetch_trend(check_id, window).await {
            Ok(points) => {
                let count = points.len();
                if self.trend.complete(
                    token,
                    FetchAction::Success {
                        data: points,
                        total: Some(count),
                        fetched_at: Utc::now(),
                    },
                ) {
                    self.trend_check = Some(check_id.to_string());
                }
            }
            Err(err) => {
                self.trend_check = None;
                self.trend.complete(token, FetchAction::Error(err.to_string()));
            }
        }
    }

    /// Toggle auto-heal on the backend.
    ///
    /// Local settings only change once the backend confirms; on failure the
    /// previous settings stay and the error is kept for display.
    pub async fn set_enabled<S: HealthService + Sync>(&mut self, service: &S, enabled: bool) {
        let desired = AutoHealSettings {
            enabled,
            ..self.settings.clone()
        };
        match service.set_auto_heal(&desired).await {
            Ok(applied) => {
                self.settings = applied;
                self.settings_error = None;
            }
            Err(err) => {
                self.settings_error = Some(err.to_string());
            }
        }
    }

    /// Replace the whole settings object on the backend (interval, attempts).
    pub async fn apply_settings<S: HealthService + Sync>(
        &mut self,
        service: &S,
        desired: AutoHealSettings,
    ) {
        match service.set_auto_heal(&desired).await {
            Ok(applied) => {
                self.settings = applied;
                self.settings_error = None;
            }
            Err(err) => {
                self.settings_error = Some(err.to_string());
            }
        }
    }
}
