//! Headless capture runner.
//!
//! Drives one full capture: connect the bridge (degrading to fallback
//! sources when unreachable), pump streamed events into the recent buffer,
//! run every panel fetch, and assemble the report payload. Panel failures
//! never abort the run — they surface in the outcome summary.

use tracing::{debug, info, warn};

use vigil_app::panels::{
    AppLogsPanel, CompletenessPanel, ConsolePanel, DiagnosticsPanel, NetworkPanel, StatusPanel,
};
use vigil_app::{
    build_report, AutoHealDashboard, FetchOptions, HttpAppService, HttpHealthService, LogMode,
    Settings,
};
use vigil_bridge::capture::{configure_logs, configure_network, LogCaptureConfig, NetworkCaptureConfig};
use vigil_bridge::{BridgeClient, BridgeHandle, BridgeMessage, Capability, RecentBuffer};
use vigil_core::prelude::*;
use vigil_core::{HealthSnapshot, ReportPayload, RuntimeIssue};

/// Backend base URL used when neither the CLI nor the config provides one.
const DEFAULT_BACKEND_BASE_URL: &str = "http://127.0.0.1:8080";

/// Which panels to leave out of this run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipFlags {
    pub logs: bool,
    pub console: bool,
    pub network: bool,
    pub diagnostics: bool,
}

/// One capture run's inputs.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub scenario: String,
    pub description: Option<String>,
    pub settings: Settings,
    pub skip: SkipFlags,
}

/// One capture run's outputs: the payload plus per-panel failures.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub payload: ReportPayload,
    /// `(panel, error)` pairs for panels that ended in error state.
    pub panel_errors: Vec<(&'static str, String)>,
}

/// Run a full capture for one scenario.
///
/// Only configuration-level problems (bad backend URL) abort the run;
/// bridge and backend failures degrade per-panel.
pub async fn run_capture(options: CaptureOptions) -> Result<CaptureOutcome> {
    let settings = &options.settings;
    let backend_base = settings
        .backend_base_url
        .as_deref()
        .unwrap_or(DEFAULT_BACKEND_BASE_URL);
    let app_service = HttpAppService::new(backend_base)?;

    // ── Bridge connection (best-effort) ──────────────────────────────────
    let mut runtime_issues: Vec<RuntimeIssue> = Vec::new();
    let recent = RecentBuffer::new(settings.caps.console_entries, settings.caps.network_events);
    let bridge = match settings.bridge_endpoint.as_deref() {
        Some(endpoint) => match BridgeClient::connect(endpoint).await {
            Ok(client) => {
                let handle = client.handle();
                start_event_pump(client, recent.clone());
                configure_capture(&handle).await;
                Some(handle)
            }
            Err(err) => {
                warn!("bridge unreachable at {}: {}", endpoint, err);
                runtime_issues.push(RuntimeIssue::BridgeUnreachable);
                None
            }
        },
        None => {
            debug!("no bridge endpoint configured; live capture disabled");
            None
        }
    };
    let bridge = bridge.unwrap_or_else(BridgeHandle::offline);

    if !bridge.supports(Capability::Console) {
        runtime_issues.push(RuntimeIssue::ConsoleCaptureUnavailable);
    }
    if !bridge.supports(Capability::Network) {
        runtime_issues.push(RuntimeIssue::NetworkCaptureUnavailable);
    }

    // ── Panel fetches ────────────────────────────────────────────────────
    let candidates: Vec<&str> = vec![options.scenario.as_str()];
    let fetch = FetchOptions::default();

    let mut app_logs = AppLogsPanel::new(settings.caps.app_log_lines);
    if options.skip.logs {
        app_logs.set_include(false);
    } else {
        app_logs
            .fetch(&app_service, &candidates, LogMode::Recent, fetch)
            .await;
    }

    let mut console = ConsolePanel::new(settings.caps.console_entries);
    if options.skip.console {
        console.set_include(false);
    } else {
        console
            .fetch(&bridge, &recent, &app_service, &candidates, fetch)
            .await;
    }

    let mut network = NetworkPanel::new(settings.caps.network_events);
    if options.skip.network {
        network.set_include(false);
    } else {
        network.fetch(&bridge, &recent, &candidates, fetch).await;
    }

    let mut diagnostics = DiagnosticsPanel::new();
    if options.skip.diagnostics {
        diagnostics.set_include(false);
    } else {
        diagnostics
            .fetch(&app_service, &runtime_issues, &candidates, fetch)
            .await;
    }

    let mut status = StatusPanel::new();
    status.fetch(&app_service, &candidates, fetch).await;
    let mut completeness = CompletenessPanel::new();
    completeness.fetch(&app_service, &candidates, fetch).await;

    log_status_summary(&status, &completeness);

    // ── Assemble ─────────────────────────────────────────────────────────
    let payload = build_report(
        &options.scenario,
        options.description.as_deref(),
        &app_logs,
        &console,
        &network,
        &diagnostics,
    );

    let mut panel_errors: Vec<(&'static str, String)> = Vec::new();
    for (name, error) in [
        ("app-logs", app_logs.state().error.clone()),
        ("console", console.state().error.clone()),
        ("network", network.state().error.clone()),
        ("diagnostics", diagnostics.state().error.clone()),
        ("status", status.state().error.clone()),
        ("completeness", completeness.state().error.clone()),
    ] {
        if let Some(error) = error {
            panel_errors.push((name, error));
        }
    }

    Ok(CaptureOutcome {
        payload,
        panel_errors,
    })
}

/// Fetch the health snapshot with the configured retry budget.
pub async fn health_snapshot(settings: &Settings) -> Result<HealthSnapshot> {
    let backend_base = settings
        .backend_base_url
        .as_deref()
        .unwrap_or(DEFAULT_BACKEND_BASE_URL);
    let health_service = HttpHealthService::new(backend_base)?;

    let mut dashboard = AutoHealDashboard::new();
    dashboard
        .poll_snapshot(&health_service, settings.poll.max_retries)
        .await;

    let state = dashboard.snapshot();
    match &state.error {
        Some(message) => Err(Error::backend(message.clone())),
        None => Ok(state.data.clone()),
    }
}

/// Forward streamed bridge events into the recent buffer.
fn start_event_pump(client: BridgeClient, recent: RecentBuffer) {
    let mut events = client.into_event_receiver();
    tokio::spawn(async move {
        while let Some(message) = events.recv().await {
            match message {
                BridgeMessage::ConsoleEvent(entry) => recent.record_console(entry),
                BridgeMessage::NetworkEvent(entry) => recent.record_network(entry),
                BridgeMessage::UnknownEvent { event, .. } => {
                    debug!("ignoring bridge event {}", event);
                }
                // Hello and responses are handled inside the client task.
                _ => {}
            }
        }
        debug!("bridge event stream ended");
    });
}

/// Best-effort: turn on streaming so the recent buffer fills. A failure
/// here only weakens the soft-fallback, it does not fail the run.
async fn configure_capture(handle: &BridgeHandle) {
    if handle.supports(Capability::Console) {
        let config = LogCaptureConfig {
            capture: true,
            min_level: None,
        };
        if let Err(err) = configure_logs(handle, &config).await {
            warn!("failed to configure console streaming (non-fatal): {}", err);
        }
    }
    if handle.supports(Capability::Network) {
        let config = NetworkCaptureConfig {
            capture: true,
            include_bodies: false,
        };
        if let Err(err) = configure_network(handle, &config).await {
            warn!("failed to configure network streaming (non-fatal): {}", err);
        }
    }
}

fn log_status_summary(status: &StatusPanel, completeness: &CompletenessPanel) {
    if let Some(app_status) = &status.state().data {
        info!(
            "app status: running={} version={}",
            app_status.running,
            app_status.version.as_deref().unwrap_or("unknown")
        );
    }
    if let Some(score) = &completeness.state().data {
        info!(
            "scenario completeness: {:.1}% ({} gap(s))",
            score.percent,
            score.missing.len()
        );
    }
}
