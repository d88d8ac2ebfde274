//! Report payload assembly.
//!
//! Maps the capture panels into a [`ReportPayload`]: a panel contributes
//! its section only when its include flag is set and the capture produced
//! data. Totals come straight from the stores; capture timestamps are the
//! stores' `fetched_at` in ISO-8601.

use vigil_core::{iso8601, ReportPayload};

use crate::panels::{AppLogsPanel, ConsolePanel, DiagnosticsPanel, NetworkPanel};

/// Assemble the outgoing report payload from the capture panels.
pub fn build_report(
    scenario: &str,
    description: Option<&str>,
    app_logs: &AppLogsPanel,
    console: &ConsolePanel,
    network: &NetworkPanel,
    diagnostics: &DiagnosticsPanel,
) -> ReportPayload {
    let mut payload = ReportPayload {
        scenario: Some(scenario.to_string()),
        description: description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned),
        ..ReportPayload::default()
    };

    let logs_state = app_logs.state();
    if logs_state.include && !logs_state.data.lines.is_empty() {
        payload.logs = Some(logs_state.data.lines.clone());
        payload.logs_total = Some(logs_state.total.unwrap_or(logs_state.data.lines.len()));
        payload.logs_captured_at = logs_state.fetched_at.map(iso8601);
    }

    let console_state = console.state();
    if console_state.include && !console_state.data.entries.is_empty() {
        payload.console_logs = Some(console_state.data.entries.clone());
        payload.console_logs_total = Some(
            console_state
                .total
                .unwrap_or(console_state.data.entries.len()),
        );
        payload.console_logs_captured_at = console_state.fetched_at.map(iso8601);
    }

    let network_state = network.state();
    if network_state.include && !network_state.data.entries.is_empty() {
        payload.network_requests = Some(network_state.data.entries.clone());
        payload.network_requests_total = Some(
            network_state
                .total
                .unwrap_or(network_state.data.entries.len()),
        );
        payload.network_captured_at = network_state.fetched_at.map(iso8601);
    }

    let diagnostics_state = diagnostics.state();
    if diagnostics_state.include && !diagnostics_state.data.description.is_empty() {
        payload.diagnostics = Some(diagnostics_state.data.description.clone());
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::FetchOptions;
    use crate::services::test_support::FakeAppService;
    use crate::services::{AppLogBundle, LogMode};
    use vigil_bridge::{BridgeHandle, RecentBuffer};
    use vigil_core::{ConsoleEntry, ConsoleLevel, NamedStream};

    async fn populated_logs_panel(lines: usize) -> AppLogsPanel {
        let mut panel = AppLogsPanel::new(200);
        let svc = FakeAppService::default();
        svc.set_app_logs(AppLogBundle {
            lines: (0..lines).map(|i| format!("line {i}")).collect(),
            streams: vec![NamedStream {
                key: "api".to_string(),
                name: "API".to_string(),
            }],
            total: lines,
        });
        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::default())
            .await;
        panel
    }

    async fn populated_console_panel() -> ConsolePanel {
        let mut panel = ConsolePanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[]);
        let svc = FakeAppService::default();
        svc.set_fallback_console(vec![ConsoleEntry {
            level: ConsoleLevel::Error,
            message: "boom".to_string(),
            timestamp_ms: None,
            source: None,
        }]);
        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;
        panel
    }

    #[tokio::test]
    async fn test_empty_panels_produce_bare_payload() {
        let payload = build_report(
            "scenario-a",
            None,
            &AppLogsPanel::new(200),
            &ConsolePanel::new(150),
            &NetworkPanel::new(150),
            &DiagnosticsPanel::new(),
        );
        assert_eq!(payload.scenario.as_deref(), Some("scenario-a"));
        assert!(!payload.has_attachments());
        assert!(payload.logs.is_none());
    }

    #[tokio::test]
    async fn test_included_panels_contribute_sections() {
        let logs = populated_logs_panel(500).await;
        let console = populated_console_panel().await;

        let payload = build_report(
            "scenario-a",
            Some("checkout renders blank"),
            &logs,
            &console,
            &NetworkPanel::new(150),
            &DiagnosticsPanel::new(),
        );

        assert_eq!(payload.description.as_deref(), Some("checkout renders blank"));
        assert_eq!(payload.logs.as_ref().unwrap().len(), 200);
        assert_eq!(payload.logs_total, Some(500));
        assert!(payload.logs_captured_at.as_deref().unwrap().ends_with('Z'));
        assert_eq!(payload.console_logs.as_ref().unwrap().len(), 1);
        assert_eq!(payload.console_logs_total, Some(1));
        assert!(payload.network_requests.is_none());
    }

    #[tokio::test]
    async fn test_excluded_panel_is_omitted() {
        let logs = populated_logs_panel(10).await;
        let mut console = populated_console_panel().await;
        console.set_include(false);

        let payload = build_report(
            "scenario-a",
            None,
            &logs,
            &console,
            &NetworkPanel::new(150),
            &DiagnosticsPanel::new(),
        );

        assert!(payload.logs.is_some());
        assert!(
            payload.console_logs.is_none(),
            "include=false must omit the section even with data"
        );
    }

    #[tokio::test]
    async fn test_blank_description_is_dropped() {
        let payload = build_report(
            "scenario-a",
            Some("   "),
            &AppLogsPanel::new(200),
            &ConsolePanel::new(150),
            &NetworkPanel::new(150),
            &DiagnosticsPanel::new(),
        );
        assert!(payload.description.is_none());
    }
}
