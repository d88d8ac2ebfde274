//! App logs panel.
//!
//! App logs come from the backend, not the bridge: the platform aggregates
//! per-stream logs server-side and serves a combined window. The panel
//! keeps the stream list and a per-stream selection map; deselected streams
//! are excluded from the next (forced) refresh via the service's stream
//! filter.

use std::collections::BTreeMap;

use chrono::Utc;

use vigil_core::{tail_capped, FetchAction, FetchState, FetchStore, NamedStream};

use crate::panel::{
    normalize_identifier, resolve_identifier, FetchOptions, IdentifierGuard, NO_IDENTIFIER_ERROR,
};
use crate::services::{AppService, LogMode};

/// App logs panel payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppLogs {
    /// Combined log lines, oldest first, capped to the panel's retention.
    pub lines: Vec<String>,
    /// Streams that contributed to the combined output.
    pub streams: Vec<NamedStream>,
    /// Per-stream inclusion toggles, keyed by stream key.
    pub selections: BTreeMap<String, bool>,
}

impl AppLogs {
    /// Stream keys currently selected, or `None` when every stream is.
    ///
    /// `None` lets the backend skip filtering entirely in the common case.
    pub fn selected_streams(&self) -> Option<Vec<String>> {
        if self.selections.values().all(|&on| on) {
            return None;
        }
        Some(
            self.selections
                .iter()
                .filter(|(_, &on)| on)
                .map(|(key, _)| key.clone())
                .collect(),
        )
    }
}

/// Fetch state and orchestration for backend app logs.
#[derive(Debug)]
pub struct AppLogsPanel {
    store: FetchStore<AppLogs>,
    guard: IdentifierGuard,
    cap: usize,
}

impl AppLogsPanel {
    pub fn new(cap: usize) -> Self {
        Self {
            store: FetchStore::new(AppLogs::default()),
            guard: IdentifierGuard::default(),
            cap,
        }
    }

    pub fn state(&self) -> &FetchState<AppLogs> {
        self.store.state()
    }

    pub fn set_include(&mut self, include: bool) {
        self.store.dispatch(FetchAction::SetInclude(include));
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.store.dispatch(FetchAction::SetExpanded(expanded));
    }

    pub fn reset(&mut self) {
        self.guard.clear();
        self.store.reset();
    }

    /// Toggle one stream's inclusion in the combined output.
    ///
    /// Only meaningful once a fetch has populated the stream list; the
    /// change takes effect on the next forced refresh.
    pub fn toggle_stream(&mut self, key: &str) {
        let state = self.store.state();
        let Some(fetched_at) = state.fetched_at else {
            return;
        };
        if !state.data.selections.contains_key(key) {
            return;
        }
        let mut data = state.data.clone();
        if let Some(selected) = data.selections.get_mut(key) {
            *selected = !*selected;
        }
        let total = state.total;
        self.store.dispatch(FetchAction::Success {
            data,
            total,
            fetched_at,
        });
    }

    /// Fetch the combined app logs for the first resolvable identifier.
    ///
    /// The current stream selection (if any stream is deselected) is passed
    /// through to the backend as a filter.
    pub async fn fetch<S: AppService + Sync>(
        &mut self,
        service: &S,
        candidates: &[&str],
        mode: LogMode,
        options: FetchOptions,
    ) {
        let Some(identifier) = resolve_identifier(candidates) else {
            self.guard.clear();
            self.store
                .dispatch(FetchAction::Error(NO_IDENTIFIER_ERROR.to_string()));
            return;
        };
        let normalized = normalize_identifier(&identifier);
        if !options.force && self.guard.matches(&normalized) {
            return;
        }

        let streams_filter = self.store.state().data.selected_streams();
        let token = self.store.begin();
        match service
            .fetch_app_logs(&identifier, mode, streams_filter.as_deref())
            .await
        {
            Ok(bundle) => {
                let total = bundle.total.max(bundle.lines.len());
                // Preserve existing toggles for streams that survived the
                // refresh; new streams default to selected.
                let previous = &self.store.state().data.selections;
                let selections: BTreeMap<String, bool> = bundle
                    .streams
                    .iter()
                    .map(|s| (s.key.clone(), *previous.get(&s.key).unwrap_or(&true)))
                    .collect();
                let data = AppLogs {
                    lines: tail_capped(bundle.lines, self.cap),
                    streams: bundle.streams,
                    selections,
                };
                if self.store.complete(
                    token,
                    FetchAction::Success {
                        data,
                        total: Some(total),
                        fetched_at: Utc::now(),
                    },
                ) {
                    self.guard.mark(normalized);
                }
            }
            Err(err) => {
                self.guard.clear();
                self.store
                    .complete(token, FetchAction::Error(err.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::FakeAppService;
    use crate::services::AppLogBundle;
    use vigil_core::is_truncated;

    fn make_bundle(lines: usize) -> AppLogBundle {
        AppLogBundle {
            lines: (0..lines).map(|i| format!("line {i}")).collect(),
            streams: vec![
                NamedStream {
                    key: "api".to_string(),
                    name: "API".to_string(),
                },
                NamedStream {
                    key: "worker".to_string(),
                    name: "Worker".to_string(),
                },
            ],
            total: lines,
        }
    }

    #[tokio::test]
    async fn test_fetch_caps_lines_and_keeps_untruncated_total() {
        let mut panel = AppLogsPanel::new(200);
        let svc = FakeAppService::default();
        svc.set_app_logs(make_bundle(500));

        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::default())
            .await;

        let state = panel.state();
        assert_eq!(state.data.lines.len(), 200);
        assert_eq!(state.data.lines[0], "line 300", "tail retention");
        assert_eq!(state.data.lines[199], "line 499");
        assert_eq!(state.total, Some(500));
        assert!(is_truncated(state.total, state.data.lines.len()));
    }

    #[tokio::test]
    async fn test_fetch_defaults_all_streams_selected() {
        let mut panel = AppLogsPanel::new(200);
        let svc = FakeAppService::default();
        svc.set_app_logs(make_bundle(10));

        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::default())
            .await;

        let state = panel.state();
        assert_eq!(state.data.selections.len(), 2);
        assert!(state.data.selections.values().all(|&on| on));
        assert_eq!(state.data.selected_streams(), None);
    }

    #[tokio::test]
    async fn test_toggle_stream_feeds_next_forced_fetch() {
        let mut panel = AppLogsPanel::new(200);
        let svc = FakeAppService::default();
        svc.set_app_logs(make_bundle(10));

        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::default())
            .await;
        panel.toggle_stream("worker");

        assert_eq!(
            panel.state().data.selected_streams(),
            Some(vec!["api".to_string()])
        );

        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::forced())
            .await;
        assert_eq!(svc.last_log_streams(), Some(vec!["api".to_string()]));
    }

    #[tokio::test]
    async fn test_toggle_preserved_across_refresh() {
        let mut panel = AppLogsPanel::new(200);
        let svc = FakeAppService::default();
        svc.set_app_logs(make_bundle(10));

        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::default())
            .await;
        panel.toggle_stream("worker");
        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::forced())
            .await;

        assert_eq!(
            panel.state().data.selections.get("worker"),
            Some(&false),
            "deselection survives a refresh"
        );
    }

    #[tokio::test]
    async fn test_toggle_before_first_fetch_is_noop() {
        let mut panel = AppLogsPanel::new(200);
        panel.toggle_stream("api");
        assert!(panel.state().data.selections.is_empty());
        assert!(panel.state().fetched_at.is_none());
    }

    #[tokio::test]
    async fn test_backend_error_clears_data_and_guard() {
        let mut panel = AppLogsPanel::new(200);
        let svc = FakeAppService::default();
        svc.set_app_logs(make_bundle(10));

        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::default())
            .await;
        assert_eq!(panel.state().data.lines.len(), 10);

        svc.set_app_logs_error("upstream exploded");
        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::forced())
            .await;

        let state = panel.state();
        assert_eq!(state.error.as_deref(), Some("Backend error: upstream exploded"));
        assert!(state.data.lines.is_empty(), "no stale-but-displayed data");
        assert_eq!(state.total, None);
        assert_eq!(panel.guard.current(), None);
    }

    #[tokio::test]
    async fn test_guard_skips_identifier_casing_variants() {
        let mut panel = AppLogsPanel::new(200);
        let svc = FakeAppService::default();
        svc.set_app_logs(make_bundle(5));

        panel
            .fetch(&svc, &["Scenario-A"], LogMode::Recent, FetchOptions::default())
            .await;
        panel
            .fetch(&svc, &["scenario-a"], LogMode::Recent, FetchOptions::default())
            .await;

        assert_eq!(svc.log_calls(), 1);
    }

    #[tokio::test]
    async fn test_identifier_candidates_resolve_in_order() {
        let mut panel = AppLogsPanel::new(200);
        let svc = FakeAppService::default();
        svc.set_app_logs(make_bundle(1));

        panel
            .fetch(
                &svc,
                &["", "  ", "fallback-id"],
                LogMode::Recent,
                FetchOptions::default(),
            )
            .await;

        assert_eq!(panel.guard.current(), Some("fallback-id"));
        assert_eq!(svc.log_calls(), 1);
    }
}
