//! Console capture panel.
//!
//! Primary source is a live batch request over the bridge. When the peer
//! never advertised console capture, the backend's out-of-band diagnostics
//! snapshot serves as the fallback source. When the live request fails
//! mid-capture, buffered recent entries degrade the fetch to a soft
//! success instead of an error.

use chrono::Utc;
use tracing::warn;

use vigil_bridge::capture::{request_log_batch, LogBatchOptions};
use vigil_bridge::{BridgeHandle, Capability, RecentBuffer};
use vigil_core::{tail_capped, ConsoleEntry, FetchAction, FetchState, FetchStore};

use crate::panel::{
    normalize_identifier, resolve_identifier, FetchOptions, IdentifierGuard, NO_IDENTIFIER_ERROR,
};
use crate::services::AppService;

/// Console panel payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleCapture {
    pub entries: Vec<ConsoleEntry>,
    /// True when the entries came from a fallback source rather than a live
    /// batch request.
    pub from_fallback: bool,
}

/// Fetch state and orchestration for captured console logs.
#[derive(Debug)]
pub struct ConsolePanel {
    store: FetchStore<ConsoleCapture>,
    guard: IdentifierGuard,
    cap: usize,
}

impl ConsolePanel {
    pub fn new(cap: usize) -> Self {
        Self {
            store: FetchStore::new(ConsoleCapture::default()),
            guard: IdentifierGuard::default(),
            cap,
        }
    }

    pub fn state(&self) -> &FetchState<ConsoleCapture> {
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

    /// Capture console logs for the first resolvable identifier.
    ///
    /// See the module docs for the primary/fallback strategy. All failures
    /// land in panel error state; nothing propagates.
    pub async fn fetch<S: AppService + Sync>(
        &mut self,
        bridge: &BridgeHandle,
        recent: &RecentBuffer,
        fallback: &S,
        candidates: &[&str],
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

        if !bridge.supports(Capability::Console) {
            self.fetch_via_fallback(fallback, &identifier, normalized)
                .await;
            return;
        }

        let token = self.store.begin();
        let batch_options = LogBatchOptions {
            max_entries: self.cap,
        };
        match request_log_batch(bridge, &batch_options).await {
            Ok(batch) => {
                let total = batch.total.max(batch.entries.len());
                let capture = ConsoleCapture {
                    entries: tail_capped(batch.entries, self.cap),
                    from_fallback: false,
                };
                if self.store.complete(
                    token,
                    FetchAction::Success {
                        data: capture,
                        total: Some(total),
                        fetched_at: Utc::now(),
                    },
                ) {
                    self.guard.mark(normalized);
                }
            }
            Err(primary_err) => {
                // Soft-fallback: serve buffered recent entries if we have any.
                let (buffered, seen) = recent.recent_logs();
                if buffered.is_empty() {
                    self.guard.clear();
                    self.store
                        .complete(token, FetchAction::Error(primary_err.to_string()));
                } else {
                    warn!(
                        "console batch request failed, serving {} buffered entries: {}",
                        buffered.len(),
                        primary_err
                    );
                    let capture = ConsoleCapture {
                        entries: tail_capped(buffered, self.cap),
                        from_fallback: true,
                    };
                    if self.store.complete(
                        token,
                        FetchAction::Success {
                            data: capture,
                            total: Some(seen),
                            fetched_at: Utc::now(),
                        },
                    ) {
                        self.guard.mark(normalized);
                    }
                }
            }
        }
    }

    /// Capability-unavailable path: the backend's diagnostics snapshot is
    /// the only source. Dispatches a single `Success` (no loading phase) or
    /// a final `Error`.
    async fn fetch_via_fallback<S: AppService + Sync>(
        &mut self,
        fallback: &S,
        identifier: &str,
        normalized: String,
    ) {
        let token = self.store.reserve();
        match fallback.fetch_fallback_diagnostics(identifier, None).await {
            Ok(diagnostics) if !diagnostics.console.is_empty() => {
                let total = diagnostics.console.len();
                let capture = ConsoleCapture {
                    entries: tail_capped(diagnostics.console, self.cap),
                    from_fallback: true,
                };
                if self.store.complete(
                    token,
                    FetchAction::Success {
                        data: capture,
                        total: Some(total),
                        fetched_at: Utc::now(),
                    },
                ) {
                    self.guard.mark(normalized);
                }
            }
            Ok(_) => {
                self.guard.clear();
                self.store.complete(
                    token,
                    FetchAction::Error(
                        "console capture is not supported in this context".to_string(),
                    ),
                );
            }
            Err(err) => {
                self.guard.clear();
                self.store.complete(token, FetchAction::Error(err.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::FakeAppService;
    use vigil_core::{is_truncated, ConsoleLevel};

    fn make_entries(n: usize) -> Vec<ConsoleEntry> {
        (0..n)
            .map(|i| ConsoleEntry {
                level: ConsoleLevel::Info,
                message: format!("entry {i}"),
                timestamp_ms: None,
                source: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_no_identifier_sets_fixed_error() {
        let mut panel = ConsolePanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[Capability::Console]);
        let svc = FakeAppService::default();

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["", "  "],
                FetchOptions::default(),
            )
            .await;

        assert_eq!(panel.state().error.as_deref(), Some(NO_IDENTIFIER_ERROR));
        assert_eq!(svc.fallback_calls(), 0);
    }

    #[tokio::test]
    async fn test_capability_fallback_success_marks_from_fallback() {
        let mut panel = ConsolePanel::new(150);
        // No console capability advertised.
        let bridge = BridgeHandle::new_for_test(&[Capability::Network]);
        let svc = FakeAppService::default();
        svc.set_fallback_console(make_entries(3));

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["Scenario-A"],
                FetchOptions::default(),
            )
            .await;

        let state = panel.state();
        assert_eq!(state.data.entries.len(), 3);
        assert!(state.data.from_fallback);
        assert_eq!(state.total, Some(3));
        assert!(state.error.is_none());
        assert!(state.fetched_at.is_some());
        assert_eq!(panel.guard.current(), Some("scenario-a"));
    }

    #[tokio::test]
    async fn test_capability_fallback_empty_is_final_failure() {
        let mut panel = ConsolePanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[]);
        let svc = FakeAppService::default();

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;

        let state = panel.state();
        assert!(state
            .error
            .as_deref()
            .unwrap()
            .contains("not supported"));
        assert!(state.fetched_at.is_none());
        assert_eq!(panel.guard.current(), None);
    }

    #[tokio::test]
    async fn test_guard_skips_repeat_fetch_without_force() {
        let mut panel = ConsolePanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[]);
        let svc = FakeAppService::default();
        svc.set_fallback_console(make_entries(1));

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;
        assert_eq!(svc.fallback_calls(), 1);

        // Same identifier, different casing — still a skip.
        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["SCENARIO-A"],
                FetchOptions::default(),
            )
            .await;
        assert_eq!(svc.fallback_calls(), 1, "non-forced repeat must not fetch");

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["scenario-a"],
                FetchOptions::forced(),
            )
            .await;
        assert_eq!(svc.fallback_calls(), 2, "forced refresh must fetch");
    }

    #[tokio::test]
    async fn test_primary_failure_with_buffered_entries_degrades_to_success() {
        let mut panel = ConsolePanel::new(150);
        // Console advertised, but the dummy channel makes the request fail.
        let bridge = BridgeHandle::new_for_test(&[Capability::Console]);
        let svc = FakeAppService::default();
        let recent = RecentBuffer::default();
        for entry in make_entries(4) {
            recent.record_console(entry);
        }

        panel
            .fetch(&bridge, &recent, &svc, &["scenario-a"], FetchOptions::default())
            .await;

        let state = panel.state();
        assert!(state.error.is_none(), "soft failure is not surfaced");
        assert_eq!(state.data.entries.len(), 4);
        assert!(state.data.from_fallback);
        assert_eq!(state.total, Some(4));
        assert_eq!(svc.fallback_calls(), 0, "backend fallback not involved");
    }

    #[tokio::test]
    async fn test_primary_failure_without_buffer_is_error() {
        let mut panel = ConsolePanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[Capability::Console]);
        let svc = FakeAppService::default();

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;

        let state = panel.state();
        assert!(state.error.is_some());
        assert!(state.data.entries.is_empty(), "error clears data");
        assert_eq!(state.total, None);
    }

    #[tokio::test]
    async fn test_fallback_cap_and_truncation_flag() {
        let mut panel = ConsolePanel::new(2);
        let bridge = BridgeHandle::new_for_test(&[]);
        let svc = FakeAppService::default();
        svc.set_fallback_console(make_entries(5));

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;

        let state = panel.state();
        assert_eq!(state.data.entries.len(), 2);
        // Tail retention: the last two entries survive.
        assert_eq!(state.data.entries[0].message, "entry 3");
        assert_eq!(state.total, Some(5));
        assert!(is_truncated(state.total, state.data.entries.len()));
    }

    #[tokio::test]
    async fn test_reset_clears_guard_and_state() {
        let mut panel = ConsolePanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[]);
        let svc = FakeAppService::default();
        svc.set_fallback_console(make_entries(1));

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;
        panel.set_include(false);
        panel.reset();

        assert!(panel.state().include, "reset restores include default");
        assert!(panel.state().data.entries.is_empty());
        assert_eq!(panel.guard.current(), None);

        // After reset a non-forced fetch for the same identifier runs again.
        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &svc,
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;
        assert_eq!(svc.fallback_calls(), 2);
    }
}
