//! Network capture panel.
//!
//! Primary source is a live batch request over the bridge. There is no
//! backend fallback for network activity — when the peer never advertised
//! network capture the panel reports a fixed capability error. A failed
//! live request still degrades to buffered recent events when any exist.

use chrono::Utc;
use tracing::warn;

use vigil_bridge::capture::{request_network_batch, NetworkBatchOptions};
use vigil_bridge::{BridgeHandle, Capability, RecentBuffer};
use vigil_core::{tail_capped, FetchAction, FetchState, FetchStore, NetworkEntry};

use crate::panel::{
    normalize_identifier, resolve_identifier, FetchOptions, IdentifierGuard, NO_IDENTIFIER_ERROR,
};

/// Network panel payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkCapture {
    pub entries: Vec<NetworkEntry>,
    /// True when the entries came from the buffered-recent fallback.
    pub from_fallback: bool,
}

/// Fetch state and orchestration for captured network activity.
#[derive(Debug)]
pub struct NetworkPanel {
    store: FetchStore<NetworkCapture>,
    guard: IdentifierGuard,
    cap: usize,
}

impl NetworkPanel {
    pub fn new(cap: usize) -> Self {
        Self {
            store: FetchStore::new(NetworkCapture::default()),
            guard: IdentifierGuard::default(),
            cap,
        }
    }

    pub fn state(&self) -> &FetchState<NetworkCapture> {
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

    /// Capture network activity for the first resolvable identifier.
    pub async fn fetch(
        &mut self,
        bridge: &BridgeHandle,
        recent: &RecentBuffer,
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

        if !bridge.supports(Capability::Network) {
            self.guard.clear();
            self.store.dispatch(FetchAction::Error(
                "network capture is not supported in this context".to_string(),
            ));
            return;
        }

        let token = self.store.begin();
        let batch_options = NetworkBatchOptions {
            max_events: self.cap,
        };
        match request_network_batch(bridge, &batch_options).await {
            Ok(batch) => {
                let total = batch.total.max(batch.entries.len());
                let capture = NetworkCapture {
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
                let (buffered, seen) = recent.recent_network_events();
                if buffered.is_empty() {
                    self.guard.clear();
                    self.store
                        .complete(token, FetchAction::Error(primary_err.to_string()));
                } else {
                    warn!(
                        "network batch request failed, serving {} buffered events: {}",
                        buffered.len(),
                        primary_err
                    );
                    let capture = NetworkCapture {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::is_truncated;

    fn make_event(i: usize) -> NetworkEntry {
        NetworkEntry {
            request_id: Some(format!("req-{i}")),
            method: "GET".to_string(),
            url: format!("https://api.dev/items/{i}"),
            status: Some(200),
            started_at_ms: None,
            duration_ms: Some(10.0),
            error: None,
            from_cache: false,
        }
    }

    #[tokio::test]
    async fn test_capability_unavailable_is_fixed_error() {
        let mut panel = NetworkPanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[Capability::Console]);

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;

        let state = panel.state();
        assert_eq!(
            state.error.as_deref(),
            Some("network capture is not supported in this context")
        );
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_primary_failure_degrades_to_buffered_events() {
        let mut panel = NetworkPanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[Capability::Network]);
        let recent = RecentBuffer::default();
        for i in 0..3 {
            recent.record_network(make_event(i));
        }

        panel
            .fetch(&bridge, &recent, &["scenario-a"], FetchOptions::default())
            .await;

        let state = panel.state();
        assert!(state.error.is_none());
        assert_eq!(state.data.entries.len(), 3);
        assert!(state.data.from_fallback);
        assert_eq!(state.total, Some(3));
    }

    #[tokio::test]
    async fn test_buffered_fallback_respects_cap_and_reports_seen_total() {
        let mut panel = NetworkPanel::new(2);
        let bridge = BridgeHandle::new_for_test(&[Capability::Network]);
        let recent = RecentBuffer::default();
        for i in 0..6 {
            recent.record_network(make_event(i));
        }

        panel
            .fetch(&bridge, &recent, &["scenario-a"], FetchOptions::default())
            .await;

        let state = panel.state();
        assert_eq!(state.data.entries.len(), 2);
        assert_eq!(state.data.entries[1].request_id.as_deref(), Some("req-5"));
        assert_eq!(state.total, Some(6));
        assert!(is_truncated(state.total, state.data.entries.len()));
    }

    #[tokio::test]
    async fn test_primary_failure_without_buffer_is_error_and_clears_guard() {
        let mut panel = NetworkPanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[Capability::Network]);

        panel
            .fetch(
                &bridge,
                &RecentBuffer::default(),
                &["scenario-a"],
                FetchOptions::default(),
            )
            .await;

        assert!(panel.state().error.is_some());
        assert_eq!(panel.guard.current(), None);

        // A later natural retry is not short-circuited: the buffer has data
        // now, so the same non-forced fetch succeeds.
        let recent = RecentBuffer::default();
        recent.record_network(make_event(0));
        panel
            .fetch(&bridge, &recent, &["scenario-a"], FetchOptions::default())
            .await;
        assert!(panel.state().error.is_none());
        assert_eq!(panel.state().data.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_guard_skip_after_fallback_success() {
        let mut panel = NetworkPanel::new(150);
        let bridge = BridgeHandle::new_for_test(&[Capability::Network]);
        let recent = RecentBuffer::default();
        recent.record_network(make_event(0));

        panel
            .fetch(&bridge, &recent, &["scenario-a"], FetchOptions::default())
            .await;
        let first_fetched_at = panel.state().fetched_at;
        assert!(first_fetched_at.is_some());

        recent.record_network(make_event(1));
        panel
            .fetch(&bridge, &recent, &["scenario-a"], FetchOptions::default())
            .await;
        assert_eq!(
            panel.state().data.entries.len(),
            1,
            "non-forced repeat for the same identifier must not refetch"
        );

        panel
            .fetch(&bridge, &recent, &["scenario-a"], FetchOptions::forced())
            .await;
        assert_eq!(panel.state().data.entries.len(), 2);
    }
}
