//! App status and completeness panels.
//!
//! Simple backend fetches with no retention caps: the payload is a single
//! object, present or not.

use chrono::Utc;

use vigil_core::{AppStatus, CompletenessScore, FetchAction, FetchState, FetchStore};

use crate::panel::{
    normalize_identifier, resolve_identifier, FetchOptions, IdentifierGuard, NO_IDENTIFIER_ERROR,
};
use crate::services::AppService;

/// Fetch state for the coarse app status.
#[derive(Debug)]
pub struct StatusPanel {
    store: FetchStore<Option<AppStatus>>,
    guard: IdentifierGuard,
}

impl Default for StatusPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            store: FetchStore::new(None),
            guard: IdentifierGuard::default(),
        }
    }

    pub fn state(&self) -> &FetchState<Option<AppStatus>> {
        self.store.state()
    }

    pub fn reset(&mut self) {
        self.guard.clear();
        self.store.reset();
    }

    pub async fn fetch<S: AppService + Sync>(
        &mut self,
        service: &S,
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

        let token = self.store.begin();
        match service.fetch_app_status(&identifier).await {
            Ok(status) => {
                if self.store.complete(
                    token,
                    FetchAction::Success {
                        data: Some(status),
                        total: None,
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

/// Fetch state for the scenario completeness score.
#[derive(Debug)]
pub struct CompletenessPanel {
    store: FetchStore<Option<CompletenessScore>>,
    guard: IdentifierGuard,
}

impl Default for CompletenessPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletenessPanel {
    pub fn new() -> Self {
        Self {
            store: FetchStore::new(None),
            guard: IdentifierGuard::default(),
        }
    }

    pub fn state(&self) -> &FetchState<Option<CompletenessScore>> {
        self.store.state()
    }

    pub fn reset(&mut self) {
        self.guard.clear();
        self.store.reset();
    }

    pub async fn fetch<S: AppService + Sync>(
        &mut self,
        service: &S,
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

        let token = self.store.begin();
        match service.fetch_completeness(&identifier).await {
            Ok(score) => {
                if self.store.complete(
                    token,
                    FetchAction::Success {
                        data: Some(score),
                        total: None,
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
