//! Diagnostics panel.
//!
//! Fetches the scenario's latest scan report and combines it with the
//! runtime-capability failures observed during this capture run into a
//! report-ready description. The include flag defaults to whether the
//! description has anything to say.

use chrono::Utc;

use vigil_core::{
    format_diagnostics_description, FetchAction, FetchState, FetchStore, RuntimeIssue, ScanReport,
};

use crate::panel::{
    normalize_identifier, resolve_identifier, FetchOptions, IdentifierGuard, NO_IDENTIFIER_ERROR,
};
use crate::services::AppService;

/// Diagnostics panel payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticsInfo {
    pub report: Option<ScanReport>,
    pub runtime_issues: Vec<RuntimeIssue>,
    /// Assembled description; empty when there is nothing to report.
    pub description: String,
}

/// Fetch state and orchestration for scenario diagnostics.
#[derive(Debug)]
pub struct DiagnosticsPanel {
    store: FetchStore<DiagnosticsInfo>,
    guard: IdentifierGuard,
}

impl Default for DiagnosticsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsPanel {
    pub fn new() -> Self {
        Self {
            store: FetchStore::new(DiagnosticsInfo::default()),
            guard: IdentifierGuard::default(),
        }
    }

    pub fn state(&self) -> &FetchState<DiagnosticsInfo> {
        self.store.state()
    }

    pub fn set_include(&mut self, include: bool) {
        self.store.dispatch(FetchAction::SetInclude(include));
    }

    pub fn reset(&mut self) {
        self.guard.clear();
        self.store.reset();
    }

    /// Fetch the scan report and rebuild the description.
    ///
    /// On success the include flag is re-defaulted to "description is
    /// non-empty" — an empty diagnostics section is never worth attaching.
    pub async fn fetch<S: AppService + Sync>(
        &mut self,
        service: &S,
        runtime_issues: &[RuntimeIssue],
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
        match service.fetch_scan_report(&identifier).await {
            Ok(report) => {
                let description =
                    format_diagnostics_description(report.as_ref(), runtime_issues, &[]);
                let has_content = !description.is_empty();
                let data = DiagnosticsInfo {
                    report,
                    runtime_issues: runtime_issues.to_vec(),
                    description,
                };
                if self.store.complete(
                    token,
                    FetchAction::Success {
                        data,
                        total: None,
                        fetched_at: Utc::now(),
                    },
                ) {
                    self.guard.mark(normalized);
                    self.store.dispatch(FetchAction::SetInclude(has_content));
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
