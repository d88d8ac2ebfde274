//! # vigil-core - Core Domain Types
//!
//! Foundation crate for Vigil. Provides the bounded fetch-state container,
//! captured-data vocabulary, payload formatting helpers, diagnostics
//! assembly, report payload types, health-check domain, and error handling.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Fetch container (`fetch`)
//! - [`FetchState`] - Per-panel state: data, total, loading, error, expanded,
//!   fetched_at, include
//! - [`FetchAction`] / [`reduce`] - Total, pure transition function
//! - [`FetchStore`] - State cell with a completion token guarding against
//!   out-of-order fetch resolutions
//! - [`is_truncated`] - "showing last N of M" predicate
//!
//! ### Domain Types (`types`)
//! - [`ConsoleLevel`] - Closed severity set with free-form normalization
//! - [`ConsoleEntry`] / [`NetworkEntry`] - Captured console/network items
//! - [`NamedStream`] - App-log stream descriptor
//! - [`tail_capped`] - Most-recent-N retention
//!
//! ### Diagnostics (`diagnostics`)
//! - [`ScanReport`] / [`RuleResult`] / [`RuntimeIssue`]
//! - [`format_diagnostics_description`] - Pure report-body builder
//!
//! ### Report (`report`)
//! - [`ReportPayload`] - Sparse camelCase issue-report payload
//!
//! ### Health (`health`)
//! - [`HealthCheck`] / [`HealthSnapshot`] / [`TrendPoint`] /
//!   [`AutoHealSettings`] and CSV export helpers
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use vigil_core::prelude::*;
//! ```

pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod format;
pub mod health;
pub mod logging;
pub mod report;
pub mod types;

/// Prelude for common imports used throughout all Vigil crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use diagnostics::{format_diagnostics_description, RuleResult, RuntimeIssue, ScanReport};
pub use error::{Error, Result, ResultExt};
pub use fetch::{is_truncated, reduce, FetchAction, FetchState, FetchStore};
pub use format::{format_optional_timestamp, iso8601, trim_for_payload};
pub use health::{
    health_checks_to_csv, trend_to_csv, AppStatus, AutoHealSettings, CompletenessScore,
    HealthCheck, HealthSnapshot, HealthStatus, TrendPoint, TrendWindow,
};
pub use report::ReportPayload;
pub use types::{
    tail_capped, ConsoleEntry, ConsoleLevel, NamedStream, NetworkEntry, MAX_APP_LOG_LINES,
    MAX_CONSOLE_ENTRIES, MAX_CONSOLE_MESSAGE_CHARS, MAX_ERROR_TEXT_CHARS, MAX_NETWORK_EVENTS,
    MAX_REQUEST_ID_CHARS, MAX_URL_CHARS,
};
