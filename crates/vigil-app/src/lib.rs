//! # vigil-app - Panel State and Capture Orchestration
//!
//! The state layer between `vigil-core`'s fetch container and the `vigil`
//! binary:
//!
//! - [`panels`] - per-domain capture panels (app logs, console, network,
//!   diagnostics, status, completeness), each owning a fetch store and an
//!   identifier guard
//! - [`services`] - backend seams ([`AppService`], [`HealthService`]) with
//!   HTTP implementations in [`http`]
//! - [`report`] - include-flag aware payload assembly
//! - [`autoheal`] - health dashboard state with backoff polling and the
//!   settings toggle
//! - [`config`] - TOML settings with layered lookup

pub mod autoheal;
pub mod config;
pub mod http;
pub mod panel;
pub mod panels;
pub mod report;
pub mod services;

pub use autoheal::AutoHealDashboard;
pub use config::{CaptureCaps, PollSettings, Settings};
pub use http::{HttpAppService, HttpHealthService};
pub use panel::{resolve_identifier, FetchOptions, IdentifierGuard};
pub use panels::{
    AppLogs, AppLogsPanel, CompletenessPanel, ConsoleCapture, ConsolePanel, DiagnosticsInfo,
    DiagnosticsPanel, NetworkCapture, NetworkPanel, StatusPanel,
};
pub use report::build_report;
pub use services::{AppLogBundle, AppService, FallbackDiagnostics, HealthService, LogMode};
