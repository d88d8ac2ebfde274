//! Vigil - scenario monitor and issue-report capture tool
//!
//! The binary entry point lives in `main.rs`; the capture runner lives
//! here so it stays testable.

pub mod runner;

pub use runner::{health_snapshot, run_capture, CaptureOptions, CaptureOutcome, SkipFlags};
