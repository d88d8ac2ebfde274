//! Diagnostics description assembly.
//!
//! Builds the human-readable body attached to an issue report from a scan
//! report and the set of runtime-capability failures observed during
//! capture. Pure formatting — deterministic given its inputs, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Scan report ───────────────────────────────────────────────────────────────

/// Findings for one scan rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    /// Rule identifier (e.g. `routes/link-targets`).
    pub rule: String,
    /// Hard violations found by the rule.
    #[serde(default)]
    pub violations: Vec<String>,
    /// Non-blocking warnings found by the rule.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl RuleResult {
    /// Whether the rule produced anything worth mentioning.
    pub fn has_findings(&self) -> bool {
        !self.violations.is_empty() || !self.warnings.is_empty()
    }
}

/// A completed scenario scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Scenario the scan ran against.
    pub scenario: String,
    /// When the scan finished.
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    /// How long the scan took.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Per-rule findings.
    #[serde(default)]
    pub rules: Vec<RuleResult>,
}

impl ScanReport {
    /// Total violation count across all rules.
    pub fn violation_count(&self) -> usize {
        self.rules.iter().map(|r| r.violations.len()).sum()
    }

    /// Total warning count across all rules.
    pub fn warning_count(&self) -> usize {
        self.rules.iter().map(|r| r.warnings.len()).sum()
    }
}

// ── Runtime issues ────────────────────────────────────────────────────────────

/// Capability failures observed while capturing, mapped to fixed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeIssue {
    BridgeUnreachable,
    ConsoleCaptureUnavailable,
    NetworkCaptureUnavailable,
    ScreenshotUnavailable,
    InspectUnavailable,
}

impl RuntimeIssue {
    /// Fixed human-readable label for the report body.
    pub fn label(self) -> &'static str {
        match self {
            Self::BridgeUnreachable => "Debug bridge unreachable — live capture disabled",
            Self::ConsoleCaptureUnavailable => "Console capture unavailable",
            Self::NetworkCaptureUnavailable => "Network capture unavailable",
            Self::ScreenshotUnavailable => "Screenshot capture unavailable",
            Self::InspectUnavailable => "Element inspection unavailable",
        }
    }
}

// ── Description builder ───────────────────────────────────────────────────────

/// Assemble the multi-line diagnostics body for a report.
///
/// Returns the empty string when there is nothing worth reporting — no scan
/// report, no runtime issues, no extra warnings. Callers use emptiness to
/// decide whether the diagnostics section defaults to included.
pub fn format_diagnostics_description(
    report: Option<&ScanReport>,
    runtime_issues: &[RuntimeIssue],
    extra_warnings: &[String],
) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(report) = report {
        let mut lines = vec![format!(
            "Scan of \"{}\": {} violation(s), {} warning(s){}",
            report.scenario,
            report.violation_count(),
            report.warning_count(),
            report
                .duration_ms
                .map(|ms| format!(" in {ms}ms"))
                .unwrap_or_default(),
        )];
        if let Some(at) = report.generated_at {
            lines.push(format!("Generated at {}", at.to_rfc3339()));
        }
        for rule in report.rules.iter().filter(|r| r.has_findings()) {
            lines.push(format!("[{}]", rule.rule));
            for violation in &rule.violations {
                lines.push(format!("  ✗ {violation}"));
            }
            for warning in &rule.warnings {
                lines.push(format!("  ⚠ {warning}"));
            }
        }
        sections.push(lines.join("\n"));
    }

    if !runtime_issues.is_empty() {
        let mut lines = vec!["Runtime issues:".to_string()];
        for issue in runtime_issues {
            lines.push(format!("  - {}", issue.label()));
        }
        sections.push(lines.join("\n"));
    }

    if !extra_warnings.is_empty() {
        let mut lines = vec!["Warnings:".to_string()];
        for warning in extra_warnings {
            lines.push(format!("  - {warning}"));
        }
        sections.push(lines.join("\n"));
    }

    sections.join("\n\n")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
