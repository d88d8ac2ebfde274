//! Vigil - scenario monitor and issue-report capture tool
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;

use vigil::{health_snapshot, run_capture, CaptureOptions, SkipFlags};
use vigil_app::Settings;
use vigil_core::health_checks_to_csv;

/// Vigil - capture logs, console and network activity from a running
/// scenario app and assemble an issue-report payload
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Scenario monitor and issue-report capture tool", long_about = None)]
struct Args {
    /// Scenario identifier to capture for
    scenario: String,

    /// Debug-bridge WebSocket endpoint (overrides config)
    #[arg(long, value_name = "WS_URL")]
    bridge: Option<String>,

    /// Backend API base URL (overrides config)
    #[arg(long, value_name = "HTTP_URL")]
    backend: Option<String>,

    /// Path to a vigil.toml config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the report payload to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Free-text description to attach to the report
    #[arg(long, value_name = "TEXT")]
    description: Option<String>,

    /// Skip the app-logs panel
    #[arg(long)]
    no_logs: bool,

    /// Skip the console panel
    #[arg(long)]
    no_console: bool,

    /// Skip the network panel
    #[arg(long)]
    no_network: bool,

    /// Skip the diagnostics panel
    #[arg(long)]
    no_diagnostics: bool,

    /// Print a health-check summary instead of capturing a report
    #[arg(long)]
    health: bool,

    /// With --health: also write the checks as CSV to this path
    #[arg(long, value_name = "PATH", requires = "health")]
    health_csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    vigil_core::logging::init()?;

    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(bridge) = args.bridge {
        settings.bridge_endpoint = Some(bridge);
    }
    if let Some(backend) = args.backend {
        settings.backend_base_url = Some(backend);
    }

    if args.health {
        return run_health(&settings, args.health_csv.as_deref()).await;
    }

    let options = CaptureOptions {
        scenario: args.scenario,
        description: args.description,
        settings,
        skip: SkipFlags {
            logs: args.no_logs,
            console: args.no_console,
            network: args.no_network,
            diagnostics: args.no_diagnostics,
        },
    };

    let outcome = run_capture(options).await?;

    for (panel, error) in &outcome.panel_errors {
        eprintln!("⚠ {panel}: {error}");
    }

    let json = serde_json::to_string_pretty(&outcome.payload)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            eprintln!("✅ Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if !outcome.payload.has_attachments() {
        eprintln!("❌ No panel produced data; see errors above.");
        std::process::exit(1);
    }

    Ok(())
}

/// Print the health-check summary (and optionally export CSV).
async fn run_health(
    settings: &Settings,
    csv_path: Option<&std::path::Path>,
) -> color_eyre::eyre::Result<()> {
    let snapshot = health_snapshot(settings).await?;

    eprintln!(
        "Health: {} ({} passing, {} failing, {} total)",
        snapshot.overall(),
        snapshot.passing_count(),
        snapshot.failing_count(),
        snapshot.checks.len()
    );
    for check in &snapshot.checks {
        eprintln!(
            "  [{}] {}{}",
            check.status,
            check.name,
            check
                .message
                .as_deref()
                .map(|m| format!(" — {m}"))
                .unwrap_or_default()
        );
    }

    if let Some(path) = csv_path {
        std::fs::write(path, health_checks_to_csv(&snapshot.checks))?;
        eprintln!("✅ Health CSV written to {}", path.display());
    }

    Ok(())
}
