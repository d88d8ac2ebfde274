//! HTTP implementations of the backend service seams.
//!
//! Thin adapters over the platform's REST API: build a URL, GET/PUT JSON,
//! map transport and status failures to [`Error::Backend`]. No retries
//! here — retry policy belongs to the callers (§ manual refresh for
//! panels, backoff polling for the dashboard).

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use vigil_bridge::protocol::parse_console_entry;
use vigil_core::prelude::*;
use vigil_core::{
    AppStatus, AutoHealSettings, CompletenessScore, HealthSnapshot, NamedStream, ScanReport,
    TrendPoint, TrendWindow,
};

use crate::services::{AppLogBundle, AppService, FallbackDiagnostics, HealthService, LogMode};

// ── Wire shapes ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AppLogsWire {
    lines: Vec<String>,
    streams: Vec<NamedStream>,
    total: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FallbackDiagnosticsWire {
    /// Entries arrive with free-form level strings; parsed leniently.
    console: Vec<Value>,
    notes: Vec<String>,
}

// ── Shared request plumbing ───────────────────────────────────────────────────

async fn get_json<T: DeserializeOwned>(client: &Client, url: Url) -> Result<T> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::backend(e.to_string()))?
        .error_for_status()
        .map_err(|e| Error::backend(e.to_string()))?;
    response
        .json::<T>()
        .await
        .map_err(|e| Error::backend(format!("parse response from {url}: {e}")))
}

fn parse_base(base_url: &str) -> Result<Url> {
    Url::parse(base_url)
        .map_err(|_| Error::config_invalid(format!("invalid backend base URL: {base_url}")))
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|_| Error::backend(format!("invalid API path: {path}")))
}

// ── HttpAppService ────────────────────────────────────────────────────────────

/// [`crate::services::AppService`] over the platform REST API.
#[derive(Debug, Clone)]
pub struct HttpAppService {
    client: Client,
    base: Url,
}

impl HttpAppService {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: parse_base(base_url)?,
        })
    }
}

impl AppService for HttpAppService {
    async fn fetch_app_logs(
        &self,
        identifier: &str,
        mode: LogMode,
        streams: Option<&[String]>,
    ) -> Result<AppLogBundle> {
        let mut url = join(&self.base, &format!("api/apps/{identifier}/logs"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("mode", mode.as_str());
            if let Some(streams) = streams {
                pairs.append_pair("streams", &streams.join(","));
            }
        }
        let wire: AppLogsWire = get_json(&self.client, url).await?;
        let total = wire.total.unwrap_or(wire.lines.len()).max(wire.lines.len());
        Ok(AppLogBundle {
            lines: wire.lines,
            streams: wire.streams,
            total,
        })
    }

    async fn fetch_fallback_diagnostics(
        &self,
        identifier: &str,
        preview_url: Option<&str>,
    ) -> Result<FallbackDiagnostics> {
        let mut url = join(&self.base, &format!("api/apps/{identifier}/diagnostics"))?;
        if let Some(preview) = preview_url {
            url.query_pairs_mut().append_pair("previewUrl", preview);
        }
        let wire: FallbackDiagnosticsWire = get_json(&self.client, url).await?;
        Ok(FallbackDiagnostics {
            console: wire
                .console
                .iter()
                .filter_map(parse_console_entry)
                .collect(),
            notes: wire.notes,
        })
    }

    async fn fetch_scan_report(&self, identifier: &str) -> Result<Option<ScanReport>> {
        let url = join(&self.base, &format!("api/apps/{identifier}/scan-report"))?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::backend(e.to_string()))?;
        // An unscanned scenario is not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .map_err(|e| Error::backend(e.to_string()))?;
        let report = response
            .json::<ScanReport>()
            .await
            .map_err(|e| Error::backend(format!("parse response from {url}: {e}")))?;
        Ok(Some(report))
    }

    async fn fetch_app_status(&self, identifier: &str) -> Result<AppStatus> {
        let url = join(&self.base, &format!("api/apps/{identifier}/status"))?;
        get_json(&self.client, url).await
    }

    async fn fetch_completeness(&self, identifier: &str) -> Result<CompletenessScore> {
        let url = join(&self.base, &format!("api/apps/{identifier}/completeness"))?;
        get_json(&self.client, url).await
    }
}

// ── HttpHealthService ─────────────────────────────────────────────────────────

/// [`crate::services::HealthService`] over the platform REST API.
#[derive(Debug, Clone)]
pub struct HttpHealthService {
    client: Client,
    base: Url,
}

impl HttpHealthService {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: parse_base(base_url)?,
        })
    }
}

impl HealthService for HttpHealthService {
    async fn fetch_snapshot(&self) -> Result<HealthSnapshot> {
        let url = join(&self.base, "api/health/checks")?;
        get_json(&self.client, url).await
    }

    async fn fetch_trend(&self, check_id: &str, window: TrendWindow) -> Result<Vec<TrendPoint>> {
        let mut url = join(&self.base, &format!("api/health/checks/{check_id}/trend"))?;
        url.query_pairs_mut().append_pair("window", window.as_str());
        get_json(&self.client, url).await
    }

    async fn set_auto_heal(&self, settings: &AutoHealSettings) -> Result<AutoHealSettings> {
        let url = join(&self.base, "api/health/auto-heal")?;
        let response = self
            .client
            .put(url.clone())
            .json(settings)
            .send()
            .await
            .map_err(|e| Error::backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::backend(e.to_string()))?;
        response
            .json::<AutoHealSettings>()
            .await
            .map_err(|e| Error::backend(format!("parse response from {url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_base_url() {
        assert!(matches!(
            HttpAppService::new("not a url"),
            Err(Error::ConfigInvalid { .. })
        ));
        assert!(matches!(
            HttpHealthService::new(""),
            Err(Error::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_join_builds_expected_paths() {
        let base = parse_base("http://localhost:8080/").unwrap();
        let url = join(&base, "api/apps/demo/logs").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/apps/demo/logs");
    }

    #[test]
    fn test_fallback_wire_parses_lenient_console_entries() {
        let wire: FallbackDiagnosticsWire = serde_json::from_str(
            r#"{"console": [{"level": "warning", "message": "m"}, {"level": "x"}], "notes": ["n"]}"#,
        )
        .unwrap();
        let parsed: Vec<_> = wire.console.iter().filter_map(parse_console_entry).collect();
        assert_eq!(parsed.len(), 1, "entry without message is dropped");
        assert_eq!(wire.notes, vec!["n".to_string()]);
    }
}
