use crate::config::Settings;
use crate::ingest::types::AssetFeedResponse;
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/assets";
const DEFAULT_RETRIES: u32 = 3;

#[async_trait::async_trait]
pub trait AssetFeedClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_assets(&self) -> Result<AssetFeedResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonAssetFeed {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonAssetFeed {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_asset_feed_base_url()?.to_string();
        let api_key = settings.asset_feed_api_key.clone();

        let timeout_secs = std::env::var("ASSET_FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("ASSET_FEED_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("ASSET_FEED_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build asset feed http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries: retries.max(1),
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self) -> Result<AssetFeedResponse> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .send()
            .await
            .context("asset feed request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read asset feed response")?;

        if !status.is_success() {
            anyhow::bail!("asset feed HTTP {status}: {text}");
        }

        parse_feed_body(&text)
    }
}

#[async_trait::async_trait]
impl AssetFeedClient for HttpJsonAssetFeed {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_assets(&self) -> Result<AssetFeedResponse> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once().await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = retry_backoff(attempt);
                    tracing::warn!(attempt, ?backoff, error = %err, "asset feed fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

const MAX_BACKOFF_SHIFT: u32 = 6;

/// Delay before retrying after the given failed attempt (1-based): 1s, 2s, 4s, capped at 64s.
fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT))
}

/// Reads a feed export from disk; used for local runs and backfills.
#[derive(Debug, Clone)]
pub struct FileAssetFeed {
    path: PathBuf,
}

impl FileAssetFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl AssetFeedClient for FileAssetFeed {
    fn provider_name(&self) -> &'static str {
        "local_file"
    }

    async fn fetch_assets(&self) -> Result<AssetFeedResponse> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read asset file {}", self.path.display()))?;
        parse_feed_body(&text)
    }
}

/// Accepts the `{generated_at, items}` envelope or a bare array of records.
pub fn parse_feed_body(text: &str) -> Result<AssetFeedResponse> {
    let raw_json = serde_json::from_str::<Value>(text)
        .with_context(|| format!("asset feed body is not valid JSON: {text}"))?;

    match raw_json {
        Value::Array(items) => Ok(AssetFeedResponse {
            generated_at: Utc::now(),
            items,
        }),
        other => serde_json::from_value::<AssetFeedResponse>(other)
            .context("failed to parse asset feed body into AssetFeedResponse"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    #[test]
    fn parses_envelope_and_keeps_items_raw() {
        let generated_at = Utc.with_ymd_and_hms(2026, 1, 27, 10, 0, 0).unwrap();
        let body = json!({
            "generated_at": generated_at,
            "items": [{"id": "asset_1"}, {"id": "asset_2", "type": "bonds"}]
        })
        .to_string();

        let parsed = parse_feed_body(&body).unwrap();
        assert_eq!(parsed.generated_at, generated_at);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[1]["type"], "bonds");
    }

    #[test]
    fn accepts_bare_array() {
        let parsed = parse_feed_body(r#"[{"id": "asset_1"}]"#).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert!(parsed.generated_at.date_naive() >= NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn rejects_non_json_and_bad_envelope() {
        assert!(parse_feed_body("<html>").is_err());
        assert!(parse_feed_body(r#"{"items": 3}"#).is_err());
    }

    #[test]
    fn retry_backoff_doubles_then_caps() {
        assert_eq!(retry_backoff(1), Duration::from_secs(1));
        assert_eq!(retry_backoff(3), Duration::from_secs(4));
        assert_eq!(retry_backoff(7), Duration::from_secs(64));
        assert_eq!(retry_backoff(200), Duration::from_secs(64));
    }
}
