//! WeatherAPI.com history extractor.
//!
//! One invocation issues one GET against the history endpoint, filters the
//! returned hour entries by the request's mode, and maps them to flat
//! [`WeatherRecord`]s. Retry on failure belongs to the host, not here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::{ExtractionRequest, Mode, WeatherRecord};

/// Why an extraction invocation failed. Every variant is fatal for the
/// invocation; the host retries the whole call.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The API answered with a non-success status. Keeps the raw body in
    /// full; only the display form is truncated.
    #[error("WeatherAPI history request failed with status {status}: {}", truncate_body(.body))]
    Upstream { status: u16, body: String },

    /// The body decoded, but not into the shape an extraction needs.
    #[error("Malformed WeatherAPI history response: {0}")]
    MalformedResponse(String),

    /// The request could not be sent or the body could not be read.
    #[error("Failed to reach WeatherAPI: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP endpoint settings for the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// WeatherAPI base URL (default: <https://api.weatherapi.com/v1>)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Location query sent as `q` (default: "London")
    #[serde(default = "default_location")]
    pub location: String,

    /// Total request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.weatherapi.com/v1".to_string()
}

fn default_location() -> String {
    "London".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            location: default_location(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Extraction seam the runner and CLI depend on, so tests can script failures.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<WeatherRecord>, ExtractError>;
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaHour {
    time: String,
    temp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    hour: Vec<WaHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaHistoryResponse {
    location: WaLocation,
    forecast: WaForecast,
}

/// History-endpoint client. Holds the credential, a pre-built HTTP client
/// with the configured timeout, and no other state between calls.
#[derive(Debug, Clone)]
pub struct WeatherApiExtractor {
    api_key: String,
    http: Client,
    config: ApiConfig,
}

impl WeatherApiExtractor {
    pub fn new(api_key: String, config: ApiConfig) -> Result<Self, ExtractError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { api_key, http, config })
    }

    pub fn with_defaults(api_key: String) -> Result<Self, ExtractError> {
        Self::new(api_key, ApiConfig::default())
    }
}

#[async_trait]
impl Extractor for WeatherApiExtractor {
    #[instrument(skip(self, request), fields(mode = %request.mode(), date = %request.logical_date()))]
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<WeatherRecord>, ExtractError> {
        let url = format!("{}/history.json", self.config.base_url);
        let dt = request.logical_date().format("%Y-%m-%d").to_string();

        debug!(%url, q = %self.config.location, %dt, "requesting weather history");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", self.config.location.as_str()),
                ("dt", dt.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ExtractError::Upstream { status: status.as_u16(), body });
        }

        let parsed: WaHistoryResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractError::MalformedResponse(format!("undecodable JSON body: {e}")))?;

        // The API returns exactly one forecast-day per `dt` queried.
        let day = parsed
            .forecast
            .forecastday
            .first()
            .ok_or_else(|| {
                ExtractError::MalformedResponse(format!("no forecast-day entry for {dt}"))
            })?;

        let selected: Vec<&WaHour> = match request.mode() {
            Mode::Hourly => {
                let minute = request.logical_minute().ok_or_else(|| {
                    ExtractError::MalformedResponse(
                        "hourly request carries no logical minute".to_string(),
                    )
                })?;

                let entry = day.hour.iter().find(|h| h.time == minute).ok_or_else(|| {
                    ExtractError::MalformedResponse(format!(
                        "no hour entry labeled '{minute}' in response for {dt}"
                    ))
                })?;

                vec![entry]
            }
            Mode::Daily => day.hour.iter().collect(),
        };

        Ok(selected
            .into_iter()
            .map(|entry| WeatherRecord {
                location: parsed.location.name.clone(),
                time: entry.time.clone(),
                temp_celsius: entry.temp_c,
                condition: entry.condition.text.clone(),
            })
            .collect())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // Cut must land on a char boundary; upstream bodies are not ASCII-only.
    let mut cut = MAX;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }

    format!("{}...", &body[..cut])
}
