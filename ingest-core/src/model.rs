use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Extraction cadence. Doubles as the schedule identifier of the pipeline
/// variant that issues the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Hourly,
    Daily,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Hourly => "hourly",
            Mode::Daily => "daily",
        }
    }

    pub const fn all() -> &'static [Mode] {
        &[Mode::Hourly, Mode::Daily]
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Mode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "hourly" => Ok(Mode::Hourly),
            "daily" => Ok(Mode::Daily),
            _ => Err(anyhow::anyhow!(
                "Unknown schedule '{value}'. Supported schedules: hourly, daily."
            )),
        }
    }
}

/// One task invocation's inputs, as handed over by the host scheduler.
///
/// The constructors enforce that an hourly request always carries the logical
/// minute it selects on, and a daily request never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    mode: Mode,
    logical_date: NaiveDate,
    logical_minute: Option<String>,
}

impl ExtractionRequest {
    /// Build an hourly request from the run's logical timestamp. The date is
    /// derived from the timestamp; the selection label is the timestamp
    /// truncated to minute precision, matching the API's hour labels.
    pub fn hourly(logical_ts: NaiveDateTime) -> Self {
        Self {
            mode: Mode::Hourly,
            logical_date: logical_ts.date(),
            logical_minute: Some(logical_ts.format("%Y-%m-%d %H:%M").to_string()),
        }
    }

    /// Build a daily request covering every hour of the logical date.
    pub fn daily(logical_date: NaiveDate) -> Self {
        Self { mode: Mode::Daily, logical_date, logical_minute: None }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn logical_date(&self) -> NaiveDate {
        self.logical_date
    }

    /// Minute-precision hour label to select, present only for hourly requests.
    pub fn logical_minute(&self) -> Option<&str> {
        self.logical_minute.as_deref()
    }
}

/// Parse a `ds`-style calendar date (`YYYY-MM-DD`) supplied by the host.
pub fn parse_logical_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid logical date '{value}', expected YYYY-MM-DD"))
}

/// Parse a host-supplied logical timestamp. Accepts RFC 3339 as well as naive
/// `YYYY-MM-DDTHH:MM[:SS]` and `YYYY-MM-DD HH:MM[:SS]` forms.
pub fn parse_logical_timestamp(value: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }

    Err(anyhow::anyhow!(
        "Invalid logical timestamp '{value}', expected RFC 3339 or YYYY-MM-DD HH:MM[:SS]"
    ))
}

/// One flat observation handed to the downstream insert step. `time` is the
/// API's hour label, copied verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub time: String,
    pub temp_celsius: f64,
    pub condition: String,
}
