//! Pipeline registration as explicit data.
//!
//! The two scheduled variants are described by [`PipelineConfig`] entries and
//! resolved into [`Pipeline`]s against a caller-supplied reference date, so
//! registration is a pure function with no ambient "now" or global registry.

use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::Mode;

/// Per-task retry behavior the host applies around the whole extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between attempts (default: 30s)
    #[serde(default = "default_retry_delay")]
    pub retry_delay: Duration,

    /// Double the delay on each failed attempt (default: true)
    #[serde(default = "default_backoff")]
    pub exponential_backoff: bool,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay() -> Duration {
    Duration::from_secs(30)
}

const fn default_backoff() -> bool {
    true
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            exponential_backoff: default_backoff(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given failed attempt (0-indexed):
    /// `retry_delay * 2^attempt` when backing off, constant otherwise.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.exponential_backoff {
            self.retry_delay.saturating_mul(2u32.saturating_pow(attempt))
        } else {
            self.retry_delay
        }
    }
}

/// One entry of the registration list: a cadence plus its active window,
/// expressed in days relative to the registration reference date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub schedule: Mode,
    pub start_days_ago: i64,
    pub end_days_ago: Option<i64>,
}

/// The two shipped variants: an open-ended hourly pipeline starting a day
/// back, and a daily backfill covering 10 through 2 days ago.
#[must_use]
pub fn default_pipeline_configs() -> Vec<PipelineConfig> {
    vec![
        PipelineConfig { schedule: Mode::Hourly, start_days_ago: 1, end_days_ago: None },
        PipelineConfig { schedule: Mode::Daily, start_days_ago: 10, end_days_ago: Some(2) },
    ]
}

/// A registered pipeline, ready to hand to the host scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub description: String,
    pub schedule: Mode,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub retry: RetryPolicy,
    pub max_active_runs: u32,
}

impl Pipeline {
    /// Cron preset string for the host scheduler, e.g. `@hourly`.
    #[must_use]
    pub fn schedule_preset(&self) -> String {
        format!("@{}", self.schedule)
    }
}

/// Resolve a configuration list into pipelines. `reference` anchors the
/// relative windows, so resolution is deterministic and testable.
#[must_use]
pub fn register_pipelines(configs: &[PipelineConfig], reference: NaiveDate) -> Vec<Pipeline> {
    configs
        .iter()
        .map(|cfg| Pipeline {
            name: format!("get_weather_data_{}", cfg.schedule),
            description: format!(
                "Retrieves weather data from WeatherAPI on a {} basis.",
                cfg.schedule
            ),
            schedule: cfg.schedule,
            start_date: reference - ChronoDuration::days(cfg.start_days_ago),
            end_date: cfg.end_days_ago.map(|days| reference - ChronoDuration::days(days)),
            retry: RetryPolicy::default(),
            max_active_runs: 3,
        })
        .collect()
}

/// Look up a registered pipeline by name.
#[must_use]
pub fn find_pipeline<'a>(pipelines: &'a [Pipeline], name: &str) -> Option<&'a Pipeline> {
    pipelines.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn default_configs_resolve_to_two_pipelines() {
        let pipelines = register_pipelines(&default_pipeline_configs(), reference());

        assert_eq!(pipelines.len(), 2);

        let hourly = &pipelines[0];
        assert_eq!(hourly.name, "get_weather_data_hourly");
        assert_eq!(hourly.schedule_preset(), "@hourly");
        assert_eq!(hourly.start_date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(hourly.end_date, None);
        assert_eq!(hourly.max_active_runs, 3);

        let daily = &pipelines[1];
        assert_eq!(daily.name, "get_weather_data_daily");
        assert_eq!(daily.schedule_preset(), "@daily");
        assert_eq!(daily.start_date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(daily.end_date, Some(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()));
    }

    #[test]
    fn pipeline_descriptions_name_the_cadence() {
        let pipelines = register_pipelines(&default_pipeline_configs(), reference());

        assert_eq!(
            pipelines[0].description,
            "Retrieves weather data from WeatherAPI on a hourly basis."
        );
        assert_eq!(
            pipelines[1].description,
            "Retrieves weather data from WeatherAPI on a daily basis."
        );
    }

    #[test]
    fn find_pipeline_by_name() {
        let pipelines = register_pipelines(&default_pipeline_configs(), reference());

        assert!(find_pipeline(&pipelines, "get_weather_data_daily").is_some());
        assert!(find_pipeline(&pipelines, "get_weather_data_weekly").is_none());
    }

    #[test]
    fn exponential_delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(30));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(120));
    }

    #[test]
    fn constant_delay_when_backoff_disabled() {
        let policy = RetryPolicy { exponential_backoff: false, ..RetryPolicy::default() };

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(30));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(30));
    }
}
