//! Core library for the weather history ingestion pipeline.
//!
//! This crate defines:
//! - Shared domain models (extraction requests, weather records)
//! - The WeatherAPI history extractor and its error taxonomy
//! - Pipeline registration as explicit data
//! - The host-side retry runner and the record-sink row rendering
//! - Configuration & credential handling
//!
//! It is used by `ingest-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod runner;
pub mod sink;

pub use config::Config;
pub use extract::{ApiConfig, ExtractError, Extractor, WeatherApiExtractor};
pub use model::{ExtractionRequest, Mode, WeatherRecord};
pub use pipeline::{
    Pipeline, PipelineConfig, RetryPolicy, default_pipeline_configs, find_pipeline,
    register_pipelines,
};
pub use runner::{RunOutcome, run_with_retry};
