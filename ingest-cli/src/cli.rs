use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use ingest_core::{
    Config, ExtractionRequest, Extractor, Mode, WeatherApiExtractor, default_pipeline_configs,
    find_pipeline, model, register_pipelines, runner, sink,
};
use inquire::{Password, Text};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "ingest", version, about = "Weather history ingestion tasks")]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// VALUES tuples for the warehouse insert step.
    Sql,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI credential and optional location override.
    Configure,

    /// Execute one task invocation for a registered pipeline.
    Run {
        /// Pipeline name, e.g. "get_weather_data_hourly".
        pipeline: String,

        /// Logical date (YYYY-MM-DD); required by daily pipelines.
        #[arg(long)]
        date: Option<String>,

        /// Logical timestamp; required by hourly pipelines.
        #[arg(long)]
        timestamp: Option<String>,

        /// Rendering for the emitted rows.
        #[arg(long, value_enum, default_value_t = OutputFormat::Sql)]
        format: OutputFormat,

        /// Perform a single attempt instead of the pipeline's retry policy.
        #[arg(long)]
        no_retry: bool,
    },

    /// List the registered pipelines.
    Pipelines,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Run { pipeline, date, timestamp, format, no_retry } => {
                run_task(&pipeline, date.as_deref(), timestamp.as_deref(), format, no_retry).await
            }
            Command::Pipelines => {
                list_pipelines();
                Ok(())
            }
        }
    }
}

/// Determine log filter level from verbosity count.
pub const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("WeatherAPI key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    let current_location = config.api.location.clone();
    let location = Text::new("Location:")
        .with_default(&current_location)
        .prompt()
        .context("Failed to read location")?;
    config.api.location = location;

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn run_task(
    name: &str,
    date: Option<&str>,
    timestamp: Option<&str>,
    format: OutputFormat,
    no_retry: bool,
) -> Result<()> {
    let config = Config::load()?;
    let api_key = config.api_key()?;

    let today = Local::now().date_naive();
    let pipelines = register_pipelines(&default_pipeline_configs(), today);
    let pipeline = find_pipeline(&pipelines, name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown pipeline '{name}'.\n\
             Hint: run `ingest pipelines` to list the registered pipelines."
        )
    })?;

    let request = match pipeline.schedule {
        Mode::Hourly => {
            let ts = timestamp.context("Hourly pipelines require --timestamp")?;
            ExtractionRequest::hourly(model::parse_logical_timestamp(ts)?)
        }
        Mode::Daily => {
            let ds = date.context("Daily pipelines require --date")?;
            ExtractionRequest::daily(model::parse_logical_date(ds)?)
        }
    };

    let extractor = WeatherApiExtractor::new(api_key, config.api.clone())?;

    let records = if no_retry {
        extractor.extract(&request).await?
    } else {
        runner::run_with_retry(&extractor, &request, &pipeline.retry)
            .await?
            .records
    };

    match format {
        OutputFormat::Sql => {
            for row in sink::to_values_list(&records) {
                println!("{row}");
            }
        }
        OutputFormat::Json => {
            for record in &records {
                println!(
                    "{}",
                    serde_json::to_string(record).context("Failed to serialize record")?
                );
            }
        }
    }

    Ok(())
}

fn list_pipelines() {
    let today = Local::now().date_naive();

    for pipeline in register_pipelines(&default_pipeline_configs(), today) {
        let end = pipeline
            .end_date
            .map_or_else(|| "open".to_string(), |date| date.to_string());

        println!(
            "{}  schedule={}  window={}..{}  retries={}x{}s{}  max_active_runs={}",
            pipeline.name,
            pipeline.schedule_preset(),
            pipeline.start_date,
            end,
            pipeline.retry.max_retries,
            pipeline.retry.retry_delay.as_secs(),
            if pipeline.retry.exponential_backoff { " (exponential)" } else { "" },
            pipeline.max_active_runs,
        );
    }
}
