//! PM10 forecast CLI
//!
//! Trains the forecasting model on a folder of measurement files and
//! prints metrics or a multi-day forecast.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pm10_core::{Error, ForecastConfig};
use pm10_pipeline::{FailureResponse, Pipeline, PredictionResponse, TrainingResponse};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pm10-forecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PM10 air-quality forecasting", long_about = None)]
struct Cli {
    /// Run mode
    #[arg(long, value_enum)]
    action: Action,

    /// Forecast horizon in hours (defaults to the configured horizon)
    #[arg(long)]
    hours: Option<usize>,

    /// Folder with measurement files
    #[arg(long, default_value = "folder")]
    data_folder: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output_format: OutputFormat,

    /// Optional JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Action {
    Train,
    Predict,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

enum Outcome {
    Trained(TrainingResponse),
    Predicted(Box<PredictionResponse>),
}

fn run(cli: &Cli) -> pm10_core::Result<Outcome> {
    let config = match &cli.config {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };
    let pipeline = Pipeline::new(config)?;

    match cli.action {
        Action::Train => pipeline.train(&cli.data_folder).map(Outcome::Trained),
        Action::Predict => pipeline
            .predict(&cli.data_folder, cli.hours)
            .map(|r| Outcome::Predicted(Box::new(r))),
    }
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string(value).context("failed to serialize response")
}

fn render(outcome: &Outcome, format: OutputFormat) -> anyhow::Result<String> {
    match (outcome, format) {
        (Outcome::Trained(r), OutputFormat::Json) => to_json(r),
        (Outcome::Predicted(r), OutputFormat::Json) => to_json(r),
        (Outcome::Trained(r), OutputFormat::Text) => Ok(format!(
            "[SUCCESS] Model trained successfully (MAE: {:.3}, RMSE: {:.3}, R^2: {:.3})",
            r.metrics.mae, r.metrics.rmse, r.metrics.r2
        )),
        (Outcome::Predicted(r), OutputFormat::Text) => {
            let summary = &r.prediction_summary;
            Ok(format!(
                "[SUCCESS] Forecast generated for {} hours\nAverage PM10: {:.2} ({})",
                summary.hours_ahead,
                summary.average_pm10,
                summary.overall_air_quality.level.label()
            ))
        }
    }
}

fn render_failure(err: &Error, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(&FailureResponse::from(err)),
        OutputFormat::Text => Ok(format!("[ERROR] {}", err)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "pm10=warn" } else { "pm10=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let (rendered, code) = match run(&cli) {
        Ok(outcome) => (render(&outcome, cli.output_format), ExitCode::SUCCESS),
        Err(err) => {
            tracing::error!(kind = err.kind(), "{}", err);
            (render_failure(&err, cli.output_format), ExitCode::from(1))
        }
    };

    match rendered {
        Ok(text) => {
            println!("{}", text);
            code
        }
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(1)
        }
    }
}
