//! Structured responses returned by the pipeline.
//!
//! Field names are camelCase on the wire.

use chrono::NaiveDate;
use pm10_core::{AirQualityBand, Error, ForecastPoint, Result, Timestamp};
use pm10_model::RegressionMetrics;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Recent observed PM10 level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStatus {
    /// Mean of the trailing observed targets.
    pub current_pm10: f64,
    /// Band of `current_pm10`.
    pub air_quality: AirQualityBand,
}

/// Statistics over the whole forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSummary {
    /// Number of forecast hours.
    pub hours_ahead: usize,
    /// Mean forecast value.
    pub average_pm10: f64,
    /// Lowest forecast value.
    pub min_pm10: f64,
    /// Highest forecast value.
    pub max_pm10: f64,
    /// Population standard deviation.
    pub std_pm10: f64,
    /// Band of `average_pm10`.
    pub overall_air_quality: AirQualityBand,
}

/// Mean forecast for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPrediction {
    /// 1-based position of the date in the forecast.
    pub day: usize,
    /// Calendar date, no timezone conversion.
    pub date: NaiveDate,
    /// Mean of the forecast hours on `date`.
    pub average_pm10: f64,
    /// Band of `average_pm10`.
    pub air_quality: AirQualityBand,
}

/// One forecast hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPrediction {
    /// Forecast time.
    pub datetime: Timestamp,
    /// Forecast PM10, never negative.
    pub pm10_value: f64,
    /// Hour of day [0, 23].
    pub hour: u32,
    /// Day of month [1, 31].
    pub day: u32,
}

impl From<&ForecastPoint> for HourlyPrediction {
    fn from(p: &ForecastPoint) -> Self {
        Self {
            datetime: p.timestamp,
            pm10_value: p.pm10,
            hour: p.hour,
            day: p.day,
        }
    }
}

/// Successful `predict` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    /// Always `true`.
    pub success: bool,
    /// Recent observed level.
    pub current_status: CurrentStatus,
    /// Horizon-wide statistics.
    pub prediction_summary: PredictionSummary,
    /// Per-date means in date order.
    pub daily_predictions: Vec<DailyPrediction>,
    /// Every forecast hour in time order.
    pub hourly_predictions: Vec<HourlyPrediction>,
    /// Local time the response was built.
    pub generated_at: Timestamp,
}

/// Successful `train` response.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable status line.
    pub message: String,
    /// Hold-out metrics.
    pub metrics: RegressionMetrics,
}

impl TrainingResponse {
    /// Successful response carrying `metrics`.
    pub fn new(metrics: RegressionMetrics) -> Self {
        Self {
            success: true,
            message: "Model trained successfully".to_string(),
            metrics,
        }
    }
}

/// Response emitted for any aborted run.
#[derive(Debug, Clone, Serialize)]
pub struct FailureResponse {
    /// Always `false`.
    pub success: bool,
    /// Display text of the error.
    pub error: String,
    /// Stable error category tag.
    pub kind: &'static str,
}

impl From<&Error> for FailureResponse {
    fn from(err: &Error) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

/// Builds the prediction response from observed targets and forecast points.
pub struct ResponseAssembler {
    status_window: usize,
}

impl ResponseAssembler {
    /// `status_window` trailing observations feed the current status.
    pub fn new(status_window: usize) -> Self {
        Self { status_window }
    }

    /// Mean of the last `min(status_window, n)` observed targets.
    pub fn current_status(&self, targets: &[f64]) -> Result<CurrentStatus> {
        if targets.is_empty() {
            return Err(Error::computation("no observed targets for current status"));
        }
        let start = targets.len().saturating_sub(self.status_window);
        let current_pm10 = targets[start..].iter().mean();
        Ok(CurrentStatus {
            current_pm10,
            air_quality: AirQualityBand::classify(current_pm10),
        })
    }

    /// Mean, range and population spread of the forecast.
    pub fn summary(&self, points: &[ForecastPoint]) -> Result<PredictionSummary> {
        if points.is_empty() {
            return Err(Error::computation("cannot summarize an empty forecast"));
        }
        let values: Vec<f64> = points.iter().map(|p| p.pm10).collect();
        let average_pm10 = values.iter().mean();
        let min_pm10 = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max_pm10 = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std_pm10 = values.iter().population_std_dev();

        Ok(PredictionSummary {
            hours_ahead: points.len(),
            average_pm10,
            min_pm10,
            max_pm10,
            std_pm10,
            overall_air_quality: AirQualityBand::classify(average_pm10),
        })
    }

    /// Per-date means in date order.
    pub fn daily(&self, points: &[ForecastPoint]) -> Vec<DailyPrediction> {
        let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for p in points {
            let entry = buckets.entry(p.date()).or_insert((0.0, 0));
            entry.0 += p.pm10;
            entry.1 += 1;
        }
        buckets
            .into_iter()
            .enumerate()
            .map(|(i, (date, (sum, count)))| {
                let average_pm10 = sum / count as f64;
                DailyPrediction {
                    day: i + 1,
                    date,
                    average_pm10,
                    air_quality: AirQualityBand::classify(average_pm10),
                }
            })
            .collect()
    }

    /// Assemble the full response.
    pub fn assemble(
        &self,
        observed_targets: &[f64],
        points: &[ForecastPoint],
        generated_at: Timestamp,
    ) -> Result<PredictionResponse> {
        Ok(PredictionResponse {
            success: true,
            current_status: self.current_status(observed_targets)?,
            prediction_summary: self.summary(points)?,
            daily_predictions: self.daily(points),
            hourly_predictions: points.iter().map(HourlyPrediction::from).collect(),
            generated_at,
        })
    }
}
