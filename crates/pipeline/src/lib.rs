//! End-to-end PM10 forecasting pipeline.
//!
//! Chains ingestion, cleaning, feature building, training and forecasting
//! into the two run modes and assembles their structured responses.

pub mod response;
pub mod run;

pub use response::{
    CurrentStatus, DailyPrediction, FailureResponse, HourlyPrediction, PredictionResponse,
    PredictionSummary, ResponseAssembler, TrainingResponse,
};
pub use run::{Pipeline, PreparedData};
