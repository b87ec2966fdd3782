//! Core types and configuration for the PM10 forecasting pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Table types for each pipeline stage (raw, normalized, cleaned)
//! - Feature schema and forecast points
//! - Air-quality classification
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::ForecastConfig;
pub use error::{Error, Result};
pub use types::*;
