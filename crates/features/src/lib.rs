//! Feature computation for the PM10 forecasting pipeline.
//!
//! This crate handles:
//! - Calendar features (hour, weekday, day of year, month)
//! - Lag and trailing rolling-mean features of the target
//! - Auxiliary pollutant catalog resolution
//! - Feature matrix assembly and the one-step-ahead supervised shift

pub mod calendar;
pub mod catalog;
pub mod dataset;
pub mod engine;
pub mod rolling;

pub use calendar::{CalendarFeatures, CALENDAR_FEATURES};
pub use catalog::{resolve_auxiliary, AuxiliaryColumn, AUXILIARY_CATALOG};
pub use dataset::SupervisedDataset;
pub use engine::{lag_feature_name, rolling_feature_name, FeatureBuilder, FeatureFrame};
pub use rolling::RollingMean;
