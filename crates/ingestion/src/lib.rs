//! Data ingestion and normalization for the PM10 forecasting pipeline.
//!
//! This crate handles:
//! - Multi-file loading with delimiter sniffing
//! - Timestamp and target column resolution
//! - Record cleaning (future stamps, duplicates, invalid targets)

pub mod cleaner;
pub mod loader;
pub mod schema;

pub use cleaner::{Cleaner, CleaningStats};
pub use loader::{FileReport, IngestReport, Ingestor};
pub use schema::{parse_timestamp, SchemaNormalizer};
