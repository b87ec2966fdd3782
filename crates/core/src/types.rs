//! Core data types for the PM10 forecasting pipeline.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wall-clock timestamp as written by the sensors (no timezone conversion).
pub type Timestamp = NaiveDateTime;

/// Canonical name of the prediction target.
pub const TARGET_COLUMN: &str = "PM10";

/// Untyped table of string cells stacked from one or more input files.
///
/// Rows always have exactly `columns.len()` cells; `None` marks a cell that
/// was empty or whose column did not exist in the row's source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column headers in first-seen order.
    pub columns: Vec<String>,
    /// Row cells aligned with `columns`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Create an empty table with the given headers.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, padding or truncating it to the table width.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Stack another table below this one, aligning columns by name.
    ///
    /// Columns only present in `other` are appended; earlier rows get `None`
    /// for them.
    pub fn append(&mut self, other: RawTable) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| match self.column_index(name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(name.clone());
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, None);
        }

        for row in other.rows {
            let mut aligned = vec![None; width];
            for (cell, &target) in row.into_iter().zip(&mapping) {
                aligned[target] = cell;
            }
            self.rows.push(aligned);
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row after timestamp resolution, before the target is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Canonical timestamp.
    pub timestamp: Timestamp,
    /// Raw target cell.
    pub target: Option<String>,
    /// All original cells, aligned with `NormalizedTable::columns`.
    pub values: Vec<Option<String>>,
}

/// Table with resolved timestamp and target columns.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// Original column headers.
    pub columns: Vec<String>,
    /// Columns the timestamp was derived from.
    pub timestamp_sources: Vec<String>,
    /// Column the target was taken from.
    pub target_source: String,
    /// Rows with a parseable timestamp, in input order.
    pub rows: Vec<NormalizedRow>,
    /// Rows dropped because their timestamp could not be parsed.
    pub unparsed_timestamps: usize,
}

/// One cleaned sensor record.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Observation time.
    pub timestamp: Timestamp,
    /// PM10 concentration.
    pub pm10: f64,
    /// Remaining cells, aligned with `WorkingTable::columns`.
    pub values: Vec<Option<String>>,
}

/// Cleaned readings, unique and strictly increasing by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingTable {
    /// Original column headers.
    pub columns: Vec<String>,
    /// Columns the timestamp was derived from.
    pub timestamp_sources: Vec<String>,
    /// Column the target was taken from.
    pub target_source: String,
    /// Sorted readings.
    pub readings: Vec<Reading>,
}

impl WorkingTable {
    /// Number of readings.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the table has no readings.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Target values in time order.
    pub fn targets(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.pm10).collect()
    }
}

/// Ordered feature names, fixed once at preprocessing time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema from ordered names.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Feature names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a feature by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// A single forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast time.
    pub timestamp: Timestamp,
    /// Predicted PM10 (never negative).
    pub pm10: f64,
    /// Hour of day [0, 23].
    pub hour: u32,
    /// Day of month [1, 31].
    pub day: u32,
}

impl ForecastPoint {
    /// Create a point, deriving calendar attributes from the timestamp.
    pub fn new(timestamp: Timestamp, pm10: f64) -> Self {
        Self {
            timestamp,
            pm10,
            hour: timestamp.hour(),
            day: timestamp.day(),
        }
    }

    /// Calendar date of the point.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Named air-quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirQualityLevel {
    #[serde(rename = "very good")]
    VeryGood,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "poor")]
    Poor,
    #[serde(rename = "very poor")]
    VeryPoor,
}

impl AirQualityLevel {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            AirQualityLevel::VeryGood => "very good",
            AirQualityLevel::Good => "good",
            AirQualityLevel::Moderate => "moderate",
            AirQualityLevel::Poor => "poor",
            AirQualityLevel::VeryPoor => "very poor",
        }
    }
}

/// Display color of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandColor {
    Green,
    Yellow,
    Orange,
    Red,
    Black,
}

/// Air-quality classification of a PM10 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQualityBand {
    /// Severity level.
    pub level: AirQualityLevel,
    /// Display color.
    pub color: BandColor,
    /// Numeric code, 1 (best) to 5 (worst).
    pub code: u8,
}

impl AirQualityBand {
    /// Classify a PM10 value. Each band includes its upper threshold.
    pub fn classify(pm10: f64) -> Self {
        let (level, color, code) = if pm10 <= 15.0 {
            (AirQualityLevel::VeryGood, BandColor::Green, 1)
        } else if pm10 <= 25.0 {
            (AirQualityLevel::Good, BandColor::Yellow, 2)
        } else if pm10 <= 50.0 {
            (AirQualityLevel::Moderate, BandColor::Orange, 3)
        } else if pm10 <= 75.0 {
            (AirQualityLevel::Poor, BandColor::Red, 4)
        } else {
            (AirQualityLevel::VeryPoor, BandColor::Black, 5)
        };
        Self { level, color, code }
    }
}
