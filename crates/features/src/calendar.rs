//! Calendar features derived from a timestamp.

use chrono::{Datelike, Timelike};
use pm10_core::Timestamp;

/// Calendar feature names, in schema order.
pub const CALENDAR_FEATURES: [&str; 4] = ["hour", "day_of_week", "day_of_year", "month"];

/// Deterministic calendar attributes of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// Hour of day [0, 23].
    pub hour: u32,
    /// Day of week, Monday = 0 [0, 6].
    pub day_of_week: u32,
    /// Day of year [1, 366].
    pub day_of_year: u32,
    /// Month [1, 12].
    pub month: u32,
}

impl CalendarFeatures {
    /// Derive calendar attributes.
    pub fn from_timestamp(ts: &Timestamp) -> Self {
        Self {
            hour: ts.hour(),
            day_of_week: ts.weekday().num_days_from_monday(),
            day_of_year: ts.ordinal(),
            month: ts.month(),
        }
    }

    /// Values in `CALENDAR_FEATURES` order.
    pub fn values(&self) -> [f64; 4] {
        [
            self.hour as f64,
            self.day_of_week as f64,
            self.day_of_year as f64,
            self.month as f64,
        ]
    }
}
