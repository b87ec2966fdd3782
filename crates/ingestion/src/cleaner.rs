//! Record cleaning.
//!
//! Steps, in order:
//! 1. drop records stamped beyond the future tolerance
//! 2. sort by timestamp and keep the first record of each timestamp
//! 3. drop records whose target is missing or non-numeric
//! 4. drop records below the target minimum
//! 5. drop records above the saturation cutoff

use chrono::{Local, Months};
use pm10_core::config::CleaningConfig;
use pm10_core::{NormalizedTable, Reading, Timestamp, WorkingTable};
use tracing::info;

/// Removal counts for each cleaning step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningStats {
    /// Rows entering the cleaner.
    pub input_rows: usize,
    /// Rows with a timestamp beyond the future tolerance.
    pub future: usize,
    /// Rows sharing a timestamp with an earlier row.
    pub duplicates: usize,
    /// Rows with a missing or non-numeric target.
    pub non_numeric: usize,
    /// Rows below the target minimum.
    pub negative: usize,
    /// Rows above the saturation cutoff.
    pub saturated: usize,
    /// Rows leaving the cleaner.
    pub output_rows: usize,
}

impl CleaningStats {
    /// Total rows removed.
    pub fn removed(&self) -> usize {
        self.input_rows - self.output_rows
    }
}

/// Parse a target cell as a finite number.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Removes invalid, duplicate and out-of-range records.
pub struct Cleaner {
    config: CleaningConfig,
    /// Reference "now" for the future-timestamp guard.
    reference_time: Timestamp,
}

impl Cleaner {
    /// Create a cleaner using the local wall clock as reference time.
    pub fn new(config: &CleaningConfig) -> Self {
        Self {
            config: config.clone(),
            reference_time: Local::now().naive_local(),
        }
    }

    /// Override the reference time.
    pub fn with_reference_time(mut self, now: Timestamp) -> Self {
        self.reference_time = now;
        self
    }

    /// Latest timestamp still accepted.
    pub fn future_cutoff(&self) -> Timestamp {
        self.reference_time
            .checked_add_months(Months::new(self.config.future_tolerance_months))
            .unwrap_or(Timestamp::MAX)
    }

    /// Clean a normalized table.
    pub fn clean(&self, table: NormalizedTable) -> (WorkingTable, CleaningStats) {
        let mut stats = CleaningStats {
            input_rows: table.rows.len(),
            ..Default::default()
        };

        let cutoff = self.future_cutoff();
        let mut rows: Vec<_> = table
            .rows
            .into_iter()
            .filter(|r| r.timestamp <= cutoff)
            .collect();
        stats.future = stats.input_rows - rows.len();

        // Stable sort keeps input order among equal timestamps.
        rows.sort_by_key(|r| r.timestamp);
        let before = rows.len();
        rows.dedup_by_key(|r| r.timestamp);
        stats.duplicates = before - rows.len();

        let mut readings = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(pm10) = row.target.as_deref().and_then(parse_number) else {
                stats.non_numeric += 1;
                continue;
            };
            if pm10 < self.config.target_min {
                stats.negative += 1;
                continue;
            }
            if pm10 > self.config.target_max {
                stats.saturated += 1;
                continue;
            }
            readings.push(Reading {
                timestamp: row.timestamp,
                pm10,
                values: row.values,
            });
        }
        stats.output_rows = readings.len();

        info!(
            input = stats.input_rows,
            future = stats.future,
            duplicates = stats.duplicates,
            non_numeric = stats.non_numeric,
            negative = stats.negative,
            saturated = stats.saturated,
            output = stats.output_rows,
            "cleaned readings"
        );

        let working = WorkingTable {
            columns: table.columns,
            timestamp_sources: table.timestamp_sources,
            target_source: table.target_source,
            readings,
        };
        (working, stats)
    }
}
