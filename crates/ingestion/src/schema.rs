//! Timestamp and target column resolution.
//!
//! Timestamp sources are found by case-insensitive substring match on
//! "date" and "time"; the target by a match on "PM10"/"pm10".

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use pm10_core::{Error, NormalizedRow, NormalizedTable, RawTable, Result, Timestamp};
use tracing::{info, warn};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse a timestamp in any of the accepted layouts.
///
/// Date-only values resolve to midnight. RFC 3339 values keep their local
/// wall-clock time (the offset is discarded).
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_local());
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Where the canonical timestamp comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TimestampSource {
    /// A single column holding date and time.
    Single(usize),
    /// Separate date and time columns joined with a space.
    Joined { date: usize, time: usize },
}

/// Resolves canonical timestamp and target columns.
#[derive(Debug, Clone, Default)]
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    /// Create a normalizer.
    pub fn new() -> Self {
        Self
    }

    fn find_timestamp_source(columns: &[String]) -> Option<TimestampSource> {
        let date = columns.iter().position(|c| c.to_lowercase().contains("date"));
        let time = columns.iter().position(|c| c.to_lowercase().contains("time"));
        match (date, time) {
            (Some(d), Some(t)) if d != t => Some(TimestampSource::Joined { date: d, time: t }),
            (Some(idx), _) | (None, Some(idx)) => Some(TimestampSource::Single(idx)),
            (None, None) => None,
        }
    }

    fn find_target(columns: &[String]) -> Option<usize> {
        columns
            .iter()
            .position(|c| c.contains("PM10") || c.contains("pm10"))
    }

    /// Resolve columns and parse every row's timestamp.
    ///
    /// Rows with an unparseable timestamp are dropped and counted. Fails when
    /// either column cannot be found or no row has a valid timestamp.
    pub fn normalize(&self, table: RawTable) -> Result<NormalizedTable> {
        let source = Self::find_timestamp_source(&table.columns).ok_or_else(|| {
            Error::schema(format!(
                "no date/time column among {:?}",
                table.columns
            ))
        })?;
        let target_idx = Self::find_target(&table.columns).ok_or_else(|| {
            Error::schema(format!("no PM10 column among {:?}", table.columns))
        })?;

        let timestamp_sources = match source {
            TimestampSource::Single(idx) => vec![table.columns[idx].clone()],
            TimestampSource::Joined { date, time } => {
                vec![table.columns[date].clone(), table.columns[time].clone()]
            }
        };
        let target_source = table.columns[target_idx].clone();

        let total = table.len();
        let mut rows = Vec::with_capacity(total);
        for values in table.rows {
            let timestamp = match source {
                TimestampSource::Single(idx) => values[idx].as_deref().and_then(parse_timestamp),
                TimestampSource::Joined { date, time } => match (&values[date], &values[time]) {
                    (Some(d), Some(t)) => parse_timestamp(&format!("{} {}", d, t)),
                    _ => None,
                },
            };
            if let Some(timestamp) = timestamp {
                rows.push(NormalizedRow {
                    timestamp,
                    target: values[target_idx].clone(),
                    values,
                });
            }
        }

        let unparsed_timestamps = total - rows.len();
        if rows.is_empty() {
            return Err(Error::schema(format!(
                "no parseable timestamps in {:?}",
                timestamp_sources
            )));
        }
        if unparsed_timestamps > 0 {
            warn!(rows = unparsed_timestamps, "dropped rows with unparseable timestamps");
        }
        info!(
            timestamp = ?timestamp_sources,
            target = %target_source,
            rows = rows.len(),
            "resolved schema"
        );

        Ok(NormalizedTable {
            columns: table.columns,
            timestamp_sources,
            target_source,
            rows,
            unparsed_timestamps,
        })
    }
}
