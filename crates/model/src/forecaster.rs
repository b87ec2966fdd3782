//! Recursive multi-step forecasting.
//!
//! Starts from the most recent feature row and steps forward one hour at a
//! time. Calendar features follow the forecast timestamp and the lag-1
//! feature carries the previous step's prediction; every other feature
//! stays at its last observed value.

use crate::trainer::ModelBundle;
use chrono::TimeDelta;
use ndarray::Array1;
use pm10_core::config::HorizonConfig;
use pm10_core::{Error, ForecastPoint, Result, Timestamp};
use pm10_features::{lag_feature_name, CalendarFeatures, FeatureFrame, CALENDAR_FEATURES};
use tracing::{debug, info};

/// Runs the autoregressive forecast loop with a trained bundle.
pub struct Forecaster<'a> {
    bundle: &'a ModelBundle,
    /// Schema slot of each calendar feature, in `CALENDAR_FEATURES` order.
    calendar_slots: [Option<usize>; 4],
    lag1_slot: Option<usize>,
    max_horizon: usize,
}

impl<'a> Forecaster<'a> {
    /// Resolve the feature slots updated during the loop.
    pub fn new(bundle: &'a ModelBundle) -> Self {
        let schema = &bundle.schema;
        let calendar_slots = CALENDAR_FEATURES.map(|name| schema.index_of(name));
        let lag1_slot = schema.index_of(&lag_feature_name(1));
        Self {
            bundle,
            calendar_slots,
            lag1_slot,
            max_horizon: HorizonConfig::default().max_horizon,
        }
    }

    /// Override the largest accepted horizon.
    pub fn with_max_horizon(mut self, max_horizon: usize) -> Self {
        self.max_horizon = max_horizon;
        self
    }

    /// Forecast `horizon` hourly values after the last row of `frame`.
    ///
    /// Predictions are clamped at zero. The result has exactly `horizon`
    /// points spaced one hour apart.
    pub fn forecast(&self, frame: &FeatureFrame, horizon: usize) -> Result<Vec<ForecastPoint>> {
        if horizon == 0 {
            return Err(Error::config("forecast horizon must be positive"));
        }
        if horizon > self.max_horizon {
            return Err(Error::config(format!(
                "forecast horizon {} exceeds the maximum of {} hours",
                horizon, self.max_horizon
            )));
        }
        if frame.schema != self.bundle.schema {
            return Err(Error::computation(
                "feature schema differs between training and inference",
            ));
        }
        let (seed_ts, seed_row) = frame
            .last_row()
            .ok_or_else(|| Error::computation("no observed row to forecast from"))?;

        let hours = i64::try_from(horizon)
            .map_err(|_| Error::computation(format!("horizon {} out of range", horizon)))?;
        TimeDelta::try_hours(hours)
            .and_then(|d| seed_ts.checked_add_signed(d))
            .ok_or_else(|| {
                Error::computation(format!("{} + {}h is out of range", seed_ts, hours))
            })?;
        let times = (1..=hours)
            .map(|h| {
                TimeDelta::try_hours(h)
                    .and_then(|d| seed_ts.checked_add_signed(d))
                    .ok_or_else(|| {
                        Error::computation(format!("{} + {}h is out of range", seed_ts, h))
                    })
            })
            .collect::<Result<Vec<Timestamp>>>()?;

        let mut features = seed_row.to_owned();
        let mut points = Vec::with_capacity(times.len());
        for ts in times {
            let pm10 = self.step(&mut features, ts)?;
            debug!(%ts, pm10, "forecast step");
            points.push(ForecastPoint::new(ts, pm10));
        }

        info!(horizon, from = %seed_ts, "forecast complete");
        Ok(points)
    }

    /// Predict the hour at `ts` and carry the clamped value into lag-1.
    fn step(&self, features: &mut Array1<f64>, ts: Timestamp) -> Result<f64> {
        let calendar = CalendarFeatures::from_timestamp(&ts).values();
        for (slot, value) in self.calendar_slots.iter().zip(calendar) {
            if let Some(idx) = slot {
                features[*idx] = value;
            }
        }

        let raw = self.bundle.predict_row(features.view())?;
        if !raw.is_finite() {
            return Err(Error::computation(format!(
                "non-finite prediction at {}",
                ts
            )));
        }
        let pm10 = raw.max(0.0);
        if let Some(idx) = self.lag1_slot {
            features[idx] = pm10;
        }
        Ok(pm10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{ForestParams, RandomForest};
    use crate::scaler::StandardScaler;
    use crate::trainer::Trainer;
    use chrono::{Duration, NaiveDate};
    use ndarray::Array2;
    use pm10_core::config::ModelConfig;
    use pm10_core::FeatureSchema;
    use pm10_features::{rolling_feature_name, SupervisedDataset};

    fn start() -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn frame(n: usize) -> FeatureFrame {
        let timestamps: Vec<_> = (0..n).map(|i| start() + Duration::hours(i as i64)).collect();
        let targets: Vec<f64> = (0..n).map(|i| 20.0 + 5.0 * ((i % 24) as f64 / 4.0).sin()).collect();
        let names = vec![
            "hour".to_string(),
            "day_of_week".to_string(),
            "day_of_year".to_string(),
            "month".to_string(),
            lag_feature_name(1),
        ];
        let matrix = Array2::from_shape_fn((n, names.len()), |(i, j)| {
            let cal = CalendarFeatures::from_timestamp(&timestamps[i]).values();
            if j < 4 {
                cal[j]
            } else if i == 0 {
                targets[0]
            } else {
                targets[i - 1]
            }
        });
        FeatureFrame {
            schema: FeatureSchema::new(names),
            timestamps,
            matrix,
            targets,
        }
    }

    /// Frame with an auxiliary column, calendar, two lags and a rolling mean.
    fn full_frame(n: usize) -> FeatureFrame {
        let timestamps: Vec<_> = (0..n).map(|i| start() + Duration::hours(i as i64)).collect();
        let mut targets = vec![30.0];
        for i in 1..n {
            let prev = targets[i - 1];
            targets.push(10.0 + 0.7 * prev + 5.0 * (i as f64 / 3.0).sin());
        }
        let lag = |i: usize, l: usize| targets[i.saturating_sub(l)];
        let mut names = vec!["NO2".to_string()];
        names.extend(CALENDAR_FEATURES.iter().map(|s| s.to_string()));
        names.push(lag_feature_name(1));
        names.push(lag_feature_name(2));
        names.push(rolling_feature_name(5));

        let matrix = Array2::from_shape_fn((n, names.len()), |(i, j)| {
            let cal = CalendarFeatures::from_timestamp(&timestamps[i]).values();
            match j {
                0 => (i % 11) as f64,
                1..=4 => cal[j - 1],
                5 => lag(i, 1),
                6 => lag(i, 2),
                _ => {
                    let lo = i.saturating_sub(4);
                    targets[lo..=i].iter().sum::<f64>() / (i - lo + 1) as f64
                }
            }
        });
        FeatureFrame {
            schema: FeatureSchema::new(names),
            timestamps,
            matrix,
            targets,
        }
    }

    fn bundle(frame: &FeatureFrame) -> ModelBundle {
        let ds = SupervisedDataset::from_frame(frame).unwrap();
        let config = ModelConfig {
            n_trees: 10,
            ..ModelConfig::default()
        };
        Trainer::new(&config).train(&ds).unwrap().bundle
    }

    #[test]
    fn test_horizon_points_are_hourly() {
        let f = frame(200);
        let b = bundle(&f);
        let points = Forecaster::new(&b).forecast(&f, 24).unwrap();

        assert_eq!(points.len(), 24);
        let last = *f.timestamps.last().unwrap();
        assert_eq!(points[0].timestamp, last + Duration::hours(1));
        for pair in points.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
        assert!(points.iter().all(|p| p.pm10 >= 0.0));
        assert_eq!(points[0].hour, 8);
    }

    #[test]
    fn test_only_lag1_and_calendar_change_between_steps() {
        let f = full_frame(220);
        let b = bundle(&f);
        let forecaster = Forecaster::new(&b);
        let slot = |name: &str| b.schema.index_of(name).unwrap();
        let lag1 = slot("PM10_lag_1");
        let fixed = [slot("NO2"), slot("PM10_lag_2"), slot("PM10_ma_5")];

        let (seed_ts, seed_row) = f.last_row().unwrap();
        let mut features = seed_row.to_owned();
        let mut previous = seed_row[lag1];
        let mut trace = Vec::new();

        for h in 1..=4 {
            let ts = seed_ts + Duration::hours(h);
            let calendar = CalendarFeatures::from_timestamp(&ts).values();

            let mut expected_input = seed_row.to_owned();
            for (name, value) in CALENDAR_FEATURES.iter().zip(calendar) {
                expected_input[slot(*name)] = value;
            }
            expected_input[lag1] = previous;
            let expected = b.predict_row(expected_input.view()).unwrap().max(0.0);

            let pm10 = forecaster.step(&mut features, ts).unwrap();
            assert_eq!(pm10, expected, "step {}", h);
            assert_eq!(features[lag1], pm10);
            for &i in &fixed {
                assert_eq!(features[i], seed_row[i], "slot {} moved at step {}", i, h);
            }
            for (name, value) in CALENDAR_FEATURES.iter().zip(calendar) {
                assert_eq!(features[slot(*name)], value);
            }

            previous = pm10;
            trace.push(pm10);
        }

        let points = forecaster.forecast(&f, 4).unwrap();
        let values: Vec<f64> = points.iter().map(|p| p.pm10).collect();
        assert_eq!(values, trace);
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let f = frame(150);
        let b = bundle(&f);
        let a = Forecaster::new(&b).forecast(&f, 12).unwrap();
        let c = Forecaster::new(&b).forecast(&f, 12).unwrap();
        let av: Vec<f64> = a.iter().map(|p| p.pm10).collect();
        let cv: Vec<f64> = c.iter().map(|p| p.pm10).collect();
        assert_eq!(av, cv);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let f = frame(100);
        let b = bundle(&f);
        assert!(Forecaster::new(&b).forecast(&f, 0).is_err());
    }

    #[test]
    fn test_huge_horizon_is_error_not_panic() {
        let f = frame(100);
        let b = bundle(&f);
        let forecaster = Forecaster::new(&b);
        for horizon in [usize::MAX, 1 << 62, HorizonConfig::default().max_horizon + 1] {
            assert!(matches!(
                forecaster.forecast(&f, horizon),
                Err(Error::Config(_))
            ));
        }

        let unbounded = Forecaster::new(&b).with_max_horizon(usize::MAX);
        assert!(matches!(
            unbounded.forecast(&f, usize::MAX),
            Err(Error::Computation(_))
        ));
    }

    #[test]
    fn test_non_finite_prediction_is_error() {
        let f = frame(60);
        let x = f.matrix.clone();
        let y = Array1::from_elem(x.nrows(), f64::NAN);
        let params = ForestParams {
            n_trees: 2,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: false,
            seed: 1,
        };
        let b = ModelBundle {
            scaler: StandardScaler::fit(&x).unwrap(),
            model: RandomForest::fit(&x, &y, &params).unwrap(),
            schema: f.schema.clone(),
        };
        assert!(matches!(
            Forecaster::new(&b).forecast(&f, 3),
            Err(Error::Computation(_))
        ));
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let f = frame(100);
        let b = bundle(&f);
        let mut other = f.clone();
        other.schema = FeatureSchema::new(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
            "e".to_string(),
        ]);
        assert!(matches!(
            Forecaster::new(&b).forecast(&other, 5),
            Err(Error::Computation(_))
        ));
    }
}
