//! The closed set of forecasting strategies and the holdout they are scored
//! on.

use crate::baseline::{persistence, seasonal_persistence, DEFAULT_SEASONAL_PERIOD};
use crate::error::{ModelError, Result};
use crate::ridge::{RidgeConfig, RidgeModel};
use crate::sarima::{SarimaConfig, SarimaModel};
use chrono::NaiveDate;
use log::info;
use std::{fmt, ops::Range, str::FromStr};
use wx_data::{features::REGRESSOR_NAMES, FeatureRow};

/// Selector for a forecasting strategy, by its command-line name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecasterKind {
    Persistence,
    SeasonalPersistence,
    Sarima,
    Ridge,
}

impl ForecasterKind {
    pub const ALL: [ForecasterKind; 4] = [
        ForecasterKind::Persistence,
        ForecasterKind::SeasonalPersistence,
        ForecasterKind::Sarima,
        ForecasterKind::Ridge,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ForecasterKind::Persistence => "naive",
            ForecasterKind::SeasonalPersistence => "seasonal_naive",
            ForecasterKind::Sarima => "sarima",
            ForecasterKind::Ridge => "ridge",
        }
    }
}

impl fmt::Display for ForecasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ForecasterKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        ForecasterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| {
                let names: Vec<&str> = ForecasterKind::ALL.iter().map(|k| k.name()).collect();
                ModelError::Input(format!(
                    "unknown model {:?}, expected one of {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// The train/test partition of a labelled feature table: a run of train rows
/// followed by a contiguous run of test rows reaching the last date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holdout {
    train_len: usize,
    test_dates: Vec<NaiveDate>,
}

impl Holdout {
    pub fn from_rows(rows: &[FeatureRow]) -> Result<Self> {
        let train_len = rows.iter().take_while(|r| !r.is_test).count();
        if let Some(stray) = rows[train_len..].iter().find(|r| !r.is_test) {
            return Err(ModelError::Input(format!(
                "test rows are not a trailing window: {} is labelled train after the first test date",
                stray.date()
            )));
        }
        if train_len == rows.len() {
            return Err(ModelError::Input("dataset has no test rows".to_string()));
        }
        let test_dates = rows[train_len..].iter().map(FeatureRow::date).collect();
        Ok(Holdout {
            train_len,
            test_dates,
        })
    }

    /// Keep only the first `horizon` test days.
    pub fn limit(mut self, horizon: usize) -> Self {
        self.test_dates.truncate(horizon);
        self
    }

    pub fn train_len(&self) -> usize {
        self.train_len
    }

    pub fn test_len(&self) -> usize {
        self.test_dates.len()
    }

    pub fn train_range(&self) -> Range<usize> {
        0..self.train_len
    }

    /// Row indices of the (possibly limited) test window.
    pub fn test_range(&self) -> Range<usize> {
        self.train_len..self.train_len + self.test_dates.len()
    }

    pub fn test_dates(&self) -> &[NaiveDate] {
        &self.test_dates
    }
}

/// A configured forecasting strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Forecaster {
    /// Yesterday's value
    Persistence,
    /// The value one season ago, else yesterday's
    SeasonalPersistence { period: usize },
    Sarima(SarimaConfig),
    Ridge(RidgeConfig),
}

impl From<ForecasterKind> for Forecaster {
    fn from(kind: ForecasterKind) -> Self {
        match kind {
            ForecasterKind::Persistence => Forecaster::Persistence,
            ForecasterKind::SeasonalPersistence => Forecaster::SeasonalPersistence {
                period: DEFAULT_SEASONAL_PERIOD,
            },
            ForecasterKind::Sarima => Forecaster::Sarima(SarimaConfig::default()),
            ForecasterKind::Ridge => Forecaster::Ridge(RidgeConfig::default()),
        }
    }
}

impl Forecaster {
    pub fn kind(&self) -> ForecasterKind {
        match self {
            Forecaster::Persistence => ForecasterKind::Persistence,
            Forecaster::SeasonalPersistence { .. } => ForecasterKind::SeasonalPersistence,
            Forecaster::Sarima(_) => ForecasterKind::Sarima,
            Forecaster::Ridge(_) => ForecasterKind::Ridge,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Predict every date of the holdout's test window.
    ///
    /// `target` and `rows` are the whole series, train and test. The result
    /// is aligned with [`Holdout::test_dates`]; `None` marks a date the
    /// strategy cannot predict.
    pub fn forecast(
        &self,
        target: &[Option<f64>],
        holdout: &Holdout,
        rows: &[FeatureRow],
    ) -> Result<Vec<Option<f64>>> {
        if target.len() != rows.len() {
            return Err(ModelError::Input(format!(
                "target has {} values but there are {} feature rows",
                target.len(),
                rows.len()
            )));
        }
        if holdout.test_range().end > rows.len() {
            return Err(ModelError::Input(format!(
                "holdout ends at row {} but the series has {} rows",
                holdout.test_range().end,
                rows.len()
            )));
        }
        let test = holdout.test_range();

        let predictions = match self {
            Forecaster::Persistence => persistence(target)[test].to_vec(),
            Forecaster::SeasonalPersistence { period } => {
                seasonal_persistence(target, *period)[test].to_vec()
            }
            Forecaster::Sarima(config) => {
                let model = SarimaModel::fit(config, &target[holdout.train_range()])?;
                model
                    .forecast(holdout.test_len())
                    .into_iter()
                    .map(Some)
                    .collect()
            }
            Forecaster::Ridge(config) => forecast_ridge(config, target, holdout, rows)?,
        };

        info!(
            "{} predicted {} of {} test days",
            self.name(),
            predictions.iter().flatten().count(),
            predictions.len()
        );
        Ok(predictions)
    }
}

/// Fit on complete train rows, predict complete test rows.
fn forecast_ridge(
    config: &RidgeConfig,
    target: &[Option<f64>],
    holdout: &Holdout,
    rows: &[FeatureRow],
) -> Result<Vec<Option<f64>>> {
    let (x, y): (Vec<Vec<f64>>, Vec<f64>) = holdout
        .train_range()
        .filter_map(|i| Some((rows[i].regressors()?.to_vec(), target[i]?)))
        .unzip();
    info!(
        "Ridge training on {} of {} train rows with complete features [{}]",
        x.len(),
        holdout.train_len(),
        REGRESSOR_NAMES.join(", ")
    );
    let model = RidgeModel::fit(config, &x, &y)?;
    Ok(rows[holdout.test_range()]
        .iter()
        .map(|row| row.regressors().map(|features| model.predict(&features)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wx_data::{prepare, SplitPolicy};
    use wx_meteo::Observation;

    fn labelled(values: &[f64], test_days: u32) -> Vec<FeatureRow> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation {
                date: start + Duration::days(i as i64),
                tmin: None,
                tmax: None,
                tavg: Some(*v),
                precip: None,
                wind_max: None,
                location: Some("Lisbon,PT".to_string()),
                lat: None,
                lon: None,
            })
            .collect();
        prepare(observations, &SplitPolicy::new(test_days)).unwrap()
    }

    fn target(rows: &[FeatureRow]) -> Vec<Option<f64>> {
        rows.iter().map(FeatureRow::target).collect()
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ForecasterKind::ALL {
            assert_eq!(kind.name().parse::<ForecasterKind>().unwrap(), kind);
            assert_eq!(Forecaster::from(kind).kind(), kind);
        }
        assert!(matches!(
            "prophet".parse::<ForecasterKind>(),
            Err(ModelError::Input(_))
        ));
    }

    #[test]
    fn test_holdout_is_trailing_window() {
        let rows = labelled(&[1.0; 20], 5);
        let holdout = Holdout::from_rows(&rows).unwrap();
        assert_eq!(holdout.train_len(), 15);
        assert_eq!(holdout.test_len(), 5);
        assert_eq!(holdout.test_dates()[0], rows[15].date());

        let limited = holdout.limit(2);
        assert_eq!(limited.test_range(), 15..17);
    }

    #[test]
    fn test_holdout_rejects_interleaved_labels() {
        let mut rows = labelled(&[1.0; 20], 5);
        rows[17].is_test = false;
        assert!(matches!(Holdout::from_rows(&rows), Err(ModelError::Input(_))));

        let mut rows = labelled(&[1.0; 20], 5);
        for row in rows.iter_mut() {
            row.is_test = false;
        }
        assert!(matches!(Holdout::from_rows(&rows), Err(ModelError::Input(_))));
    }

    #[test]
    fn test_persistence_predictions_align_with_test_dates() {
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let rows = labelled(&values, 5);
        let holdout = Holdout::from_rows(&rows).unwrap();
        let preds = Forecaster::Persistence
            .forecast(&target(&rows), &holdout, &rows)
            .unwrap();
        assert_eq!(preds, vec![Some(14.0), Some(15.0), Some(16.0), Some(17.0), Some(18.0)]);
    }

    #[test]
    fn test_seasonal_persistence_reads_across_the_split() {
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let rows = labelled(&values, 5);
        let holdout = Holdout::from_rows(&rows).unwrap();
        let preds = Forecaster::SeasonalPersistence { period: 7 }
            .forecast(&target(&rows), &holdout, &rows)
            .unwrap();
        assert_eq!(preds[0], Some(8.0));
        assert_eq!(preds.len(), 5);
    }

    #[test]
    fn test_sarima_without_train_rows_is_a_fit_error() {
        let rows = labelled(&[3.0; 10], 365);
        let holdout = Holdout::from_rows(&rows).unwrap();
        assert_eq!(holdout.train_len(), 0);
        assert!(matches!(
            Forecaster::from(ForecasterKind::Sarima).forecast(&target(&rows), &holdout, &rows),
            Err(ModelError::Fit { .. })
        ));
    }

    #[test]
    fn test_sarima_covers_the_test_range() {
        let values: Vec<f64> = (0..80)
            .map(|t| 10.0 + (t as f64 * std::f64::consts::TAU / 7.0).cos() + (t as f64 * 1.3).sin() * 0.4)
            .collect();
        let rows = labelled(&values, 10);
        let holdout = Holdout::from_rows(&rows).unwrap();
        let preds = Forecaster::from(ForecasterKind::Sarima)
            .forecast(&target(&rows), &holdout, &rows)
            .unwrap();
        assert_eq!(preds.len(), 10);
        assert!(preds.iter().all(|p| p.is_some_and(f64::is_finite)));
    }

    #[test]
    fn test_ridge_predicts_only_complete_rows() {
        let values: Vec<f64> = (0..80)
            .map(|t| 10.0 + (t as f64 * 0.2).sin() * 4.0)
            .collect();
        let mut rows = labelled(&values, 10);
        rows[75].tavg_lag_7 = None;
        let holdout = Holdout::from_rows(&rows).unwrap();
        let preds = Forecaster::from(ForecasterKind::Ridge)
            .forecast(&target(&rows), &holdout, &rows)
            .unwrap();
        assert_eq!(preds.len(), 10);
        assert_eq!(preds[5], None);
        assert_eq!(preds.iter().flatten().count(), 9);
    }

    #[test]
    fn test_ridge_without_complete_train_rows_is_a_fit_error() {
        // 20 train days never fill the 30-day rolling window
        let rows = labelled(&[5.0; 25], 5);
        let holdout = Holdout::from_rows(&rows).unwrap();
        assert!(matches!(
            Forecaster::from(ForecasterKind::Ridge).forecast(&target(&rows), &holdout, &rows),
            Err(ModelError::Fit { model: "ridge", .. })
        ));
    }

    #[test]
    fn test_mismatched_target_is_an_input_error() {
        let rows = labelled(&[1.0; 10], 3);
        let holdout = Holdout::from_rows(&rows).unwrap();
        assert!(matches!(
            Forecaster::Persistence.forecast(&[Some(1.0)], &holdout, &rows),
            Err(ModelError::Input(_))
        ));
    }
}
