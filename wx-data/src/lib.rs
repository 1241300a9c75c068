//! Series preparation for daily weather observations.
//!
//! Raw observations are placed on a gapless calendar, turned into a feature
//! table and labelled train or test by a trailing window.

pub mod calendar;
pub mod dataset;
pub mod date_range;
pub mod error;
pub mod features;
pub mod split;

pub use calendar::{normalize, NormalizedSeries};
pub use error::{DataError, Result};
pub use features::{build_features, FeatureRow};
pub use split::SplitPolicy;

use wx_meteo::Observation;

/// Normalize, featurize and label raw observations in one pass.
pub fn prepare(observations: Vec<Observation>, policy: &SplitPolicy) -> Result<Vec<FeatureRow>> {
    let series = normalize(observations)?;
    let mut rows = build_features(&series);
    policy.label(&mut rows);
    Ok(rows)
}
