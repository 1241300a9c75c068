//! Reindexing of daily observations onto a gapless calendar.

use crate::date_range::DateRange;
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use log::{debug, info};
use wx_meteo::Observation;

/// Longest run of consecutive missing days that is interpolated. Longer runs
/// stay null so real outages remain visible downstream.
pub const MAX_INTERPOLATED_GAP: usize = 3;

/// Linear interpolation across short holes in a daily column.
pub mod interpolation {
    /// Value at `step` of `steps` on the straight line from `start` to `end`.
    pub fn interpolate_between(start: f64, end: f64, step: usize, steps: usize) -> f64 {
        start + (end - start) * step as f64 / steps as f64
    }

    /// Fill interior runs of `None` no longer than `max_gap`, using the known
    /// values on both sides. Longer runs, and runs touching either end of the
    /// slice, are left untouched. Returns the number of cells filled.
    pub fn fill_short_gaps(values: &mut [Option<f64>], max_gap: usize) -> usize {
        let mut filled = 0;
        let mut last_known: Option<usize> = None;

        for i in 0..values.len() {
            let Some(end) = values[i] else { continue };
            if let Some(k) = last_known {
                let run = i - k - 1;
                if run > 0 && run <= max_gap {
                    // values[k] is Some by construction of last_known
                    let start = values[k].unwrap_or(end);
                    let steps = i - k;
                    for (step, slot) in values[k + 1..i].iter_mut().enumerate() {
                        *slot = Some(interpolate_between(start, end, step + 1, steps));
                    }
                    filled += run;
                }
            }
            last_known = Some(i);
        }

        filled
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_interpolate_between() {
            assert_eq!(interpolate_between(7.0, 16.0, 0, 5), 7.0);
            assert!((interpolate_between(7.0, 16.0, 1, 5) - 8.8).abs() < 1e-12);
            assert_eq!(interpolate_between(7.0, 16.0, 5, 5), 16.0);
        }

        #[test]
        fn test_single_hole_is_midpoint() {
            let mut values = vec![Some(10.0), None, Some(14.0)];
            assert_eq!(fill_short_gaps(&mut values, 3), 1);
            assert_eq!(values[1], Some(12.0));
        }

        #[test]
        fn test_run_of_three_is_filled() {
            let mut values = vec![Some(0.0), None, None, None, Some(8.0)];
            assert_eq!(fill_short_gaps(&mut values, 3), 3);
            assert_eq!(values, vec![Some(0.0), Some(2.0), Some(4.0), Some(6.0), Some(8.0)]);
        }

        #[test]
        fn test_run_of_four_stays_null() {
            let mut values = vec![Some(0.0), None, None, None, None, Some(10.0)];
            assert_eq!(fill_short_gaps(&mut values, 3), 0);
            assert!(values[1..5].iter().all(Option::is_none));
        }

        #[test]
        fn test_edges_are_not_extrapolated() {
            let mut values = vec![None, Some(1.0), Some(2.0), None];
            assert_eq!(fill_short_gaps(&mut values, 3), 0);
            assert_eq!(values, vec![None, Some(1.0), Some(2.0), None]);
        }
    }
}

/// Daily records covering every date from the first to the last observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSeries {
    records: Vec<Observation>,
}

impl NormalizedSeries {
    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// The mean temperature column, one entry per day.
    pub fn target(&self) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.tavg).collect()
    }
}

/// Accessors for the numeric columns that are gap-filled.
const NUMERIC_COLUMNS: [(&str, fn(&mut Observation) -> &mut Option<f64>); 7] = [
    ("tmin", |o| &mut o.tmin),
    ("tmax", |o| &mut o.tmax),
    ("tavg", |o| &mut o.tavg),
    ("precip", |o| &mut o.precip),
    ("wind_max", |o| &mut o.wind_max),
    ("lat", |o| &mut o.lat),
    ("lon", |o| &mut o.lon),
];

fn empty_day(date: NaiveDate) -> Observation {
    Observation {
        date,
        tmin: None,
        tmax: None,
        tavg: None,
        precip: None,
        wind_max: None,
        location: None,
        lat: None,
        lon: None,
    }
}

/// Reindex `observations` onto every day in [min date, max date].
///
/// Missing days get empty records, numeric columns are interpolated across
/// holes of at most [`MAX_INTERPOLATED_GAP`] days, and the location label is
/// carried forward then backward. Empty input gives an empty series; the same
/// date twice is an error.
pub fn normalize(mut observations: Vec<Observation>) -> Result<NormalizedSeries> {
    observations.sort_by_key(|o| o.date);
    for pair in observations.windows(2) {
        if pair[0].date == pair[1].date {
            return Err(DataError::DuplicateDate(pair[0].date));
        }
    }

    let (first, last) = match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Ok(NormalizedSeries::default()),
    };

    let observed = observations.len();
    let mut by_date = observations.into_iter().peekable();
    let mut records: Vec<Observation> = DateRange(first, last)
        .map(|date| match by_date.next_if(|o| o.date == date) {
            Some(observation) => observation,
            None => empty_day(date),
        })
        .collect();

    for (name, column) in NUMERIC_COLUMNS {
        let mut values: Vec<Option<f64>> = records.iter_mut().map(|r| *column(r)).collect();
        let filled = interpolation::fill_short_gaps(&mut values, MAX_INTERPOLATED_GAP);
        if filled > 0 {
            debug!("Interpolated {} missing {} values", filled, name);
        }
        for (record, value) in records.iter_mut().zip(values) {
            *column(record) = value;
        }
    }

    fill_location(&mut records);

    info!(
        "Normalized {} observations onto {} days ({} to {})",
        observed,
        records.len(),
        first,
        last
    );
    Ok(NormalizedSeries { records })
}

/// Carry the location label forward, then backward over the leading slots.
fn fill_location(records: &mut [Observation]) {
    let mut carried: Option<String> = None;
    for record in records.iter_mut() {
        match &record.location {
            Some(label) => carried = Some(label.clone()),
            None => record.location = carried.clone(),
        }
    }
    let first_known = records.iter().find_map(|r| r.location.clone());
    for record in records.iter_mut() {
        if record.location.is_some() {
            break;
        }
        record.location = first_known.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(offset)
    }

    fn obs(offset: i64, tavg: f64) -> Observation {
        Observation {
            tavg: Some(tavg),
            location: Some("Austin,US".to_string()),
            lat: Some(30.27),
            lon: Some(-97.74),
            ..empty_day(day(offset))
        }
    }

    #[test]
    fn test_empty_input_gives_empty_series() {
        let series = normalize(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
    }

    #[test]
    fn test_index_is_gapless_from_min_to_max() {
        let observations = vec![obs(9, 1.0), obs(0, 1.0), obs(3, 1.0), obs(4, 1.0)];
        let series = normalize(observations).unwrap();
        assert_eq!(series.len(), 10);
        assert_eq!(series.first_date(), Some(day(0)));
        assert_eq!(series.last_date(), Some(day(9)));
        for (i, record) in series.records().iter().enumerate() {
            assert_eq!(record.date, day(i as i64));
        }
    }

    #[test]
    fn test_single_missing_day_is_linear_interpolation() {
        let series = normalize(vec![obs(0, 10.0), obs(2, 13.0)]).unwrap();
        assert_eq!(series.records()[1].tavg, Some(11.5));
        assert_eq!(series.records()[1].lat, Some(30.27));
    }

    #[test]
    fn test_long_gap_stays_null() {
        let series = normalize(vec![obs(0, 10.0), obs(5, 20.0)]).unwrap();
        let target = series.target();
        assert_eq!(target.len(), 6);
        assert!(target[1..5].iter().all(Option::is_none));
        assert_eq!(target[5], Some(20.0));
    }

    #[test]
    fn test_location_carried_forward_and_back() {
        let mut first = obs(0, 1.0);
        first.location = None;
        let observations = vec![first, obs(1, 2.0), obs(6, 3.0)];
        let series = normalize(observations).unwrap();
        assert!(series
            .records()
            .iter()
            .all(|r| r.location.as_deref() == Some("Austin,US")));
    }

    #[test]
    fn test_duplicate_date_is_rejected() {
        match normalize(vec![obs(0, 1.0), obs(1, 2.0), obs(1, 3.0)]) {
            Err(DataError::DuplicateDate(date)) => assert_eq!(date, day(1)),
            other => panic!("expected DuplicateDate, got {other:?}"),
        }
    }
}
