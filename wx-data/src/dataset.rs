//! Processed dataset files: the feature table plus the split label, one row
//! per calendar day.

use crate::error::{DataError, Result};
use crate::features::FeatureRow;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs::File, io, path::Path};
use wx_meteo::Observation;
use wx_utils::dates::{format_date, parse_calendar_day};

/// Header of the processed dataset, in column order.
pub const DATASET_COLUMNS: [&str; 19] = [
    "date",
    "tmin",
    "tmax",
    "tavg",
    "precip",
    "wind_max",
    "location",
    "lat",
    "lon",
    "dow",
    "month",
    "is_weekend",
    "tavg_lag_1",
    "tavg_lag_7",
    "tavg_lag_14",
    "tavg_roll_mean_7",
    "tavg_roll_std_7",
    "tavg_roll_mean_30",
    "is_test",
];

pub const REQUIRED_DATASET_COLUMNS: [&str; 12] = [
    "date",
    "tavg",
    "dow",
    "month",
    "is_weekend",
    "tavg_lag_1",
    "tavg_lag_7",
    "tavg_lag_14",
    "tavg_roll_mean_7",
    "tavg_roll_std_7",
    "tavg_roll_mean_30",
    "is_test",
];

#[derive(Debug, Serialize, Deserialize)]
struct DatasetRow {
    date: String,
    #[serde(default)]
    tmin: Option<f64>,
    #[serde(default)]
    tmax: Option<f64>,
    tavg: Option<f64>,
    #[serde(default)]
    precip: Option<f64>,
    #[serde(default)]
    wind_max: Option<f64>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    dow: u32,
    month: u32,
    is_weekend: u8,
    tavg_lag_1: Option<f64>,
    tavg_lag_7: Option<f64>,
    tavg_lag_14: Option<f64>,
    tavg_roll_mean_7: Option<f64>,
    tavg_roll_std_7: Option<f64>,
    tavg_roll_mean_30: Option<f64>,
    is_test: u8,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

impl From<&FeatureRow> for DatasetRow {
    fn from(row: &FeatureRow) -> Self {
        let obs = &row.observation;
        DatasetRow {
            date: format_date(&obs.date),
            tmin: obs.tmin,
            tmax: obs.tmax,
            tavg: obs.tavg,
            precip: obs.precip,
            wind_max: obs.wind_max,
            location: obs.location.clone(),
            lat: obs.lat,
            lon: obs.lon,
            dow: row.dow,
            month: row.month,
            is_weekend: u8::from(row.is_weekend),
            tavg_lag_1: row.tavg_lag_1,
            tavg_lag_7: row.tavg_lag_7,
            tavg_lag_14: row.tavg_lag_14,
            tavg_roll_mean_7: row.tavg_roll_mean_7,
            tavg_roll_std_7: row.tavg_roll_std_7,
            tavg_roll_mean_30: row.tavg_roll_mean_30,
            is_test: u8::from(row.is_test),
        }
    }
}

impl TryFrom<DatasetRow> for FeatureRow {
    type Error = DataError;

    fn try_from(row: DatasetRow) -> Result<Self> {
        let date = parse_calendar_day(&row.date)
            .map_err(|e| DataError::DateParse(format!("{:?}: {}", row.date, e)))?;
        Ok(FeatureRow {
            observation: Observation {
                date,
                tmin: finite(row.tmin),
                tmax: finite(row.tmax),
                tavg: finite(row.tavg),
                precip: finite(row.precip),
                wind_max: finite(row.wind_max),
                location: row.location.filter(|l| !l.trim().is_empty()),
                lat: finite(row.lat),
                lon: finite(row.lon),
            },
            dow: row.dow,
            month: row.month,
            is_weekend: row.is_weekend != 0,
            tavg_lag_1: finite(row.tavg_lag_1),
            tavg_lag_7: finite(row.tavg_lag_7),
            tavg_lag_14: finite(row.tavg_lag_14),
            tavg_roll_mean_7: finite(row.tavg_roll_mean_7),
            tavg_roll_std_7: finite(row.tavg_roll_std_7),
            tavg_roll_mean_30: finite(row.tavg_roll_mean_30),
            is_test: row.is_test != 0,
        })
    }
}

fn require_columns(headers: &StringRecord) -> Result<()> {
    for column in REQUIRED_DATASET_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(DataError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

/// Fail unless every row is exactly one day after the previous one.
pub fn check_daily_calendar(rows: &[FeatureRow]) -> Result<()> {
    for pair in rows.windows(2) {
        let (previous, next) = (pair[0].date(), pair[1].date());
        if (next - previous).num_days() != 1 {
            return Err(DataError::CalendarGap { previous, next });
        }
    }
    Ok(())
}

/// Parse a processed dataset and check that it sits on a daily calendar.
pub fn read_dataset<R: io::Read>(reader: R) -> Result<Vec<FeatureRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    require_columns(rdr.headers()?)?;
    let rows = rdr
        .deserialize::<DatasetRow>()
        .map(|row| FeatureRow::try_from(row?))
        .collect::<Result<Vec<_>>>()?;
    check_daily_calendar(&rows)?;
    Ok(rows)
}

pub fn write_dataset<W: io::Write>(rows: &[FeatureRow], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        wtr.serialize(DatasetRow::from(row))?;
    }
    if rows.is_empty() {
        wtr.write_record(DATASET_COLUMNS)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_dataset_path(path: &Path) -> Result<Vec<FeatureRow>> {
    let rows = read_dataset(File::open(path)?)?;
    info!("Loaded {} dataset rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn write_dataset_path(rows: &[FeatureRow], path: &Path) -> Result<()> {
    write_dataset(rows, File::create(path)?)?;
    info!("Wrote {} dataset rows to {}", rows.len(), path.display());
    Ok(())
}
