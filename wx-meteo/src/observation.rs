use crate::error::{MeteoError, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::{io, path::Path};
use wx_utils::dates::{format_date, parse_calendar_day};

/// Header of the raw observation CSV, in column order.
pub const RAW_COLUMNS: [&str; 9] = [
    "date", "tmin", "tmax", "tavg", "precip", "wind_max", "location", "lat", "lon",
];

/// Columns a raw observation file must carry; every other column is optional.
pub const REQUIRED_RAW_COLUMNS: [&str; 2] = ["date", "tavg"];

/// One calendar day of weather for one location.
///
/// Temperatures are degrees Celsius, precipitation millimetres and wind km/h,
/// as delivered by Open-Meteo. Any numeric reading may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    pub tavg: Option<f64>,
    pub precip: Option<f64>,
    pub wind_max: Option<f64>,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A raw CSV row before the date is validated.
#[derive(Debug, Serialize, Deserialize)]
struct RawRow {
    date: String,
    #[serde(default)]
    tmin: Option<f64>,
    #[serde(default)]
    tmax: Option<f64>,
    #[serde(default)]
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
}

/// Treat `NaN` cells the same as empty cells.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Fail with the first required column absent from `headers`.
pub fn require_columns(headers: &StringRecord, required: &[&str]) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(MeteoError::MissingColumn((*column).to_string()));
        }
    }
    Ok(())
}

impl TryFrom<RawRow> for Observation {
    type Error = MeteoError;

    fn try_from(row: RawRow) -> Result<Self> {
        let date = parse_calendar_day(&row.date)
            .map_err(|e| MeteoError::DateParse(format!("{:?}: {}", row.date, e)))?;
        Ok(Observation {
            date,
            tmin: finite(row.tmin),
            tmax: finite(row.tmax),
            tavg: finite(row.tavg),
            precip: finite(row.precip),
            wind_max: finite(row.wind_max),
            location: row.location.filter(|l| !l.trim().is_empty()),
            lat: finite(row.lat),
            lon: finite(row.lon),
        })
    }
}

impl From<&Observation> for RawRow {
    fn from(obs: &Observation) -> Self {
        RawRow {
            date: format_date(&obs.date),
            tmin: obs.tmin,
            tmax: obs.tmax,
            tavg: obs.tavg,
            precip: obs.precip,
            wind_max: obs.wind_max,
            location: obs.location.clone(),
            lat: obs.lat,
            lon: obs.lon,
        }
    }
}

impl Observation {
    /// Parse raw observation CSV (with headers) into Observations.
    ///
    /// `date` and `tavg` must be present as columns; cells may be empty.
    pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<Observation>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        require_columns(rdr.headers()?, &REQUIRED_RAW_COLUMNS)?;
        rdr.deserialize::<RawRow>()
            .map(|row| Observation::try_from(row?))
            .collect()
    }

    /// Read a raw observation CSV file from disk.
    pub fn from_path(path: &Path) -> Result<Vec<Observation>> {
        let file = std::fs::File::open(path)?;
        let observations = Observation::read_csv(file)?;
        log::info!(
            "Loaded {} observations from {}",
            observations.len(),
            path.display()
        );
        Ok(observations)
    }

    /// Write Observations as raw CSV with the standard header.
    pub fn write_csv<W: io::Write>(observations: &[Observation], writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
        for obs in observations {
            wtr.serialize(RawRow::from(obs))?;
        }
        if observations.is_empty() {
            wtr.write_record(RAW_COLUMNS)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
