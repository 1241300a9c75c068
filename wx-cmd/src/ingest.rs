//! Download of raw daily observations from Open-Meteo.

use anyhow::Context;
use chrono::NaiveDate;
use log::info;
use std::{fs::File, path::PathBuf};
use wx_meteo::{open_meteo::OpenMeteoClient, Observation};
use wx_utils::dates::{format_date, parse_date};
use wx_utils::paths::{ensure_parent_dir, slugify};

/// `data/raw/{slug}_{start}_{end}.csv`
pub fn default_outfile(location: &str, start: &NaiveDate, end: &NaiveDate) -> PathBuf {
    PathBuf::from("data/raw").join(format!(
        "{}_{}_{}.csv",
        slugify(location),
        format_date(start),
        format_date(end)
    ))
}

fn parse_range(start: &str, end: &str) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let start_date = parse_date(start).with_context(|| format!("invalid start date {start:?}"))?;
    let end_date = parse_date(end).with_context(|| format!("invalid end date {end:?}"))?;
    if start_date > end_date {
        anyhow::bail!("start date {} is after end date {}", start_date, end_date);
    }
    Ok((start_date, end_date))
}

/// Geocode `location`, fetch its daily history over [start, end] and write it
/// as raw observation CSV. Returns the path written.
pub async fn run_ingest(
    location: &str,
    start: &str,
    end: &str,
    outfile: Option<&str>,
) -> anyhow::Result<PathBuf> {
    let (start_date, end_date) = parse_range(start, end)?;
    let path = outfile
        .map(PathBuf::from)
        .unwrap_or_else(|| default_outfile(location, &start_date, &end_date));

    let client = OpenMeteoClient::new()?;
    let place = client.geocode(location).await?;
    let observations = client
        .fetch_observations(&place, &start_date, &end_date)
        .await?;

    ensure_parent_dir(&path)?;
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    Observation::write_csv(&observations, file)?;
    info!(
        "Saved {} rows for {} to {}",
        observations.len(),
        place.display_name,
        path.display()
    );
    Ok(path)
}
