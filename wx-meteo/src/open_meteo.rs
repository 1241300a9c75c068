//! Open-Meteo retrieval: response parsing plus the HTTP client (`api` feature).
//!
//! Parsing is kept separate from the transport so the JSON handling can be
//! exercised without network access.

use crate::{
    error::{MeteoError, Result},
    location::Location,
    observation::Observation,
};
use serde::Deserialize;
use wx_utils::dates::parse_calendar_day;

#[cfg(feature = "api")]
use chrono::NaiveDate;
#[cfg(feature = "api")]
use log::{info, warn};
#[cfg(feature = "api")]
use reqwest::Client;
#[cfg(feature = "api")]
use std::time::Duration;
#[cfg(feature = "api")]
use wx_utils::dates::format_date;

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Daily variables requested from the archive endpoint.
pub const DAILY_VARIABLES: [&str; 5] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "temperature_2m_mean",
    "precipitation_sum",
    "windspeed_10m_max",
];

#[cfg(feature = "api")]
const GEOCODING_TIMEOUT: Duration = Duration::from_secs(30);
#[cfg(feature = "api")]
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(default)]
    daily: Option<DailyBlock>,
}

/// Column-oriented daily block; each vector is indexed like `time`.
#[derive(Debug, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    windspeed_10m_max: Vec<Option<f64>>,
}

fn cell(column: &[Option<f64>], index: usize) -> Option<f64> {
    column.get(index).copied().flatten()
}

/// Turn an archive response body into Observations tagged with `location`.
///
/// A day without a mean temperature gets the midpoint of its min and max.
/// A body without daily rows is an upstream failure, reported with `context`.
pub fn observations_from_daily_response(
    location: &Location,
    context: &str,
    body: &str,
) -> Result<Vec<Observation>> {
    let response: DailyResponse = serde_json::from_str(body)?;
    let daily = match response.daily {
        Some(daily) if !daily.time.is_empty() => daily,
        _ => {
            return Err(MeteoError::UpstreamService {
                context: context.to_string(),
                status: None,
                detail: "no daily data returned".to_string(),
            })
        }
    };

    daily
        .time
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let date = parse_calendar_day(day)
                .map_err(|e| MeteoError::DateParse(format!("{day:?}: {e}")))?;
            let tmin = cell(&daily.temperature_2m_min, i);
            let tmax = cell(&daily.temperature_2m_max, i);
            let tavg = cell(&daily.temperature_2m_mean, i).or(match (tmin, tmax) {
                (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
                _ => None,
            });
            Ok(Observation {
                date,
                tmin,
                tmax,
                tavg,
                precip: cell(&daily.precipitation_sum, i),
                wind_max: cell(&daily.windspeed_10m_max, i),
                location: Some(location.display_name.clone()),
                lat: Some(location.latitude),
                lon: Some(location.longitude),
            })
        })
        .collect()
}

/// HTTP client for the Open-Meteo geocoding and archive endpoints.
///
/// Each request carries a fixed timeout; failures are returned, never retried.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    geocoding_url: String,
    archive_url: String,
}

#[cfg(feature = "api")]
impl OpenMeteoClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoints(GEOCODING_URL, ARCHIVE_URL)
    }

    /// Point the client at other hosts (mirrors or a local stub).
    pub fn with_endpoints(geocoding_url: &str, archive_url: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            geocoding_url: geocoding_url.to_string(),
            archive_url: archive_url.to_string(),
        })
    }

    /// Resolve a free-form place name to coordinates.
    pub async fn geocode(&self, place: &str) -> Result<Location> {
        let context = format!("geocode {place:?}");
        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("name", place),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .timeout(GEOCODING_TIMEOUT)
            .send()
            .await?;
        let body = Self::success_body(response, &context).await?;
        let location = Location::from_geocode_response(place, &body)?;
        info!(
            "Geocoded {:?} to {} ({}, {})",
            place, location.display_name, location.latitude, location.longitude
        );
        Ok(location)
    }

    /// Fetch daily observations for `location` over [start, end] inclusive.
    pub async fn fetch_observations(
        &self,
        location: &Location,
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> Result<Vec<Observation>> {
        let start_str = format_date(start);
        let end_str = format_date(end);
        let context = format!(
            "daily weather for {} ({}, {}) from {} to {}",
            location.display_name, location.latitude, location.longitude, start_str, end_str
        );
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let daily = DAILY_VARIABLES.join(",");
        let response = self
            .client
            .get(&self.archive_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("start_date", start_str.as_str()),
                ("end_date", end_str.as_str()),
                ("daily", daily.as_str()),
                ("timezone", "auto"),
            ])
            .timeout(ARCHIVE_TIMEOUT)
            .send()
            .await?;
        let body = Self::success_body(response, &context).await?;
        let observations = observations_from_daily_response(location, &context, &body)?;
        info!("Fetched {} daily observations: {}", observations.len(), context);
        Ok(observations)
    }

    async fn success_body(response: reqwest::Response, context: &str) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("Bad response status for {}: {}", context, status);
            return Err(MeteoError::UpstreamService {
                context: context.to_string(),
                status: Some(status.as_u16()),
                detail: body,
            });
        }
        if body.trim().is_empty() {
            return Err(MeteoError::UpstreamService {
                context: context.to_string(),
                status: Some(status.as_u16()),
                detail: "empty response body".to_string(),
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn austin() -> Location {
        Location {
            latitude: 30.26715,
            longitude: -97.74306,
            display_name: "Austin,US".to_string(),
        }
    }

    // https://archive-api.open-meteo.com/v1/archive?latitude=30.26715&longitude=-97.74306&start_date=2023-01-01&end_date=2023-01-03&daily=...
    const DAILY: &str = r#"{"latitude":30.27,"longitude":-97.74,"timezone":"America/Chicago","daily_units":{"time":"iso8601"},"daily":{"time":["2023-01-01","2023-01-02","2023-01-03"],"temperature_2m_max":[22.1,24.0,18.2],"temperature_2m_min":[10.3,12.0,null],"temperature_2m_mean":[15.9,null,null],"precipitation_sum":[0.0,3.4,0.2],"windspeed_10m_max":[14.5,20.1,null]}}"#;

    #[test]
    fn test_daily_response_to_observations() {
        let observations = observations_from_daily_response(&austin(), "test", DAILY).unwrap();
        assert_eq!(observations.len(), 3);
        assert_eq!(
            observations[0].date,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        );
        assert_eq!(observations[0].tavg, Some(15.9));
        assert_eq!(observations[0].location.as_deref(), Some("Austin,US"));
        assert_eq!(observations[0].lat, Some(30.26715));
        assert_eq!(observations[2].wind_max, None);
    }

    #[test]
    fn test_missing_mean_uses_min_max_midpoint() {
        let observations = observations_from_daily_response(&austin(), "test", DAILY).unwrap();
        assert_eq!(observations[1].tavg, Some(18.0));
        // no minimum either, so nothing to derive from
        assert_eq!(observations[2].tavg, None);
    }

    #[test]
    fn test_empty_daily_block_is_upstream_error() {
        let body = r#"{"latitude":30.27,"longitude":-97.74,"daily":{"time":[]}}"#;
        match observations_from_daily_response(&austin(), "ctx", body) {
            Err(MeteoError::UpstreamService { context, status, .. }) => {
                assert_eq!(context, "ctx");
                assert_eq!(status, None);
            }
            other => panic!("expected UpstreamService, got {other:?}"),
        }
        let no_daily = r#"{"latitude":30.27}"#;
        assert!(matches!(
            observations_from_daily_response(&austin(), "ctx", no_daily),
            Err(MeteoError::UpstreamService { .. })
        ));
    }
}
