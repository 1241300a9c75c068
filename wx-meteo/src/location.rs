use crate::error::{MeteoError, Result};
use serde::{Deserialize, Serialize};

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// "{name},{country_code}", e.g. "Austin,US"
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country_code: Option<String>,
}

impl Location {
    /// Take the best match out of an Open-Meteo geocoding response body.
    ///
    /// An absent or empty `results` array means the place is unknown.
    pub fn from_geocode_response(query: &str, body: &str) -> Result<Location> {
        let response: GeocodeResponse = serde_json::from_str(body)?;
        let hit = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| MeteoError::NotFound {
                query: query.to_string(),
            })?;
        let display_name = format!("{},{}", hit.name, hit.country_code.unwrap_or_default());
        Ok(Location {
            latitude: hit.latitude,
            longitude: hit.longitude,
            display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // https://geocoding-api.open-meteo.com/v1/search?name=Austin&count=1&language=en&format=json
    const AUSTIN: &str = r#"{"results":[{"id":4671654,"name":"Austin","latitude":30.26715,"longitude":-97.74306,"elevation":149.0,"feature_code":"PPLA","country_code":"US","timezone":"America/Chicago","country":"United States"}],"generationtime_ms":0.9}"#;

    #[test]
    fn test_geocode_first_hit() {
        let location = Location::from_geocode_response("Austin", AUSTIN).unwrap();
        assert_eq!(location.display_name, "Austin,US");
        assert_eq!(location.latitude, 30.26715);
        assert_eq!(location.longitude, -97.74306);
    }

    #[test]
    fn test_geocode_no_results_keeps_query() {
        let body = r#"{"generationtime_ms":0.3}"#;
        match Location::from_geocode_response("Atlantis,XX", body) {
            Err(MeteoError::NotFound { query }) => assert_eq!(query, "Atlantis,XX"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
