// Nominatim-compatible geocoding client
//
// `GET {base}/search?q=...&format=jsonv2&limit=N` returning a JSON array of
// places. Nominatim encodes lat/lon as strings; some mirrors send numbers,
// so both are accepted.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{TransportConfig, error_for_status, parse_json};

/// One geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub display_name: String,
    #[serde(deserialize_with = "de_coordinate")]
    pub lat: f64,
    #[serde(deserialize_with = "de_coordinate")]
    pub lon: f64,
    /// Nominatim `category` (`"boundary"`, `"place"`, ...).
    #[serde(default)]
    pub category: Option<String>,
    /// Nominatim `type` (`"city"`, `"administrative"`, ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

fn de_coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// HTTP client for a Nominatim-compatible geocoder.
pub struct GeocoderClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GeocoderClient {
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
        })
    }

    /// Create a geocoder client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Free-text search.
    ///
    /// `GET {base}/search?q={text}&format=jsonv2&limit={limit}`
    pub async fn search(&self, text: &str, limit: u32) -> Result<Vec<Place>, Error> {
        let url = Url::parse(&format!(
            "{}/search",
            self.base_url.as_str().trim_end_matches('/')
        ))?;
        debug!(limit, "geocoding {:?}", text);

        let resp = self
            .http
            .get(url)
            .query(&[
                ("q", text),
                ("format", "jsonv2"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        parse_json(error_for_status(resp).await?).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn place_accepts_string_coordinates() {
        let place: Place = serde_json::from_value(serde_json::json!({
            "display_name": "Berlin, Deutschland",
            "lat": "52.5170365",
            "lon": "13.3888599",
            "category": "boundary",
            "type": "administrative"
        }))
        .unwrap();

        assert!((place.lat - 52.517_036_5).abs() < 1e-9);
        assert!((place.lon - 13.388_859_9).abs() < 1e-9);
        assert_eq!(place.kind.as_deref(), Some("administrative"));
    }

    #[test]
    fn place_accepts_numeric_coordinates() {
        let place: Place = serde_json::from_value(serde_json::json!({
            "display_name": "Somewhere",
            "lat": 1.5,
            "lon": -2.25
        }))
        .unwrap();

        assert_eq!(place.lat, 1.5);
        assert_eq!(place.lon, -2.25);
        assert!(place.category.is_none());
    }

    #[test]
    fn place_rejects_garbage_coordinates() {
        let result: Result<Place, _> = serde_json::from_value(serde_json::json!({
            "display_name": "Nowhere",
            "lat": "north",
            "lon": "0"
        }));
        assert!(result.is_err());
    }
}
