// ── Search results ──

use serde::{Deserialize, Serialize};
use strum::Display;

use super::geo::{CameraTarget, LonLat};
use super::region::RegionId;

/// Where a result came from. Local results always sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Synthetic "go to coordinates" result and region overlay matches.
    Local,
    /// Geocoding provider.
    External,
}

/// What selecting a result does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TriggerAction {
    FlyTo(CameraTarget),
}

/// One entry in the search palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub description: String,
    pub coordinates: LonLat,
    pub source: ResultSource,
    /// Set for overlay matches.
    pub region: Option<RegionId>,
    pub action: TriggerAction,
}

/// The single published result set for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Issuance order of the query that produced these results.
    pub generation: u64,
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Lookups that failed; their results are simply absent.
    pub failed: Vec<ResultSource>,
}

impl SearchResults {
    pub fn empty(generation: u64, query: impl Into<String>) -> Self {
        Self {
            generation,
            query: query.into(),
            results: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// A geocoder hit before it becomes a [`SearchResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub name: String,
    pub category: Option<String>,
    pub coordinates: LonLat,
}
