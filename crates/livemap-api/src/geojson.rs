// Minimal GeoJSON wire types.
//
// Only the shapes the map servers actually send: Point features for
// player positions and Polygon features for regions. Anything else
// deserializes as `Geometry::Unsupported`, and a feature that fails to
// decode is dropped on its own rather than failing the collection.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// `[lon, lat]` as it appears on the wire. A trailing altitude is
/// accepted and discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub [f64; 2]);

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let coords = Vec::<f64>::deserialize(deserializer)?;
        match coords.as_slice() {
            [lon, lat, ..] => Ok(Self([*lon, *lat])),
            _ => Err(D::Error::invalid_length(coords.len(), &"at least 2 numbers")),
        }
    }
}

/// A GeoJSON `FeatureCollection` with typed properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: DeserializeOwned + Default"))]
pub struct FeatureCollection<P> {
    #[serde(default, deserialize_with = "lenient_features")]
    pub features: Vec<Feature<P>>,
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self {
            features: Vec::new(),
        }
    }
}

/// A single GeoJSON `Feature`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de> + Default"))]
pub struct Feature<P> {
    /// Missing or `null` geometry is tolerated and left for the consumer
    /// to drop.
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: P,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    Polygon { coordinates: Vec<Vec<Position>> },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// The point coordinate, if this is a `Point`.
    pub fn as_point(&self) -> Option<[f64; 2]> {
        match self {
            Self::Point { coordinates } => Some(coordinates.0),
            _ => None,
        }
    }

    /// The outer ring, if this is a `Polygon` with at least one ring.
    pub fn outer_ring(&self) -> Option<&[Position]> {
        match self {
            Self::Polygon { coordinates } => coordinates.first().map(Vec::as_slice),
            _ => None,
        }
    }
}

/// Properties carried by each feature of a `playerLocations` push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerProperties {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_features<'de, D, P>(deserializer: D) -> Result<Vec<Feature<P>>, D::Error>
where
    D: Deserializer<'de>,
    P: DeserializeOwned + Default,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    let total = raw.len();
    let features: Vec<Feature<P>> = raw
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value(value)
                .map_err(|e| debug!(error = %e, "skipping undecodable feature"))
                .ok()
        })
        .collect();
    if features.len() < total {
        debug!(dropped = total - features.len(), "dropped undecodable features");
    }
    Ok(features)
}

/// Properties carried by each feature of the region GeoJSON export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionProperties {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub region_type: Option<String>,
    #[serde(default, rename = "userUUID")]
    pub user_uuid: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}
