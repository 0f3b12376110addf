// ── API-to-domain type conversions ──
//
// Bridges raw `livemap_api` wire shapes into `livemap_core::model` types.
// Malformed records are dropped here, at the boundary, so nothing past this
// module ever sees an empty identity, an unparseable id, or a missing ring.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use livemap_api::geojson::{Feature, FeatureCollection, PlayerProperties, RegionProperties};
use livemap_api::{Place, RegionRecord};

use crate::error::CoreError;
use crate::model::{
    EntityPosition, GeocodedPlace, LonLat, Overlay, RegionFeature, RegionId, RegionKind, Ring,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse a timestamp as sent by the region service (RFC 3339, or a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` taken as UTC).
fn parse_datetime(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ── Positions ──────────────────────────────────────────────────────

/// Decode a `playerLocations` payload.
///
/// The server emits the collection as a JSON *string*; a pre-decoded
/// object is accepted too. Entries with an empty identity or without a
/// point geometry are dropped.
pub fn positions_from_payload(payload: &Value) -> Result<Vec<EntityPosition>, CoreError> {
    let collection: FeatureCollection<PlayerProperties> = match payload {
        Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    }
    .map_err(|e| CoreError::ValidationFailed {
        message: format!("malformed position payload: {e}"),
    })?;

    let total = collection.features.len();
    let positions: Vec<EntityPosition> = collection
        .features
        .into_iter()
        .filter_map(position_from_feature)
        .collect();

    if positions.len() < total {
        debug!(
            dropped = total - positions.len(),
            kept = positions.len(),
            "dropped unusable position entries"
        );
    }
    Ok(positions)
}

fn position_from_feature(feature: Feature<PlayerProperties>) -> Option<EntityPosition> {
    let identity = feature.properties.uuid.trim();
    if identity.is_empty() {
        return None;
    }
    let point = feature.geometry.as_ref()?.as_point()?;
    if !point.iter().all(|c| c.is_finite()) {
        return None;
    }
    Some(EntityPosition {
        identity: identity.to_owned(),
        display_name: feature.properties.username,
        coordinates: LonLat::from_lon_lat(point),
    })
}

// ── Regions ────────────────────────────────────────────────────────

/// Build the overlay from the GeoJSON export, dropping unusable features.
pub fn overlay_from_geojson(collection: FeatureCollection<RegionProperties>) -> Overlay {
    let total = collection.features.len();
    let features: Vec<RegionFeature> = collection
        .features
        .into_iter()
        .filter_map(region_from_feature)
        .collect();

    if features.len() < total {
        debug!(
            dropped = total - features.len(),
            kept = features.len(),
            "dropped malformed region features"
        );
    }
    Overlay::new(features)
}

fn region_from_feature(feature: Feature<RegionProperties>) -> Option<RegionFeature> {
    let props = feature.properties;
    let id = RegionId::parse(props.id.as_deref()?).ok()?;
    let ring: Vec<LonLat> = feature
        .geometry
        .as_ref()?
        .outer_ring()?
        .iter()
        .map(|p| LonLat::from_lon_lat(p.0))
        .collect();
    if ring.is_empty() {
        return None;
    }

    Some(RegionFeature {
        id,
        kind: RegionKind::from_wire(props.region_type.as_deref()),
        ring: Ring::new(ring),
        owner_uuid: non_empty(props.user_uuid),
        owner_name: non_empty(props.username),
        city: non_empty(props.city),
        area: None,
        created_at: parse_datetime(props.created_at.as_deref()),
    })
}

/// Convert a by-id or paged region record.
///
/// The record's `data` field is a JSON string of **`[lat, lon]`** pairs;
/// they are swapped into (lon, lat) here.
pub fn region_from_record(record: RegionRecord) -> Result<RegionFeature, CoreError> {
    let id = RegionId::parse(&record.id)?;
    let points = record
        .lat_lon_points()
        .map_err(|e| CoreError::ValidationFailed {
            message: format!("region {id} has malformed ring data: {e}"),
        })?;

    Ok(RegionFeature {
        id,
        kind: RegionKind::from_wire(record.region_type.as_deref()),
        ring: Ring::new(points.into_iter().map(LonLat::from_lat_lon).collect()),
        owner_uuid: non_empty(record.user_uuid),
        owner_name: non_empty(record.username),
        city: non_empty(record.city),
        area: record.area,
        created_at: parse_datetime(record.created_at.as_deref()),
    })
}

// ── Geocoder ───────────────────────────────────────────────────────

impl From<Place> for GeocodedPlace {
    fn from(place: Place) -> Self {
        Self {
            name: place.display_name,
            category: place.kind.or(place.category),
            coordinates: LonLat::new(place.lon, place.lat),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn player_payload() -> String {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [10.0, 20.0] },
                    "properties": { "uuid": "a", "username": "Alex" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
                    "properties": { "uuid": "", "username": "ghost" }
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": { "uuid": "b", "username": "Nowhere" }
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn positions_drop_empty_identity_and_missing_geometry() {
        let positions = positions_from_payload(&Value::String(player_payload())).unwrap();
        assert_eq!(
            positions,
            vec![EntityPosition {
                identity: "a".into(),
                display_name: "Alex".into(),
                coordinates: LonLat::new(10.0, 20.0),
            }]
        );
    }

    #[test]
    fn positions_accept_object_payload() {
        let payload: Value = serde_json::from_str(&player_payload()).unwrap();
        assert_eq!(positions_from_payload(&payload).unwrap().len(), 1);
    }

    #[test]
    fn one_bad_entry_does_not_discard_the_snapshot() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "geometry": { "type": "Point", "coordinates": [10.0, 20.0] },
                    "properties": { "uuid": "a", "username": "Alex" }
                },
                { "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }, "properties": null },
                {
                    "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
                    "properties": { "uuid": null, "username": "ghost" }
                },
                {
                    "geometry": { "type": "Point", "coordinates": "up" },
                    "properties": { "uuid": "broken" }
                },
                {
                    "geometry": { "type": "Point", "coordinates": [3.0, 4.0, 64.0] },
                    "properties": { "uuid": "c", "username": null }
                }
            ]
        });

        let positions = positions_from_payload(&Value::String(payload.to_string())).unwrap();
        let identities: Vec<&str> = positions.iter().map(|p| p.identity.as_str()).collect();
        assert_eq!(identities, vec!["a", "c"]);
        assert_eq!(positions[1].coordinates, LonLat::new(3.0, 4.0));
        assert_eq!(positions[1].display_name, "");
    }

    #[test]
    fn positions_reject_garbage() {
        let err = positions_from_payload(&Value::String("not json".into())).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
    }

    #[test]
    fn record_swaps_lat_lon() {
        let record: RegionRecord = serde_json::from_value(json!({
            "id": ID,
            "data": "[[10.0, 20.0], [11.0, 20.0], [11.0, 21.0]]",
            "userUUID": "owner-uuid",
            "username": "Notch",
            "regionType": "plot",
            "createdAt": "2023-04-01T12:30:00.000"
        }))
        .unwrap();

        let region = region_from_record(record).unwrap();
        assert_eq!(region.ring.points()[0], LonLat::new(20.0, 10.0));
        assert_eq!(region.kind, RegionKind::Plot);
        assert_eq!(region.owner_uuid.as_deref(), Some("owner-uuid"));
        assert!(region.created_at.is_some());
    }

    #[test]
    fn record_with_bad_id_is_rejected() {
        let record: RegionRecord =
            serde_json::from_value(json!({ "id": "../etc/passwd", "data": "[]" })).unwrap();
        assert!(matches!(
            region_from_record(record),
            Err(CoreError::InvalidRegionId { .. })
        ));
    }

    #[test]
    fn overlay_keeps_only_valid_polygons() {
        let collection = serde_json::from_value(json!({
            "features": [
                {
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
                    "properties": { "id": ID, "regionType": "castle", "username": "alice", "city": "" }
                },
                {
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]] },
                    "properties": { "id": "1234" }
                },
                {
                    "geometry": { "type": "Point", "coordinates": [0, 0] },
                    "properties": { "id": "6ba7b810-9dad-11d1-80b4-00c04fd430c8" }
                },
                {
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1]]] },
                    "properties": { "id": "6ba7b811-9dad-11d1-80b4-00c04fd430c8" }
                }
            ]
        }))
        .unwrap();

        let overlay = overlay_from_geojson(collection);
        assert_eq!(overlay.len(), 1);
        let region = &overlay.features()[0];
        assert_eq!(region.kind, RegionKind::Other);
        assert_eq!(region.city, None);
        assert!(region.ring.is_closed());
    }

    #[test]
    fn datetime_formats() {
        assert!(parse_datetime(Some("2023-01-01T10:00:00Z")).is_some());
        assert!(parse_datetime(Some("2023-01-01T10:00:00")).is_some());
        assert!(parse_datetime(Some("yesterday")).is_none());
        assert!(parse_datetime(None).is_none());
    }
}
