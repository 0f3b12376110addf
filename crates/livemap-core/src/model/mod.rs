// ── Domain model ──
//
// Canonical shapes consumers (the CLI, a UI shell) depend on. Wire types
// from livemap-api never leak past `convert`.

pub mod geo;
pub mod position;
pub mod region;
pub mod search;

pub use geo::{CameraTarget, LonLat, Ring, format_coordinates};
pub use position::{
    ConnectionHealth, DisplayedMarker, EntityPosition, MarkerDelta, MarkerHandle,
    PositionSnapshot,
};
pub use region::{Overlay, RegionFeature, RegionId, RegionKind};
pub use search::{GeocodedPlace, ResultSource, SearchResult, SearchResults, TriggerAction};
