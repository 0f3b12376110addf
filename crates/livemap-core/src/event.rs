// ── View events ──
//
// Everything the UI shell needs to redraw arrives as one of these, in
// order, on a single-consumer channel owned by `MapView`.

use std::sync::Arc;

use serde::Serialize;

use crate::model::{
    CameraTarget, ConnectionHealth, MarkerDelta, Overlay, RegionFeature, RegionId, SearchResults,
};

/// Capacity of the view event channel.
pub const VIEW_EVENT_CAPACITY: usize = 256;

/// Request to open the region detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionDetails {
    pub id: RegionId,
    pub owner_uuid: Option<String>,
    pub owner_name: Option<String>,
}

impl From<&RegionFeature> for RegionDetails {
    fn from(region: &RegionFeature) -> Self {
        Self {
            id: region.id,
            owner_uuid: region.owner_uuid.clone(),
            owner_name: region.owner_name.clone(),
        }
    }
}

/// A change the UI shell should render.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// Markers to release and markers to create or move.
    MarkerDelta(MarkerDelta),
    /// The polygon layer was replaced wholesale.
    OverlayReplaced(Arc<Overlay>),
    /// The latest query's ordered results.
    SearchResults(SearchResults),
    /// Move the camera.
    ViewportChange(CameraTarget),
    ConnectionHealthChanged(ConnectionHealth),
    OpenDetails(RegionDetails),
}
