// ── Live entity positions and displayed markers ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::geo::LonLat;

/// One tracked entity in a position push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPosition {
    /// Stable across snapshots. Never empty once past the stream boundary.
    pub identity: String,
    pub display_name: String,
    pub coordinates: LonLat,
}

/// A full replacement set of positions, stamped at receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSnapshot {
    /// Strictly increasing per stream.
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
    pub positions: Vec<EntityPosition>,
}

/// Position socket state as shown by the UI indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionHealth {
    Connected,
    #[default]
    Disconnected,
}

/// Opaque token for a marker drawn by the UI shell.
///
/// Allocated once per identity and never reissued while that identity
/// stays on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerHandle(pub u64);

/// A marker currently on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayedMarker {
    pub identity: String,
    pub handle: MarkerHandle,
    pub display_name: String,
    pub last_coordinates: LonLat,
}

/// Minimal edit set produced by one reconcile step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerDelta {
    /// Markers whose identities left the snapshot; their handles are released.
    pub to_remove: Vec<DisplayedMarker>,
    /// New markers and markers whose position or name changed.
    pub to_upsert: Vec<DisplayedMarker>,
}

impl MarkerDelta {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_upsert.is_empty()
    }
}
