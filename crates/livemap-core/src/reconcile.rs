// ── Marker reconciliation ──
//
// Turns full position snapshots into the minimal edit set against the
// markers already on the map. One identity-keyed pass over the snapshot,
// one over the previous markers: O(n).

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::{DisplayedMarker, EntityPosition, MarkerDelta, MarkerHandle, PositionSnapshot};

/// Sole owner of the displayed marker set.
#[derive(Debug, Default)]
pub struct MarkerReconciler {
    markers: HashMap<String, DisplayedMarker>,
    last_sequence: Option<u64>,
    next_handle: u64,
}

impl MarkerReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a snapshot.
    ///
    /// Returns `None` for a snapshot that is not newer than the last one
    /// applied. Applying the same contents twice yields an empty delta.
    pub fn reconcile(&mut self, snapshot: &PositionSnapshot) -> Option<MarkerDelta> {
        if let Some(last) = self.last_sequence {
            if snapshot.sequence <= last {
                debug!(sequence = snapshot.sequence, last, "dropping stale snapshot");
                return None;
            }
        }
        self.last_sequence = Some(snapshot.sequence);
        Some(self.apply(&snapshot.positions))
    }

    /// Diff `positions` against the current markers and commit the result.
    pub fn apply(&mut self, positions: &[EntityPosition]) -> MarkerDelta {
        // Last occurrence of an identity wins.
        let mut latest: HashMap<&str, &EntityPosition> = HashMap::with_capacity(positions.len());
        for position in positions {
            latest.insert(position.identity.as_str(), position);
        }

        let mut delta = MarkerDelta::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(latest.len());

        for position in positions {
            let identity = position.identity.as_str();
            // Process each identity once, in first-appearance order.
            if !seen.insert(identity) {
                continue;
            }
            let Some(&position) = latest.get(identity) else {
                continue;
            };

            match self.markers.get_mut(identity) {
                Some(marker) => {
                    if marker.last_coordinates != position.coordinates
                        || marker.display_name != position.display_name
                    {
                        marker.last_coordinates = position.coordinates;
                        marker.display_name.clone_from(&position.display_name);
                        delta.to_upsert.push(marker.clone());
                    }
                }
                None => {
                    let marker = DisplayedMarker {
                        identity: position.identity.clone(),
                        handle: self.allocate_handle(),
                        display_name: position.display_name.clone(),
                        last_coordinates: position.coordinates,
                    };
                    delta.to_upsert.push(marker.clone());
                    self.markers.insert(position.identity.clone(), marker);
                }
            }
        }

        let gone: Vec<String> = self
            .markers
            .keys()
            .filter(|identity| !latest.contains_key(identity.as_str()))
            .cloned()
            .collect();
        for identity in gone {
            if let Some(marker) = self.markers.remove(&identity) {
                delta.to_remove.push(marker);
            }
        }
        delta.to_remove.sort_by_key(|m| m.handle);

        if !delta.is_empty() {
            debug!(
                removed = delta.to_remove.len(),
                upserted = delta.to_upsert.len(),
                displayed = self.markers.len(),
                "markers reconciled"
            );
        }
        delta
    }

    /// Markers currently on the map, by identity.
    pub fn markers(&self) -> &HashMap<String, DisplayedMarker> {
        &self.markers
    }

    /// Markers sorted by display name, then identity.
    pub fn sorted_markers(&self) -> Vec<DisplayedMarker> {
        let mut list: Vec<DisplayedMarker> = self.markers.values().cloned().collect();
        list.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.identity.cmp(&b.identity))
        });
        list
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Drop every marker, returning them for release.
    pub fn clear(&mut self) -> Vec<DisplayedMarker> {
        let mut removed: Vec<DisplayedMarker> = self.markers.drain().map(|(_, m)| m).collect();
        removed.sort_by_key(|m| m.handle);
        removed
    }

    fn allocate_handle(&mut self) -> MarkerHandle {
        self.next_handle += 1;
        MarkerHandle(self.next_handle)
    }
}
