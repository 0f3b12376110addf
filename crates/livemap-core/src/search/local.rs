// Overlay lookup: case-insensitive substring match on region name and owner.

use crate::model::{CameraTarget, Overlay, RegionFeature, ResultSource, SearchResult, TriggerAction};

/// Matching regions in overlay order.
pub fn search_overlay(overlay: &Overlay, query: &str, zoom: f64) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    overlay
        .features()
        .iter()
        .filter(|region| matches(region, &needle))
        .filter_map(|region| to_result(region, zoom))
        .collect()
}

fn matches(region: &RegionFeature, needle: &str) -> bool {
    [region.city.as_deref(), region.owner_name.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

fn to_result(region: &RegionFeature, zoom: f64) -> Option<SearchResult> {
    let center = region.ring.centroid()?;
    let target = CameraTarget::at(center, zoom).ok()?;

    let description = match &region.owner_name {
        Some(owner) => format!("{} region of {owner}", region.kind),
        None => format!("{} region", region.kind),
    };

    Some(SearchResult {
        title: region.label(),
        description,
        coordinates: center,
        source: ResultSource::Local,
        region: Some(region.id),
        action: TriggerAction::FlyTo(target),
    })
}
