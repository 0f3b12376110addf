//! `livemap open`: resolve a region deep link the way the map does.

use serde::Serialize;

use livemap_core::{
    CameraTarget, DeepLinkRequest, LonLat, MapView, MapViewConfig, RegionFeature, RegionKind,
    ViewEvent, format_coordinates,
};

use crate::cli::{GlobalOpts, OpenArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// What the map ended up showing for a deep link.
#[derive(Debug, Serialize)]
struct OpenedRegion {
    id: String,
    kind: RegionKind,
    label: String,
    owner_name: Option<String>,
    owner_uuid: Option<String>,
    city: Option<String>,
    area: Option<f64>,
    centroid: Option<LonLat>,
    camera: Option<CameraTarget>,
    details: bool,
}

impl OpenedRegion {
    fn new(region: &RegionFeature, camera: Option<CameraTarget>, details: bool) -> Self {
        Self {
            id: region.id.to_string(),
            kind: region.kind,
            label: region.label(),
            owner_name: region.owner_name.clone(),
            owner_uuid: region.owner_uuid.clone(),
            city: region.city.clone(),
            area: region.area,
            centroid: region.ring.centroid(),
            camera,
            details,
        }
    }
}

fn detail(r: &OpenedRegion) -> String {
    output::detail_block(&[
        ("Region", r.id.clone()),
        ("Name", r.label.clone()),
        ("Kind", r.kind.to_string()),
        ("Owner", r.owner_name.clone().unwrap_or_default()),
        ("Owner UUID", r.owner_uuid.clone().unwrap_or_default()),
        ("Area", r.area.map(|a| a.to_string()).unwrap_or_default()),
        (
            "Centroid",
            r.centroid
                .map(|c| format_coordinates(c.lat, c.lon))
                .unwrap_or_default(),
        ),
        (
            "Camera",
            r.camera
                .map(|c| format!("{} @ zoom {}", format_coordinates(c.lat, c.lon), c.zoom))
                .unwrap_or_default(),
        ),
        ("Details", if r.details { "opened".into() } else { String::new() }),
    ])
}

pub async fn handle(
    config: MapViewConfig,
    args: OpenArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let query = util::deep_link_query(&args.target, args.details);

    // Reject hostile or malformed ids before anything touches the network.
    let Some(request) = DeepLinkRequest::parse(&query)? else {
        return Err(CliError::Validation {
            field: "target".into(),
            reason: "no region in deep link".into(),
        });
    };

    let mut view = MapView::new(config)?;
    let mut events = util::take_events(&mut view)?;

    let Some(region) = view.navigate(&query).await else {
        return Err(CliError::NotFound {
            resource_type: "region".into(),
            identifier: request.region.to_string(),
            list_command: "regions list".into(),
        });
    };

    let mut camera = None;
    let mut details = false;
    while let Ok(event) = events.try_recv() {
        match event {
            ViewEvent::ViewportChange(target) => camera = Some(target),
            ViewEvent::OpenDetails(_) => details = true,
            _ => {}
        }
    }

    let opened = OpenedRegion::new(&region, camera, details);
    let out = output::render_single(&global.output, &opened, detail, |r| r.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
