//! `livemap watch`: mount the map and print every view change.

use std::time::Duration;

use serde_json::{Value, json};

use livemap_core::{
    DisplayedMarker, MapView, MapViewConfig, Overlay, RegionKind, ViewEvent, format_coordinates,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::parse_url;
use crate::error::CliError;
use crate::output;

use super::util;

const KINDS: [RegionKind; 4] = [
    RegionKind::Normal,
    RegionKind::Event,
    RegionKind::Plot,
    RegionKind::Other,
];

pub async fn handle(
    mut config: MapViewConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(ref raw) = args.socket {
        config.socket_url = Some(parse_url("socket", raw)?);
    }

    let mut view = MapView::new(config)?;
    let mut events = util::take_events(&mut view)?;
    view.mount(args.link.as_deref()).await?;

    let color = output::should_color(&global.color);
    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => break,
            () = &mut deadline => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                if let Some(line) = render_event(&event, &global.output, color) {
                    output::print_output(&line, global.quiet);
                }
            }
        }
    }

    let online = view.players().len();
    view.unmount().await;
    if !global.quiet {
        eprintln!("{online} player(s) on the map at exit");
    }
    Ok(())
}

// ── Rendering ────────────────────────────────────────────────────────

/// One or more output lines for a view event; `None` when there is
/// nothing worth printing.
fn render_event(event: &ViewEvent, format: &OutputFormat, color: bool) -> Option<String> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            Some(output::render_json(&event_json(event), true))
        }
        OutputFormat::Table | OutputFormat::Plain => event_text(event, color),
    }
}

fn event_json(event: &ViewEvent) -> Value {
    match event {
        ViewEvent::MarkerDelta(delta) => json!({
            "event": "markers",
            "removed": delta.to_remove.iter().map(|m| &m.identity).collect::<Vec<_>>(),
            "upserted": delta.to_upsert,
        }),
        ViewEvent::OverlayReplaced(overlay) => json!({
            "event": "overlay",
            "regions": overlay.len(),
            "kinds": kind_counts(overlay)
                .into_iter()
                .map(|(kind, count)| (kind.to_string(), json!(count)))
                .collect::<serde_json::Map<_, _>>(),
        }),
        ViewEvent::SearchResults(results) => json!({
            "event": "search",
            "results": results,
        }),
        ViewEvent::ViewportChange(target) => json!({
            "event": "camera",
            "target": target,
        }),
        ViewEvent::ConnectionHealthChanged(health) => json!({
            "event": "health",
            "health": health,
        }),
        ViewEvent::OpenDetails(details) => json!({
            "event": "details",
            "region": details,
        }),
    }
}

fn event_text(event: &ViewEvent, color: bool) -> Option<String> {
    match event {
        ViewEvent::MarkerDelta(delta) => {
            let lines: Vec<String> = delta
                .to_remove
                .iter()
                .map(|m| format!("- {}", marker_label(m, color)))
                .chain(delta.to_upsert.iter().map(|m| {
                    let at = m.last_coordinates;
                    format!(
                        "+ {} at {}",
                        marker_label(m, color),
                        format_coordinates(at.lat, at.lon)
                    )
                }))
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        ViewEvent::OverlayReplaced(overlay) => {
            let kinds = kind_counts(overlay)
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .map(|(kind, count)| format!("{count} {kind}"))
                .collect::<Vec<_>>()
                .join(", ");
            Some(if kinds.is_empty() {
                format!("overlay: {} regions", overlay.len())
            } else {
                format!("overlay: {} regions ({kinds})", overlay.len())
            })
        }
        ViewEvent::SearchResults(results) => Some(format!(
            "search: {} result(s) for '{}'",
            results.results.len(),
            results.query
        )),
        ViewEvent::ViewportChange(target) => Some(format!(
            "camera: {} @ zoom {}",
            format_coordinates(target.lat, target.lon),
            target.zoom
        )),
        ViewEvent::ConnectionHealthChanged(health) => {
            Some(format!("socket: {}", output::paint_health(*health, color)))
        }
        ViewEvent::OpenDetails(details) => Some(format!(
            "details: region {} owned by {}",
            details.id,
            details.owner_name.as_deref().unwrap_or("unknown")
        )),
    }
}

fn marker_label(marker: &DisplayedMarker, color: bool) -> String {
    format!(
        "{} {}",
        marker.display_name,
        output::dim(&format!("({})", marker.identity), color)
    )
}

fn kind_counts(overlay: &Overlay) -> Vec<(RegionKind, usize)> {
    KINDS
        .iter()
        .map(|kind| (*kind, overlay.count_by_kind(*kind)))
        .collect()
}
