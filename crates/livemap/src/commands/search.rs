//! `livemap search`: one-shot hybrid search over regions and places.

use tabled::Tabled;
use tracing::warn;

use livemap_core::{MapView, MapViewConfig, SearchResult, format_coordinates};

use crate::cli::{GlobalOpts, SearchArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Coordinates")]
    coordinates: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&SearchResult> for ResultRow {
    fn from(r: &SearchResult) -> Self {
        Self {
            source: r.source.to_string(),
            title: r.title.clone(),
            coordinates: format_coordinates(r.coordinates.lat, r.coordinates.lon),
            description: r.description.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: MapViewConfig,
    args: SearchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let query = args.query.join(" ");
    let view = MapView::new(config)?;

    if !args.no_regions {
        if let Err(e) = view.refresh_overlay().await {
            warn!(error = %e, "region overlay unavailable, searching places only");
        }
    }

    let results = view.search_now(&query).await;
    if !global.quiet {
        for source in &results.failed {
            eprintln!("warning: {source} lookup failed, results may be incomplete");
        }
    }

    let out = output::render_list(
        &global.output,
        &results.results,
        |r| ResultRow::from(r),
        |r| format_coordinates(r.coordinates.lat, r.coordinates.lon),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
