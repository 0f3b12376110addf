//! Region command handlers.

use serde::Serialize;
use tabled::Tabled;

use livemap_core::{MapView, MapViewConfig, RegionFeature, RegionId, RegionKind, RegionQuery};

use crate::cli::{GlobalOpts, RegionsArgs, RegionsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Area")]
    area: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&RegionFeature> for RegionRow {
    fn from(r: &RegionFeature) -> Self {
        Self {
            id: r.id.to_string(),
            kind: r.kind.to_string(),
            name: r.label(),
            owner: r.owner_name.clone().unwrap_or_default(),
            area: r.area.map(|a| format!("{a:.0}")).unwrap_or_default(),
            created: r
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Tabled)]
struct KindCount {
    #[tabled(rename = "Kind")]
    kind: RegionKind,
    #[tabled(rename = "Regions")]
    count: usize,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: MapViewConfig,
    args: RegionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = MapView::new(config)?;

    match args.command {
        RegionsCommand::List(list) => {
            let query = RegionQuery::from(&list);
            let listing = view.list_regions(&query).await?;

            let out = output::render_list(
                &global.output,
                &listing.regions,
                |r| RegionRow::from(r),
                |r| r.id.to_string(),
            );
            output::print_output(&out, global.quiet);

            if !global.quiet {
                eprintln!("page {} of {}", query.page, listing.total_pages.max(1));
                if listing.skipped > 0 {
                    eprintln!("warning: {} malformed region(s) skipped", listing.skipped);
                }
            }
            Ok(())
        }

        RegionsCommand::Delete { id } => {
            let id = RegionId::parse(&id)?;
            if !util::confirm(
                &format!("Delete region {id}? This is destructive."),
                "regions delete",
                global.yes,
            )? {
                return Ok(());
            }
            let overlay = view.delete_region(&id).await?;
            if !global.quiet {
                eprintln!("Region {id} deleted ({} remaining)", overlay.len());
            }
            Ok(())
        }

        RegionsCommand::Refresh => {
            let overlay = view.refresh_overlay().await?;
            let counts: Vec<KindCount> = [
                RegionKind::Normal,
                RegionKind::Event,
                RegionKind::Plot,
                RegionKind::Other,
            ]
            .into_iter()
            .map(|kind| KindCount {
                kind,
                count: overlay.count_by_kind(kind),
            })
            .collect();

            let out = output::render_list(
                &global.output,
                &counts,
                |c| KindCount {
                    kind: c.kind,
                    count: c.count,
                },
                |c| format!("{}\t{}", c.kind, c.count),
            );
            output::print_output(&out, global.quiet);
            if !global.quiet {
                eprintln!("{} regions loaded", overlay.len());
            }
            Ok(())
        }
    }
}
