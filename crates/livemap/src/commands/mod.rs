//! Command dispatch: bridges CLI args -> MapView operations -> output formatting.

pub mod config_cmd;
pub mod open;
pub mod regions;
pub mod search;
pub mod util;
pub mod watch;

use livemap_core::MapViewConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: MapViewConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::Search(args) => search::handle(config, args, global).await,
        Command::Open(args) => open::handle(config, args, global).await,
        Command::Regions(args) => regions::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
