//! Clap derive structures for the `livemap` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

use livemap_core::{RegionQuery, RegionSort, SortDirection};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// livemap -- follow players and regions on the live map
#[derive(Debug, Parser)]
#[command(
    name = "livemap",
    version,
    about = "Watch live positions, search places, and manage map regions",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "LIVEMAP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Map server URL (overrides profile)
    #[arg(long, short = 's', env = "LIVEMAP_SERVER", global = true)]
    pub server: Option<String>,

    /// Bearer token for region administration
    #[arg(long, env = "LIVEMAP_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LIVEMAP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LIVEMAP_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LIVEMAP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream live positions and map changes until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Search regions and places (or jump to "lat, lon")
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Resolve a region deep link
    Open(OpenArgs),

    /// Inspect and administer regions
    #[command(alias = "r")]
    Regions(RegionsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Deep-link query applied after mount (e.g. "?region=<uuid>&details=true")
    #[arg(long)]
    pub link: Option<String>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration: Option<u64>,

    /// Position socket URL (overrides profile)
    #[arg(long, env = "LIVEMAP_SOCKET")]
    pub socket: Option<String>,
}

// ── Search ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free text, or a coordinate pair such as "52.52, 13.40"
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Skip the region overlay and only ask the geocoder
    #[arg(long)]
    pub no_regions: bool,
}

// ── Open ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Region UUID or a full query string ("?region=<uuid>")
    pub target: String,

    /// Also open the region detail view
    #[arg(long, short = 'd')]
    pub details: bool,
}

// ── Regions ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RegionsArgs {
    #[command(subcommand)]
    pub command: RegionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RegionsCommand {
    /// Paged region listing (requires a token)
    #[command(alias = "ls")]
    List(RegionListArgs),

    /// Delete a region (requires a token)
    #[command(alias = "rm")]
    Delete {
        /// Region UUID
        id: String,
    },

    /// Reload the region overlay and summarize it
    Refresh,
}

#[derive(Debug, Args)]
pub struct RegionListArgs {
    /// 1-based page number
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Page size
    #[arg(long, short = 'l', default_value = "25", value_parser = clap::value_parser!(u32).range(1..=200))]
    pub size: u32,

    /// Sort column
    #[arg(long, default_value = "id")]
    pub sort: SortField,

    /// Sort direction
    #[arg(long, default_value = "asc")]
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Id,
    City,
    Area,
    Username,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    Asc,
    Desc,
}

impl From<&RegionListArgs> for RegionQuery {
    fn from(args: &RegionListArgs) -> Self {
        Self {
            page: args.page,
            size: args.size,
            sort: match args.sort {
                SortField::Id => RegionSort::Id,
                SortField::City => RegionSort::City,
                SortField::Area => RegionSort::Area,
                SortField::Username => RegionSort::Username,
                SortField::CreatedAt => RegionSort::CreatedAt,
            },
            direction: match args.direction {
                Direction::Asc => SortDirection::Asc,
                Direction::Desc => SortDirection::Desc,
            },
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration (token redacted)
    Show,

    /// Print the config file path
    Path,

    /// Store the profile's bearer token in the system keyring
    SetToken {
        /// Token value (prompted for when omitted)
        #[arg(long)]
        value: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
