// ── Runtime view configuration ──
//
// These types describe *where* the map's collaborators live and how the
// view behaves. They carry the bearer credential and tuning knobs but
// never touch disk: the CLI builds a `MapViewConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

pub use livemap_api::ReconnectConfig;

/// Public Nominatim instance used when no geocoder URL is configured.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (local development servers).
    DangerAcceptInvalid,
}

/// Search pipeline tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a query runs.
    pub debounce: Duration,
    /// Upper bound on the merged result list.
    pub result_limit: usize,
    /// How many hits to request from the geocoder.
    pub provider_limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            result_limit: 50,
            provider_limit: 10,
        }
    }
}

/// Zoom levels used by camera transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomConfig {
    /// Regions, search hits and typed coordinates.
    pub region: f64,
    /// Focusing a player from the player list.
    pub player: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            region: 16.0,
            player: 14.0,
        }
    }
}

/// Camera position applied at mount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            lat: 58.115_092,
            lon: -107.370_124_9,
            zoom: 2.5,
        }
    }
}

/// Configuration for one map view.
///
/// Built by the CLI, passed to `MapView` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct MapViewConfig {
    /// Region service root (e.g., `https://map.example.org`).
    pub server_url: Url,
    /// Position push server. `None` means the region server also serves
    /// the socket.
    pub socket_url: Option<Url>,
    /// Nominatim-compatible geocoder. `None` uses [`DEFAULT_GEOCODER_URL`].
    pub geocoder_url: Option<Url>,
    /// Bearer credential for privileged region calls.
    pub auth: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Socket reconnection backoff.
    pub reconnect: ReconnectConfig,
    pub search: SearchConfig,
    pub zoom: ZoomConfig,
    pub initial_view: InitialView,
}

impl MapViewConfig {
    /// Configuration with every knob at its default.
    pub fn new(server_url: Url) -> Self {
        Self {
            server_url,
            socket_url: None,
            geocoder_url: None,
            auth: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            reconnect: ReconnectConfig::default(),
            search: SearchConfig::default(),
            zoom: ZoomConfig::default(),
            initial_view: InitialView::default(),
        }
    }

    /// Where the position socket connects.
    pub fn effective_socket_url(&self) -> &Url {
        self.socket_url.as_ref().unwrap_or(&self.server_url)
    }
}
