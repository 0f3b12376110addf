//! Shared configuration for the livemap CLI.
//!
//! TOML profiles, bearer-token resolution (env + keyring + plaintext),
//! and translation to `livemap_core::MapViewConfig`. Core never reads
//! config files; it receives the finished `MapViewConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use livemap_core::{MapViewConfig, TlsVerification};

/// Keyring service name; entries are keyed `<profile>/token`.
pub const KEYRING_SERVICE: &str = "livemap";

/// Prefix for environment overrides (`LIVEMAP_DEFAULTS__TIMEOUT=10`).
pub const ENV_PREFIX: &str = "LIVEMAP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named map server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile name to use: explicit choice, then `default_profile`, then
    /// `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(ToOwned::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named map server profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Region service base URL (e.g., "https://map.example.org").
    pub server: String,

    /// Position socket URL, when it differs from `server`.
    pub socket: Option<String>,

    /// Nominatim-compatible geocoder URL.
    pub geocoder: Option<String>,

    /// Bearer token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Search debounce window (milliseconds).
    pub debounce_ms: Option<u64>,

    /// Cap on merged search results.
    pub result_limit: Option<usize>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "livemap", "livemap").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("livemap");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file yields
/// the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the bearer token from the credential chain.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_token_with(profile, profile_name, |name| std::env::var(name).ok())
}

fn resolve_token_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Some(val) = env(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a bearer token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
        .and_then(|entry| entry.set_password(token))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Translation to core ─────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `MapViewConfig` from a profile.
///
/// A missing token is not an error here: viewing the map is anonymous and
/// only region administration needs one.
pub fn profile_to_view_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<MapViewConfig, ConfigError> {
    let mut config = MapViewConfig::new(parse_url("server", &profile.server)?);

    config.socket_url = profile
        .socket
        .as_deref()
        .map(|raw| parse_url("socket", raw))
        .transpose()?;
    config.geocoder_url = profile
        .geocoder
        .as_deref()
        .map(|raw| parse_url("geocoder", raw))
        .transpose()?;

    config.auth = match resolve_token(profile, profile_name) {
        Ok(token) => Some(token),
        Err(ConfigError::NoCredentials { .. }) => None,
        Err(e) => return Err(e),
    };

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    if let Some(ms) = profile.debounce_ms {
        config.search.debounce = Duration::from_millis(ms);
    }
    if let Some(limit) = profile.result_limit {
        if limit == 0 {
            return Err(ConfigError::Validation {
                field: "result_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        config.search.result_limit = limit;
    }

    Ok(config)
}
