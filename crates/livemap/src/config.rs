//! CLI configuration: thin wrapper around `livemap_config`.
//!
//! Adds the resolution step that respects `GlobalOpts` flag overrides
//! (--server, --token, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use livemap_core::{MapViewConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use livemap_config::{Config, config_path, load_config_or_default};

/// Parse a URL-valued option.
pub fn parse_url(field: &str, raw: &str) -> Result<Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `MapViewConfig` from the config file, the active profile, and
/// CLI overrides. Flags win over profile values.
pub fn build_view_config(global: &GlobalOpts, cfg: &Config) -> Result<MapViewConfig, CliError> {
    let profile_name = cfg.active_profile_name(global.profile.as_deref());

    let mut config = match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            livemap_config::profile_to_view_config(profile, &profile_name, &cfg.defaults)?
        }
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            // No profile: the server must come from flags / env.
            let raw = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let mut config = MapViewConfig::new(parse_url("server", raw)?);
            config.timeout = Duration::from_secs(cfg.defaults.timeout);
            if cfg.defaults.insecure {
                config.tls = TlsVerification::DangerAcceptInvalid;
            }
            config
        }
    };

    if let Some(ref raw) = global.server {
        config.server_url = parse_url("server", raw)?;
    }
    if let Some(ref token) = global.token {
        config.auth = Some(SecretString::from(token.clone()));
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}
