//! Config subcommand handlers.

use serde::Serialize;

use livemap_config::Profile;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Resolved profile as shown by `config show`. Never carries the token.
#[derive(Debug, Serialize)]
struct ProfileView {
    profile: String,
    path: String,
    server: Option<String>,
    socket: Option<String>,
    geocoder: Option<String>,
    timeout: u64,
    insecure: bool,
    token: &'static str,
}

impl ProfileView {
    fn new(cfg: &Config, name: &str, profile: Option<&Profile>) -> Self {
        let token = match profile {
            Some(p) if livemap_config::resolve_token(p, name).is_ok() => "configured",
            _ => "not configured",
        };
        Self {
            profile: name.to_owned(),
            path: config::config_path().display().to_string(),
            server: profile.map(|p| p.server.clone()),
            socket: profile.and_then(|p| p.socket.clone()),
            geocoder: profile.and_then(|p| p.geocoder.clone()),
            timeout: profile
                .and_then(|p| p.timeout)
                .unwrap_or(cfg.defaults.timeout),
            insecure: profile
                .and_then(|p| p.insecure)
                .unwrap_or(cfg.defaults.insecure),
            token,
        }
    }
}

fn detail(v: &ProfileView) -> String {
    output::detail_block(&[
        ("Profile", v.profile.clone()),
        ("Config", v.path.clone()),
        ("Server", v.server.clone().unwrap_or_else(|| "(unset)".into())),
        ("Socket", v.socket.clone().unwrap_or_default()),
        ("Geocoder", v.geocoder.clone().unwrap_or_default()),
        ("Timeout", format!("{}s", v.timeout)),
        ("Insecure", v.insecure.to_string()),
        ("Token", v.token.into()),
    ])
}

/// Map an interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let name = cfg.active_profile_name(global.profile.as_deref());
            let view = ProfileView::new(&cfg, &name, cfg.profiles.get(&name));
            let out = output::render_single(&global.output, &view, detail, |v| v.profile.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken { value } => {
            let cfg = config::load_config_or_default();
            let name = cfg.active_profile_name(global.profile.as_deref());

            let token = match value {
                Some(token) => token,
                None => rpassword::prompt_password("Bearer token: ").map_err(prompt_err)?,
            };
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "token cannot be empty".into(),
                });
            }

            livemap_config::store_token(&name, token.trim())?;
            if !global.quiet {
                eprintln!("Token for profile '{name}' stored in system keyring");
            }
            Ok(())
        }
    }
}
