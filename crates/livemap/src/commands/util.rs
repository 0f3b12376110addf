//! Shared helpers for command handlers.

use std::io::IsTerminal;

use tokio::sync::mpsc;

use livemap_core::{MapView, ViewEvent};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Refuses to prompt when stdin is not a terminal.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Take the view's event receiver; a fresh view always has one.
pub fn take_events(view: &mut MapView) -> Result<mpsc::Receiver<ViewEvent>, CliError> {
    view.events().ok_or_else(|| CliError::ApiError {
        code: "internal".into(),
        message: "view events already taken".into(),
    })
}

/// Turn a bare region id or a full query string into a deep-link query.
pub fn deep_link_query(target: &str, details: bool) -> String {
    let target = target.trim();
    let mut query = if target.contains("region=") {
        target.trim_start_matches('?').to_owned()
    } else {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("region", target)
            .finish()
    };
    if details && !query.contains("details=true") {
        query.push_str("&details=true");
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_id_becomes_query() {
        assert_eq!(
            deep_link_query("550e8400-e29b-41d4-a716-446655440000", false),
            "region=550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn full_query_is_kept() {
        assert_eq!(
            deep_link_query("?region=abc&details=true", true),
            "region=abc&details=true"
        );
        assert_eq!(deep_link_query("region=abc", true), "region=abc&details=true");
    }

    #[test]
    fn hostile_bare_input_stays_encoded() {
        assert_eq!(deep_link_query("../etc/passwd", false), "region=..%2Fetc%2Fpasswd");
    }

    #[test]
    fn yes_flag_skips_prompt() {
        assert!(confirm("Delete?", "delete", true).unwrap_or(false));
    }
}
