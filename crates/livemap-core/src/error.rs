// ── Core error types ──
//
// User-facing errors from livemap-core. Consumers never see HTTP status
// codes or raw JSON failures directly: the `From<livemap_api::Error>` impl
// translates wire-level errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Region not found: {id}")]
    RegionNotFound { id: String },

    /// A region identifier that is not a canonical 8-4-4-4-12 UUID.
    #[error("Rejected region identifier {value:?}: not a UUID")]
    InvalidRegionId { value: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Provider errors ──────────────────────────────────────────────
    #[error("Geocoding provider failed: {message}")]
    Provider { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<livemap_api::Error> for CoreError {
    fn from(err: livemap_api::Error) -> Self {
        match err {
            livemap_api::Error::Unauthorized { status } => CoreError::AuthenticationFailed {
                message: format!("server answered HTTP {status}"),
            },
            livemap_api::Error::MissingToken { operation } => CoreError::AuthenticationFailed {
                message: format!("a bearer token is required to {operation}"),
            },
            livemap_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            livemap_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            livemap_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            livemap_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            livemap_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            livemap_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason,
            },
            livemap_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("socket closed ({code}): {reason}"),
            },
            livemap_api::Error::Protocol(message) => CoreError::Api {
                message: format!("socket protocol: {message}"),
                status: None,
            },
            livemap_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected response shape: {message}"),
                status: None,
            },
        }
    }
}

impl CoreError {
    /// Map a region lookup failure, turning 404s into [`CoreError::RegionNotFound`].
    pub(crate) fn from_region_lookup(err: livemap_api::Error, id: &str) -> Self {
        if err.is_not_found() {
            CoreError::RegionNotFound { id: id.to_owned() }
        } else {
            err.into()
        }
    }
}
