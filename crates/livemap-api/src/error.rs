use thiserror::Error;

/// Top-level error type for the `livemap-api` crate.
///
/// Covers every failure mode across the wire surfaces: the region
/// service, the geocoding provider, and the position socket.
/// `livemap-core` maps these into domain diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The server rejected the bearer credential (401/403).
    #[error("Unauthorized (HTTP {status}) -- a valid bearer token is required")]
    Unauthorized { status: u16 },

    /// A privileged call was attempted without any credential configured.
    #[error("No bearer token configured for {operation}")]
    MissingToken { operation: &'static str },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// Non-success status with whatever message the server sent.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// Malformed Socket.IO / Engine.IO frame.
    #[error("Socket protocol error: {0}")]
    Protocol(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => {
                true
            }
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the credential was missing or rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::MissingToken { .. })
    }
}
