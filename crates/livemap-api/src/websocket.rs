//! Socket.IO event stream with auto-reconnect.
//!
//! Speaks just enough Engine.IO v4 / Socket.IO v5 over a raw WebSocket to
//! join the default namespace and receive server-emitted events. Parsed
//! events flow through a single-consumer [`tokio::sync::mpsc`] channel in
//! arrival order, interleaved with connection lifecycle events.
//! Reconnection uses exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use livemap_api::websocket::{SocketHandle, SocketEvent, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let url = Url::parse("wss://map.example.org")?;
//!
//! let mut handle = SocketHandle::connect(&url, ReconnectConfig::default(), cancel.clone())?;
//!
//! while let Some(event) = handle.recv().await {
//!     if let SocketEvent::Message { event, payload } = event {
//!         println!("{event}: {payload}");
//!     }
//! }
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Channel capacity ─────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Liveness window used until the server's handshake says otherwise.
const DEFAULT_LIVENESS: Duration = Duration::from_secs(45);

// ── SocketEvent ──────────────────────────────────────────────────────

/// What the background task reports to its single consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// The namespace handshake completed; events will follow.
    Connected,
    /// A previously established connection dropped.
    Disconnected { reason: String },
    /// A server-emitted event (`42["name", payload]`).
    Message {
        event: String,
        payload: serde_json::Value,
    },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for socket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive failed attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── SocketHandle ─────────────────────────────────────────────────────

/// Handle to a running socket event stream.
///
/// Owns the only receiver. Dropping the handle (or calling
/// [`shutdown`](Self::shutdown)) tears down the background task.
pub struct SocketHandle {
    event_rx: mpsc::Receiver<SocketEvent>,
    cancel: CancellationToken,
}

impl SocketHandle {
    /// Spawn the reconnection loop against `base_url`.
    ///
    /// Returns immediately once the background task is spawned; the first
    /// connection attempt happens asynchronously.
    pub fn connect(
        base_url: &Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let url = engine_io_url(base_url)?;
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            socket_loop(url, event_tx, reconnect, task_cancel).await;
        });

        Ok(Self { event_rx, cancel })
    }

    /// Wait for the next event. `None` once the background task has exited.
    pub async fn recv(&mut self) -> Option<SocketEvent> {
        self.event_rx.recv().await
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── URL construction ─────────────────────────────────────────────────

/// Turn a server base URL into the Engine.IO WebSocket endpoint.
///
/// `https://host` → `wss://host/socket.io/?EIO=4&transport=websocket`.
/// An explicit non-root path is kept as-is.
pub fn engine_io_url(base: &Url) -> Result<Url, Error> {
    let mut url = base.clone();

    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported socket URL scheme: {other}"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::WebSocketConnect(format!("cannot use scheme {scheme}")))?;

    if url.path().is_empty() || url.path() == "/" {
        url.set_path("/socket.io/");
    }
    url.query_pairs_mut()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");

    Ok(url)
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on drop, backoff → reconnect.
async fn socket_loop(
    url: Url,
    event_tx: mpsc::Sender<SocketEvent>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let mut connected = false;

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&url, &event_tx, &cancel, &mut connected) => result,
        };

        if connected {
            let reason = match &result {
                Ok(()) => "connection closed".to_owned(),
                Err(e) => e.to_string(),
            };
            if event_tx
                .send(SocketEvent::Disconnected { reason })
                .await
                .is_err()
            {
                break;
            }
        }

        if event_tx.is_closed() || cancel.is_cancelled() {
            break;
        }

        if let Err(ref e) = result {
            tracing::warn!(error = %e, attempt, "socket error");
        }

        // A session that got through the handshake resets the budget.
        let delay = if connected {
            tracing::info!("socket session ended, reconnecting");
            attempt = 0;
            reconnect.initial_delay
        } else {
            if let Some(max) = reconnect.max_retries {
                if attempt >= max {
                    tracing::error!(
                        max_retries = max,
                        "socket reconnection limit reached, giving up"
                    );
                    break;
                }
            }
            let delay = calculate_backoff(attempt, &reconnect);
            attempt += 1;
            delay
        };

        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!("socket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection and pump frames until it drops.
///
/// Sets `connected` once the namespace handshake (`40`) is acknowledged.
async fn connect_and_read(
    url: &Url,
    event_tx: &mpsc::Sender<SocketEvent>,
    cancel: &CancellationToken,
    connected: &mut bool,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to position socket");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();
    let mut liveness = DEFAULT_LIVENESS;

    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(Message::text("41")).await;
                return Ok(());
            }
            frame = tokio::time::timeout(liveness, read.next()) => frame,
        };

        let Ok(frame) = frame else {
            return Err(Error::WebSocketClosed {
                code: 1006,
                reason: format!("no traffic for {}s", liveness.as_secs()),
            });
        };

        match frame {
            Some(Ok(Message::Text(text))) => match parse_packet(&text) {
                Err(e) if text.starts_with('0') => return Err(e),
                Err(e) => {
                    // Only a bad handshake ends the session.
                    tracing::warn!(error = %e, "skipping malformed socket frame");
                }
                Ok(packet) => match packet {
                    Packet::Open(handshake) => {
                        liveness = handshake.liveness();
                        tracing::debug!(sid = %handshake.sid, ?liveness, "engine.io open");
                        write
                            .send(Message::text("40"))
                            .await
                            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                    }
                    Packet::Connect => {
                        tracing::info!("position socket connected");
                        *connected = true;
                        if event_tx.send(SocketEvent::Connected).await.is_err() {
                            return Ok(());
                        }
                    }
                    Packet::Ping => {
                        write
                            .send(Message::text("3"))
                            .await
                            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                    }
                    Packet::Event { event, payload } => {
                        tracing::trace!(event = %event, "socket event");
                        if event_tx
                            .send(SocketEvent::Message { event, payload })
                            .await
                            .is_err()
                        {
                            return Ok(());
                        }
                    }
                    Packet::ConnectError(message) => {
                        return Err(Error::Protocol(format!("namespace refused: {message}")));
                    }
                    Packet::Disconnect | Packet::Close => {
                        tracing::info!("server closed the socket session");
                        return Ok(());
                    }
                    Packet::Ignored => {}
                },
            },
            Some(Ok(Message::Close(frame))) => {
                if let Some(ref cf) = frame {
                    tracing::info!(code = %cf.code, reason = %cf.reason, "close frame received");
                } else {
                    tracing::info!("close frame received (no payload)");
                }
                return Ok(());
            }
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
            None => {
                tracing::info!("socket stream ended");
                return Ok(());
            }
            // Binary, Ping, Pong, Frame -- tungstenite answers pings itself
            Some(Ok(_)) => {}
        }
    }
}

// ── Packet parsing ───────────────────────────────────────────────────

/// Engine.IO open payload (`0{...}`).
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Handshake {
    #[serde(default)]
    sid: String,
    #[serde(default = "default_ping_interval")]
    ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl Handshake {
    /// How long the connection may stay silent before it counts as dead.
    fn liveness(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

#[derive(Debug)]
enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Connect,
    Disconnect,
    Event {
        event: String,
        payload: serde_json::Value,
    },
    ConnectError(String),
    Ignored,
}

/// Decode one Engine.IO text frame (and the Socket.IO packet inside `4`).
fn parse_packet(text: &str) -> Result<Packet, Error> {
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Err(Error::Protocol("empty frame".into()));
    };
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(Packet::Open)
            .map_err(|e| Error::Protocol(format!("bad open packet: {e}"))),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        // pong, upgrade, noop
        '3' | '5' | '6' => Ok(Packet::Ignored),
        '4' => parse_socket_packet(rest),
        other => Err(Error::Protocol(format!("unknown engine.io packet type {other:?}"))),
    }
}

fn parse_socket_packet(text: &str) -> Result<Packet, Error> {
    let mut chars = text.chars();
    let kind = chars.next();
    let body = strip_namespace_and_ack(chars.as_str());

    match kind {
        Some('0') => Ok(Packet::Connect),
        Some('1') => Ok(Packet::Disconnect),
        Some('2') => {
            let mut args: Vec<serde_json::Value> = serde_json::from_str(body)
                .map_err(|e| Error::Protocol(format!("bad event packet: {e}")))?;
            if args.is_empty() {
                return Err(Error::Protocol("event packet without a name".into()));
            }
            let payload = if args.len() > 1 {
                args.swap_remove(1)
            } else {
                serde_json::Value::Null
            };
            match args.swap_remove(0) {
                serde_json::Value::String(event) => Ok(Packet::Event { event, payload }),
                other => Err(Error::Protocol(format!("event name is not a string: {other}"))),
            }
        }
        Some('4') => Ok(Packet::ConnectError(body.to_owned())),
        // acks and binary variants are not used by the position server
        Some(_) => Ok(Packet::Ignored),
        None => Err(Error::Protocol("empty socket.io packet".into())),
    }
}

/// Skip an optional `/namespace,` prefix and a numeric ack id.
fn strip_namespace_and_ack(body: &str) -> &str {
    let body = if body.starts_with('/') {
        body.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        body
    };
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from many viewers.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        // With jitter factor up to 1.25, max effective is 12.5s
        assert!(d10 <= Duration::from_secs(13), "{d10:?} should be capped");
    }

    #[test]
    fn engine_io_url_from_https_root() {
        let url = engine_io_url(&Url::parse("https://map.example.org").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://map.example.org/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn engine_io_url_keeps_custom_path() {
        let url = engine_io_url(&Url::parse("http://localhost:8899/live/").unwrap()).unwrap();
        assert_eq!(url.scheme(), "ws");
        assert_eq!(url.path(), "/live/");
    }

    #[test]
    fn engine_io_url_rejects_other_schemes() {
        assert!(engine_io_url(&Url::parse("ftp://example.org").unwrap()).is_err());
    }

    #[test]
    fn parse_open_packet() {
        let packet =
            parse_packet(r#"0{"sid":"abc","upgrades":[],"pingInterval":1000,"pingTimeout":500}"#)
                .unwrap();
        let Packet::Open(handshake) = packet else {
            panic!("expected open packet, got {packet:?}");
        };
        assert_eq!(handshake.sid, "abc");
        assert_eq!(handshake.liveness(), Duration::from_millis(1500));
    }

    #[test]
    fn parse_event_with_string_payload() {
        let packet = parse_packet(r#"42["playerLocations","{\"features\":[]}"]"#).unwrap();
        let Packet::Event { event, payload } = packet else {
            panic!("expected event packet, got {packet:?}");
        };
        assert_eq!(event, "playerLocations");
        assert_eq!(payload, serde_json::json!("{\"features\":[]}"));
    }

    #[test]
    fn parse_event_with_namespace_and_ack() {
        let packet = parse_packet(r#"42/live,17["tick",{"n":1}]"#).unwrap();
        let Packet::Event { event, payload } = packet else {
            panic!("expected event packet, got {packet:?}");
        };
        assert_eq!(event, "tick");
        assert_eq!(payload["n"], 1);
    }

    #[test]
    fn parse_event_without_payload() {
        let packet = parse_packet(r#"42["reset"]"#).unwrap();
        assert!(matches!(
            packet,
            Packet::Event { ref event, payload: serde_json::Value::Null } if event == "reset"
        ));
    }

    #[test]
    fn parse_control_packets() {
        assert!(matches!(parse_packet("2").unwrap(), Packet::Ping));
        assert!(matches!(parse_packet("3").unwrap(), Packet::Ignored));
        assert!(matches!(parse_packet("1").unwrap(), Packet::Close));
        assert!(matches!(parse_packet(r#"40{"sid":"x"}"#).unwrap(), Packet::Connect));
        assert!(matches!(parse_packet("41").unwrap(), Packet::Disconnect));
        assert!(matches!(
            parse_packet(r#"44{"message":"nope"}"#).unwrap(),
            Packet::ConnectError(_)
        ));
    }

    #[test]
    fn parse_malformed_frames() {
        assert!(parse_packet("").is_err());
        assert!(parse_packet("9").is_err());
        assert!(parse_packet("42not json").is_err());
        assert!(parse_packet("42[]").is_err());
        assert!(parse_packet("42[7, {}]").is_err());
    }
}
