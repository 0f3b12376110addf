// ── Position stream ──
//
// Adapts the raw socket event feed into typed snapshots and health
// transitions. Sequence numbers are stamped here, at receipt, so the
// reconciler can refuse anything that is not newer than what it applied.

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use livemap_api::{ReconnectConfig, SocketEvent, SocketHandle};

use crate::convert::positions_from_payload;
use crate::error::CoreError;
use crate::model::{ConnectionHealth, PositionSnapshot};

/// Socket event carrying player positions.
pub const POSITIONS_EVENT: &str = "playerLocations";

/// What the stream yields to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Snapshot(PositionSnapshot),
    Health(ConnectionHealth),
}

enum Feed {
    Socket(SocketHandle),
    Channel(mpsc::Receiver<SocketEvent>),
}

/// Typed position feed with connection health.
pub struct PositionStream {
    feed: Feed,
    decoder: PositionDecoder,
}

impl PositionStream {
    /// Open the position socket. The connection itself is established in the
    /// background and re-established after drops.
    pub fn connect(
        url: &Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError> {
        let handle = SocketHandle::connect(url, reconnect, cancel)?;
        Ok(Self {
            feed: Feed::Socket(handle),
            decoder: PositionDecoder::new(),
        })
    }

    /// Drive the stream from an already-open event channel.
    pub fn from_channel(events: mpsc::Receiver<SocketEvent>) -> Self {
        Self {
            feed: Feed::Channel(events),
            decoder: PositionDecoder::new(),
        }
    }

    /// Current health, observable from other tasks.
    pub fn health(&self) -> watch::Receiver<ConnectionHealth> {
        self.decoder.health.subscribe()
    }

    /// Next snapshot or health change. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        loop {
            let raw = match &mut self.feed {
                Feed::Socket(handle) => handle.recv().await,
                Feed::Channel(rx) => rx.recv().await,
            };
            let Some(raw) = raw else {
                // A dead feed is a disconnected feed.
                return self.decoder.set_health(ConnectionHealth::Disconnected);
            };
            if let Some(event) = self.decoder.handle(raw) {
                return Some(event);
            }
        }
    }
}

/// Pure event translation, separated from the transport for testing.
struct PositionDecoder {
    next_sequence: u64,
    health: watch::Sender<ConnectionHealth>,
}

impl PositionDecoder {
    fn new() -> Self {
        let (health, _) = watch::channel(ConnectionHealth::Disconnected);
        Self {
            next_sequence: 1,
            health,
        }
    }

    fn handle(&mut self, event: SocketEvent) -> Option<StreamEvent> {
        match event {
            SocketEvent::Connected => self.set_health(ConnectionHealth::Connected),
            SocketEvent::Disconnected { reason } => {
                warn!(%reason, "position socket disconnected");
                self.set_health(ConnectionHealth::Disconnected)
            }
            SocketEvent::Message { event, payload } if event == POSITIONS_EVENT => {
                match positions_from_payload(&payload) {
                    Ok(positions) => {
                        let sequence = self.next_sequence;
                        self.next_sequence += 1;
                        trace!(sequence, entities = positions.len(), "position snapshot");
                        Some(StreamEvent::Snapshot(PositionSnapshot {
                            sequence,
                            received_at: Utc::now(),
                            positions,
                        }))
                    }
                    Err(e) => {
                        warn!(error = %e, "discarding position payload");
                        None
                    }
                }
            }
            SocketEvent::Message { event, .. } => {
                debug!(event = %event, "ignoring socket event");
                None
            }
        }
    }

    /// Emit only actual transitions.
    fn set_health(&self, health: ConnectionHealth) -> Option<StreamEvent> {
        let changed = self.health.send_if_modified(|current| {
            if *current == health {
                false
            } else {
                *current = health;
                true
            }
        });
        if changed {
            info!(%health, "position stream health changed");
            Some(StreamEvent::Health(health))
        } else {
            None
        }
    }
}
