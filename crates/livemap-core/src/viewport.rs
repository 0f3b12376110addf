// ── Camera transitions ──
//
// Fire-and-forget: callers never wait on the UI and never see an error.
// Invalid targets and a saturated or closed event channel are logged.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::event::ViewEvent;
use crate::model::CameraTarget;

#[derive(Clone)]
pub struct ViewportController {
    events: mpsc::Sender<ViewEvent>,
}

impl ViewportController {
    pub fn new(events: mpsc::Sender<ViewEvent>) -> Self {
        Self { events }
    }

    /// Request a camera move. Returns whether the request was queued.
    pub fn fly_to(&self, lat: f64, lon: f64, zoom: f64) -> bool {
        match CameraTarget::new(lat, lon, zoom) {
            Ok(target) => self.fly_to_target(target),
            Err(e) => {
                warn!(error = %e, "ignoring camera transition");
                false
            }
        }
    }

    /// Request a move to an already validated target.
    pub fn fly_to_target(&self, target: CameraTarget) -> bool {
        match self.events.try_send(ViewEvent::ViewportChange(target)) {
            Ok(()) => {
                debug!(lat = target.lat, lon = target.lon, zoom = target.zoom, "fly to");
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!("view event queue full, dropping camera transition");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("view closed, dropping camera transition");
                false
            }
        }
    }
}
