// ── Region overlay store ──
//
// Full-replace storage for the region overlay. The store owns the only
// `watch::Sender`, so `refresh` is the single write path; readers hold
// cheap `OverlayReader` clones and never block the writer.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::Overlay;
use crate::source::RegionSource;

/// Owner of the current overlay.
pub struct OverlayStore {
    source: Arc<dyn RegionSource>,
    current: watch::Sender<Arc<Overlay>>,
}

impl OverlayStore {
    /// An empty store backed by `source`. Nothing is fetched until
    /// [`refresh`](Self::refresh).
    pub fn new(source: Arc<dyn RegionSource>) -> Self {
        let (current, _) = watch::channel(Arc::new(Overlay::default()));
        Self { source, current }
    }

    /// Fetch the whole overlay and replace the current one.
    ///
    /// On failure the previous overlay stays in place.
    pub async fn refresh(&self) -> Result<Arc<Overlay>, CoreError> {
        debug!("refreshing region overlay");
        let overlay = Arc::new(self.source.overlay().await?);
        self.current.send_replace(Arc::clone(&overlay));
        info!(regions = overlay.len(), "region overlay replaced");
        Ok(overlay)
    }

    /// The current overlay.
    pub fn get(&self) -> Arc<Overlay> {
        self.current.borrow().clone()
    }

    /// A read-only handle for other tasks.
    pub fn reader(&self) -> OverlayReader {
        OverlayReader {
            receiver: self.current.subscribe(),
        }
    }
}

/// Read-only view of the overlay.
#[derive(Clone)]
pub struct OverlayReader {
    receiver: watch::Receiver<Arc<Overlay>>,
}

impl OverlayReader {
    /// The current overlay.
    pub fn get(&self) -> Arc<Overlay> {
        self.receiver.borrow().clone()
    }
}
