// ── Map view controller ──
//
// Owns every piece of view state and its lifecycle. `mount` starts the
// position and search tasks, `unmount` (or drop) cancels them. Each piece
// of state has exactly one writer: the overlay store, the position task
// (markers, health) and the search task (results). Everything observable
// by the UI flows out as `ViewEvent`s on one channel.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use livemap_api::{GeocoderClient, RegionClient, RegionQuery, TlsMode, TransportConfig};

use crate::config::{DEFAULT_GEOCODER_URL, MapViewConfig, TlsVerification};
use crate::deeplink::DeepLink;
use crate::error::CoreError;
use crate::event::{VIEW_EVENT_CAPACITY, ViewEvent};
use crate::model::{
    ConnectionHealth, DisplayedMarker, MarkerDelta, Overlay, RegionFeature, RegionId,
    SearchResults,
};
use crate::reconcile::MarkerReconciler;
use crate::search::{HybridSearch, SearchHandle};
use crate::source::{Geocoder, RegionListing, RegionSource};
use crate::store::OverlayStore;
use crate::stream::{PositionStream, StreamEvent};
use crate::viewport::ViewportController;

/// Generation used for one-shot lookups outside the debounce pipeline.
const ONE_SHOT_GENERATION: u64 = 0;

// ── MapView ──────────────────────────────────────────────────────

/// The main entry point for consumers.
pub struct MapView {
    config: MapViewConfig,
    regions: Arc<dyn RegionSource>,
    geocoder: Arc<dyn Geocoder>,
    overlay: OverlayStore,
    viewport: ViewportController,
    deep_link: DeepLink,
    events_tx: mpsc::Sender<ViewEvent>,
    events_rx: Option<mpsc::Receiver<ViewEvent>>,
    session: Option<Session>,
}

/// Everything that lives between `mount` and `unmount`.
struct Session {
    cancel: CancellationToken,
    search: SearchHandle,
    markers: watch::Receiver<Arc<Vec<DisplayedMarker>>>,
    health: watch::Receiver<ConnectionHealth>,
    tasks: Vec<JoinHandle<()>>,
}

impl MapView {
    /// Build a view backed by the HTTP region service and geocoder named in
    /// `config`. Does NOT connect -- call [`mount()`](Self::mount).
    pub fn new(config: MapViewConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);

        let regions = RegionClient::new(config.server_url.clone(), config.auth.clone(), &transport)?;

        let geocoder_url = match &config.geocoder_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_GEOCODER_URL).map_err(|e| CoreError::Config {
                message: format!("Invalid geocoder URL: {e}"),
            })?,
        };
        let geocoder = GeocoderClient::new(geocoder_url, &transport)?;

        Ok(Self::with_sources(config, Arc::new(regions), Arc::new(geocoder)))
    }

    /// Build a view over arbitrary region and geocoder implementations.
    pub fn with_sources(
        config: MapViewConfig,
        regions: Arc<dyn RegionSource>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(VIEW_EVENT_CAPACITY);
        let viewport = ViewportController::new(events_tx.clone());
        let deep_link = DeepLink::new(
            Arc::clone(&regions),
            viewport.clone(),
            events_tx.clone(),
            config.zoom.region,
        );

        Self {
            overlay: OverlayStore::new(Arc::clone(&regions)),
            config,
            regions,
            geocoder,
            viewport,
            deep_link,
            events_tx,
            events_rx: Some(events_rx),
            session: None,
        }
    }

    pub fn config(&self) -> &MapViewConfig {
        &self.config
    }

    /// Take the view event receiver. There is exactly one; later calls
    /// return `None`.
    pub fn events(&mut self) -> Option<mpsc::Receiver<ViewEvent>> {
        self.events_rx.take()
    }

    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Mount with the live position socket from the configuration.
    ///
    /// `deep_link` is the page query string, resolved once the overlay
    /// and tasks are up.
    pub async fn mount(&mut self, deep_link: Option<&str>) -> Result<(), CoreError> {
        self.ensure_unmounted()?;
        let cancel = CancellationToken::new();
        // The socket closes with the session, not only when its handle drops.
        let stream = PositionStream::connect(
            self.config.effective_socket_url(),
            self.config.reconnect.clone(),
            cancel.child_token(),
        )?;
        self.start_session(Some(stream), deep_link, cancel).await
    }

    /// Mount with an explicit position feed, or none at all.
    ///
    /// Sets the initial camera, loads the overlay (a failure is logged and
    /// leaves it empty), starts the position and search tasks, then
    /// resolves `deep_link`.
    pub async fn mount_with(
        &mut self,
        positions: Option<PositionStream>,
        deep_link: Option<&str>,
    ) -> Result<(), CoreError> {
        self.ensure_unmounted()?;
        self.start_session(positions, deep_link, CancellationToken::new())
            .await
    }

    fn ensure_unmounted(&self) -> Result<(), CoreError> {
        if self.session.is_some() {
            return Err(CoreError::Internal("map view is already mounted".into()));
        }
        Ok(())
    }

    async fn start_session(
        &mut self,
        positions: Option<PositionStream>,
        deep_link: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<(), CoreError> {
        let initial = self.config.initial_view;
        self.viewport.fly_to(initial.lat, initial.lon, initial.zoom);

        if let Err(e) = self.refresh_overlay().await {
            warn!(error = %e, "initial overlay load failed");
        }

        let mut tasks = Vec::with_capacity(2);

        let (markers_tx, markers) = watch::channel(Arc::new(Vec::new()));
        let health = match positions {
            Some(stream) => {
                let health = stream.health();
                tasks.push(tokio::spawn(position_task(
                    stream,
                    self.events_tx.clone(),
                    markers_tx,
                    cancel.clone(),
                )));
                health
            }
            None => watch::channel(ConnectionHealth::Disconnected).1,
        };

        let search = HybridSearch::new(
            self.overlay.reader(),
            Arc::clone(&self.geocoder),
            self.config.search.clone(),
            self.config.zoom.region,
        );
        let (search, search_task) = search.spawn(self.events_tx.clone(), cancel.clone());
        tasks.push(search_task);

        self.session = Some(Session {
            cancel,
            search,
            markers,
            health,
            tasks,
        });
        info!("map view mounted");

        if let Some(query) = deep_link {
            self.navigate(query).await;
        }
        Ok(())
    }

    /// Release the position connection and cancel pending searches.
    pub async fn unmount(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.cancel.cancel();
        for task in session.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "view task ended abnormally");
            }
        }
        info!("map view unmounted");
    }

    // ── Overlay ──────────────────────────────────────────────────

    /// Fetch and replace the region overlay, then tell the UI.
    ///
    /// This is the explicit refresh signal; nothing polls.
    pub async fn refresh_overlay(&self) -> Result<Arc<Overlay>, CoreError> {
        let overlay = self.overlay.refresh().await?;
        self.emit(ViewEvent::OverlayReplaced(Arc::clone(&overlay)));
        Ok(overlay)
    }

    /// The current overlay.
    pub fn overlay(&self) -> Arc<Overlay> {
        self.overlay.get()
    }

    // ── Search & navigation ──────────────────────────────────────

    /// Feed the debounced search. Returns the query's generation, or
    /// `None` when the view is not mounted.
    pub fn search(&self, raw: impl Into<String>) -> Option<u64> {
        let Some(session) = &self.session else {
            warn!("search ignored: map view is not mounted");
            return None;
        };
        Some(session.search.submit(raw))
    }

    /// Resolve a query immediately, bypassing the debounce window.
    pub async fn search_now(&self, raw: &str) -> SearchResults {
        HybridSearch::new(
            self.overlay.reader(),
            Arc::clone(&self.geocoder),
            self.config.search.clone(),
            self.config.zoom.region,
        )
        .lookup(ONE_SHOT_GENERATION, raw)
        .await
    }

    /// Handle a (changed) deep-link query string.
    pub async fn navigate(&self, query: &str) -> Option<RegionFeature> {
        self.deep_link.resolve(query).await
    }

    /// Fire-and-forget camera move.
    pub fn fly_to(&self, lat: f64, lon: f64, zoom: f64) -> bool {
        self.viewport.fly_to(lat, lon, zoom)
    }

    // ── Players ──────────────────────────────────────────────────

    /// Markers on the map, sorted by display name.
    pub fn players(&self) -> Vec<DisplayedMarker> {
        self.session
            .as_ref()
            .map(|s| (**s.markers.borrow()).clone())
            .unwrap_or_default()
    }

    /// Fly to a player's last known position.
    pub fn focus_player(&self, identity: &str) -> bool {
        let Some(player) = self.players().into_iter().find(|p| p.identity == identity) else {
            debug!(identity, "focus requested for unknown player");
            return false;
        };
        let at = player.last_coordinates;
        self.viewport.fly_to(at.lat, at.lon, self.config.zoom.player)
    }

    /// Position socket health.
    pub fn health(&self) -> ConnectionHealth {
        self.session
            .as_ref()
            .map_or(ConnectionHealth::Disconnected, |s| *s.health.borrow())
    }

    // ── Region administration ────────────────────────────────────

    /// Paged region listing (requires a bearer token).
    pub async fn list_regions(&self, query: &RegionQuery) -> Result<RegionListing, CoreError> {
        self.regions.list(query).await
    }

    /// Delete a region, then refresh the overlay so it disappears.
    pub async fn delete_region(&self, id: &RegionId) -> Result<Arc<Overlay>, CoreError> {
        self.regions.delete(id).await?;
        info!(region = %id, "region deleted");
        self.refresh_overlay().await
    }

    fn emit(&self, event: ViewEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            debug!(error = %e, "view event dropped");
        }
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Apply position snapshots to the marker set and report changes.
async fn position_task(
    mut stream: PositionStream,
    events: mpsc::Sender<ViewEvent>,
    markers: watch::Sender<Arc<Vec<DisplayedMarker>>>,
    cancel: CancellationToken,
) {
    let mut reconciler = MarkerReconciler::new();

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = stream.next() => event,
        };
        let Some(event) = event else { break };

        let view_event = match event {
            StreamEvent::Health(health) => ViewEvent::ConnectionHealthChanged(health),
            StreamEvent::Snapshot(snapshot) => {
                let Some(delta) = reconciler.reconcile(&snapshot) else {
                    continue;
                };
                if delta.is_empty() {
                    continue;
                }
                markers.send_replace(Arc::new(reconciler.sorted_markers()));
                ViewEvent::MarkerDelta(delta)
            }
        };

        if events.send(view_event).await.is_err() {
            break;
        }
    }

    // Release every handle on the way out.
    let released = reconciler.clear();
    if !released.is_empty() {
        markers.send_replace(Arc::new(Vec::new()));
        let _ = events.try_send(ViewEvent::MarkerDelta(MarkerDelta {
            to_remove: released,
            to_upsert: Vec::new(),
        }));
    }
    debug!("position task exiting");
}

// ── Helpers ──────────────────────────────────────────────────────

fn build_transport(config: &MapViewConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}
