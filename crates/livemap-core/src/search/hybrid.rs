// ── Hybrid search ──
//
// Debounced, cancelable fan-out to the region overlay and the geocoder.
// Queries flow through a `watch` channel: only the latest one matters, and
// its generation number records issuance order. A lookup still in flight
// when a newer query arrives is dropped, and a finished lookup is only
// published if nothing newer was issued meanwhile.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::coords::parse_coordinate_pair;
use super::local::search_overlay;
use crate::config::SearchConfig;
use crate::event::ViewEvent;
use crate::model::{
    CameraTarget, GeocodedPlace, LonLat, ResultSource, SearchResult, SearchResults, TriggerAction,
};
use crate::source::Geocoder;
use crate::store::OverlayReader;

/// Title of the synthetic coordinate result.
pub const GO_TO_COORDINATES: &str = "Go to coordinates";

#[derive(Debug, Clone, Default)]
struct PendingQuery {
    generation: u64,
    text: String,
}

/// Submits queries to a running search task.
#[derive(Clone)]
pub struct SearchHandle {
    queries: Arc<watch::Sender<PendingQuery>>,
}

impl SearchHandle {
    /// Replace the pending query. Returns its generation.
    pub fn submit(&self, raw: impl Into<String>) -> u64 {
        let text = raw.into();
        let mut generation = 0;
        self.queries.send_modify(|pending| {
            pending.generation += 1;
            pending.text = text;
            generation = pending.generation;
        });
        generation
    }
}

/// The two-source search pipeline.
pub struct HybridSearch {
    overlay: OverlayReader,
    geocoder: Arc<dyn Geocoder>,
    config: SearchConfig,
    zoom: f64,
}

impl HybridSearch {
    pub fn new(
        overlay: OverlayReader,
        geocoder: Arc<dyn Geocoder>,
        config: SearchConfig,
        zoom: f64,
    ) -> Self {
        Self {
            overlay,
            geocoder,
            config,
            zoom,
        }
    }

    /// Start the debounce loop. Results are published as
    /// [`ViewEvent::SearchResults`].
    pub fn spawn(
        self,
        events: mpsc::Sender<ViewEvent>,
        cancel: CancellationToken,
    ) -> (SearchHandle, JoinHandle<()>) {
        let (tx, rx) = watch::channel(PendingQuery::default());
        let task = tokio::spawn(self.run(rx, events, cancel));
        (
            SearchHandle {
                queries: Arc::new(tx),
            },
            task,
        )
    }

    async fn run(
        self,
        mut queries: watch::Receiver<PendingQuery>,
        events: mpsc::Sender<ViewEvent>,
        cancel: CancellationToken,
    ) {
        // Set when a newer query arrived while the previous one was running.
        let mut carried = false;

        loop {
            if !carried {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = queries.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            carried = false;

            // Quiet period, restarted on every new input.
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    changed = queries.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    () = tokio::time::sleep(self.config.debounce) => break,
                }
            }

            let PendingQuery { generation, text } = queries.borrow_and_update().clone();
            debug!(generation, query = %text, "running search");

            let results = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = queries.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!(generation, "search superseded while in flight");
                    carried = true;
                    continue;
                }
                results = self.lookup(generation, &text) => results,
            };

            if matches!(queries.has_changed(), Ok(true)) {
                debug!(generation, "discarding stale search results");
                carried = true;
                continue;
            }

            debug!(
                generation,
                results = results.results.len(),
                failed = results.failed.len(),
                "publishing search results"
            );
            if events.send(ViewEvent::SearchResults(results)).await.is_err() {
                break;
            }
        }

        debug!("search task exiting");
    }

    /// Resolve one query immediately, without debouncing.
    ///
    /// Never fails: a failing source only removes its own results and is
    /// listed in [`SearchResults::failed`].
    pub async fn lookup(&self, generation: u64, raw: &str) -> SearchResults {
        let query = raw.trim();
        if query.is_empty() {
            return SearchResults::empty(generation, query);
        }

        if let Some((lat, lon)) = parse_coordinate_pair(query) {
            let mut results = SearchResults::empty(generation, query);
            match CameraTarget::new(lat, lon, self.zoom) {
                Ok(target) => results.results.push(SearchResult {
                    title: GO_TO_COORDINATES.to_owned(),
                    description: query.to_owned(),
                    coordinates: LonLat::new(lon, lat),
                    source: ResultSource::Local,
                    region: None,
                    action: TriggerAction::FlyTo(target),
                }),
                Err(e) => warn!(error = %e, "coordinate query rejected"),
            }
            return results;
        }

        let overlay = self.overlay.get();
        let (local, external) = tokio::join!(
            async { search_overlay(&overlay, query, self.zoom) },
            self.geocoder.geocode(query, self.config.provider_limit),
        );

        let mut results = SearchResults::empty(generation, query);
        results.results = local;
        match external {
            Ok(places) => {
                results
                    .results
                    .extend(places.into_iter().filter_map(|p| self.external_result(p)));
            }
            Err(e) => {
                warn!(error = %e, generation, "geocoder lookup failed");
                results.failed.push(ResultSource::External);
            }
        }
        results.results.truncate(self.config.result_limit);
        results
    }

    fn external_result(&self, place: GeocodedPlace) -> Option<SearchResult> {
        let target = CameraTarget::at(place.coordinates, self.zoom).ok()?;
        Some(SearchResult {
            title: place.name,
            description: place.category.unwrap_or_default(),
            coordinates: place.coordinates,
            source: ResultSource::External,
            region: None,
            action: TriggerAction::FlyTo(target),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use livemap_api::RegionQuery;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::CoreError;
    use crate::model::{Overlay, RegionFeature, RegionId, RegionKind, Ring};
    use crate::source::{RegionListing, RegionSource};
    use crate::store::OverlayStore;

    /// Records every query; optionally slow or failing.
    struct FakeGeocoder {
        calls: Mutex<Vec<String>>,
        delay: Duration,
        places: usize,
        fail: bool,
    }

    impl FakeGeocoder {
        fn new(places: usize) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
                places,
                fail: false,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, text: &str, _limit: u32) -> Result<Vec<GeocodedPlace>, CoreError> {
            self.calls.lock().unwrap().push(text.to_owned());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(CoreError::Provider {
                    message: "503 Service Unavailable".into(),
                });
            }
            Ok((0..self.places)
                .map(|i| GeocodedPlace {
                    name: format!("{text} #{i}"),
                    category: Some("city".into()),
                    coordinates: LonLat::new(10.0, 50.0),
                })
                .collect())
        }
    }

    struct StaticRegions(Vec<RegionFeature>);

    #[async_trait]
    impl RegionSource for StaticRegions {
        async fn overlay(&self) -> Result<Overlay, CoreError> {
            Ok(Overlay::new(self.0.clone()))
        }
        async fn region(&self, id: &RegionId) -> Result<RegionFeature, CoreError> {
            Err(CoreError::RegionNotFound { id: id.to_string() })
        }
        async fn list(&self, _query: &RegionQuery) -> Result<RegionListing, CoreError> {
            Ok(RegionListing::default())
        }
        async fn delete(&self, _id: &RegionId) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn region(n: u128, city: &str) -> RegionFeature {
        RegionFeature {
            id: RegionId::from(uuid::Uuid::from_u128(n)),
            kind: RegionKind::Normal,
            ring: Ring::new(vec![
                LonLat::new(0.0, 0.0),
                LonLat::new(0.0, 1.0),
                LonLat::new(1.0, 1.0),
                LonLat::new(1.0, 0.0),
            ]),
            owner_uuid: None,
            owner_name: Some("owner".into()),
            city: Some(city.into()),
            area: None,
            created_at: None,
        }
    }

    async fn search_with(geocoder: Arc<FakeGeocoder>, regions: Vec<RegionFeature>) -> HybridSearch {
        let store = OverlayStore::new(Arc::new(StaticRegions(regions)));
        store.refresh().await.unwrap();
        let reader = store.reader();
        // The reader keeps the last overlay after the store is dropped.
        drop(store);
        HybridSearch::new(reader, geocoder, SearchConfig::default(), 16.0)
    }

    async fn next_results(rx: &mut mpsc::Receiver<ViewEvent>) -> SearchResults {
        match rx.recv().await {
            Some(ViewEvent::SearchResults(results)) => results,
            other => panic!("expected search results, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn coordinates_short_circuit() {
        let geocoder = Arc::new(FakeGeocoder::new(3));
        let search = search_with(Arc::clone(&geocoder), vec![region(1, "58 Street")]).await;

        let results = search.lookup(1, "58.11,-107.37").await;

        assert_eq!(results.results.len(), 1);
        let hit = &results.results[0];
        assert_eq!(hit.title, GO_TO_COORDINATES);
        assert_eq!(hit.description, "58.11,-107.37");
        assert_eq!(hit.coordinates, LonLat::new(-107.37, 58.11));
        assert!(geocoder.calls().is_empty(), "no provider call for coordinates");
    }

    #[tokio::test]
    async fn text_hits_both_sources_local_first() {
        let geocoder = Arc::new(FakeGeocoder::new(2));
        let search = search_with(
            Arc::clone(&geocoder),
            vec![region(1, "Hello World City"), region(2, "Elsewhere")],
        )
        .await;

        let results = search.lookup(1, "hello world").await;

        assert_eq!(geocoder.calls(), vec!["hello world".to_owned()]);
        let sources: Vec<ResultSource> = results.results.iter().map(|r| r.source).collect();
        assert_eq!(
            sources,
            vec![ResultSource::Local, ResultSource::External, ResultSource::External]
        );
        assert_eq!(results.results[0].title, "Hello World City");
        assert_eq!(results.results[1].title, "hello world #0");
        assert_eq!(results.results[2].title, "hello world #1");
        assert!(results.failed.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_keeps_local_results() {
        let mut geocoder = FakeGeocoder::new(5);
        geocoder.fail = true;
        let search = search_with(
            Arc::new(geocoder),
            vec![region(1, "Berlin Mitte"), region(2, "Berlin Nord")],
        )
        .await;

        let results = search.lookup(7, "berlin").await;

        assert_eq!(results.results.len(), 2);
        assert!(results.results.iter().all(|r| r.source == ResultSource::Local));
        assert_eq!(results.failed, vec![ResultSource::External]);
        assert_eq!(results.generation, 7);
    }

    #[tokio::test]
    async fn both_failing_is_just_empty() {
        let mut geocoder = FakeGeocoder::new(0);
        geocoder.fail = true;
        let search = search_with(Arc::new(geocoder), vec![]).await;

        let results = search.lookup(1, "nothing").await;
        assert!(results.results.is_empty());
    }

    #[tokio::test]
    async fn merged_results_are_capped() {
        let geocoder = Arc::new(FakeGeocoder::new(60));
        let search = search_with(geocoder, vec![region(1, "Paris"), region(2, "Paris Sud")]).await;

        let results = search.lookup(1, "paris").await;

        assert_eq!(results.results.len(), 50);
        assert_eq!(results.results[0].source, ResultSource::Local);
        assert_eq!(results.results[1].source, ResultSource::Local);
        assert_eq!(results.results[49].source, ResultSource::External);
    }

    #[tokio::test]
    async fn blank_query_does_no_lookups() {
        let geocoder = Arc::new(FakeGeocoder::new(3));
        let search = search_with(Arc::clone(&geocoder), vec![region(1, "x")]).await;
        assert!(search.lookup(1, "   ").await.results.is_empty());
        assert!(geocoder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_collapses_rapid_typing() {
        let geocoder = Arc::new(FakeGeocoder::new(1));
        let search = search_with(Arc::clone(&geocoder), vec![]).await;
        let (tx, mut rx) = mpsc::channel(16);
        let (handle, _task) = search.spawn(tx, CancellationToken::new());

        for text in ["b", "be", "ber", "berl"] {
            handle.submit(text);
            tokio::time::sleep(Duration::from_millis(150)).await;
        }

        let results = next_results(&mut rx).await;
        assert_eq!(results.query, "berl");
        assert_eq!(results.generation, 4);
        assert_eq!(geocoder.calls(), vec!["berl".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_query_never_publishes() {
        let mut slow = FakeGeocoder::new(1);
        slow.delay = Duration::from_secs(1);
        let geocoder = Arc::new(slow);
        let search = search_with(Arc::clone(&geocoder), vec![]).await;
        let (tx, mut rx) = mpsc::channel(16);
        let (handle, _task) = search.spawn(tx, CancellationToken::new());

        let q1 = handle.submit("first");
        // Past the debounce: Q1's geocoder call is now in flight.
        tokio::time::sleep(Duration::from_millis(250)).await;
        let q2 = handle.submit("second");
        assert!(q2 > q1);

        let results = next_results(&mut rx).await;
        assert_eq!(results.query, "second");
        assert_eq!(results.generation, q2);
        assert_eq!(geocoder.calls(), vec!["first".to_owned(), "second".to_owned()]);

        // Nothing else arrives, in particular not Q1.
        let late = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(late.is_err(), "unexpected extra event: {late:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_task() {
        let search = search_with(Arc::new(FakeGeocoder::new(0)), vec![]).await;
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let (handle, task) = search.spawn(tx, cancel.clone());

        handle.submit("pending");
        cancel.cancel();
        task.await.unwrap();

        assert!(rx.recv().await.is_none());
    }
}
