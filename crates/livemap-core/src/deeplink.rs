// ── Deep links ──
//
// `?region=<uuid>[&details=true]` opens the map on a region. The id is
// validated before anything else happens: a value that is not a canonical
// UUID is logged and dropped, never forwarded to the region service.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::event::{RegionDetails, ViewEvent};
use crate::model::{CameraTarget, RegionFeature, RegionId};
use crate::source::RegionSource;
use crate::viewport::ViewportController;

/// A validated deep-link request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLinkRequest {
    pub region: RegionId,
    pub details: bool,
}

impl DeepLinkRequest {
    /// Parse a query string (leading `?` optional).
    ///
    /// `Ok(None)` when there is no `region` parameter.
    pub fn parse(query: &str) -> Result<Option<Self>, CoreError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut region = None;
        let mut details = false;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "region" if region.is_none() => region = Some(value.into_owned()),
                "details" => details = value == "true",
                _ => {}
            }
        }

        let Some(raw) = region else {
            return Ok(None);
        };
        let region = RegionId::parse(&raw)?;
        Ok(Some(Self { region, details }))
    }
}

/// Resolves deep links into camera moves and detail-view requests.
#[derive(Clone)]
pub struct DeepLink {
    source: Arc<dyn RegionSource>,
    viewport: ViewportController,
    events: mpsc::Sender<ViewEvent>,
    zoom: f64,
}

impl DeepLink {
    pub fn new(
        source: Arc<dyn RegionSource>,
        viewport: ViewportController,
        events: mpsc::Sender<ViewEvent>,
        zoom: f64,
    ) -> Self {
        Self {
            source,
            viewport,
            events,
            zoom,
        }
    }

    /// Resolve `query`, fly to the region's centroid and, when asked,
    /// request the detail view. `None` when nothing was resolved.
    pub async fn resolve(&self, query: &str) -> Option<RegionFeature> {
        let request = match DeepLinkRequest::parse(query) {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("no region in deep link");
                return None;
            }
            Err(CoreError::InvalidRegionId { value }) => {
                warn!(
                    value = %value.escape_debug(),
                    "rejected deep-link region id, possible path traversal or injection"
                );
                return None;
            }
            Err(e) => {
                warn!(error = %e, "rejected deep link");
                return None;
            }
        };

        let region = match self.source.region(&request.region).await {
            Ok(region) => region,
            Err(e) => {
                warn!(region = %request.region, error = %e, "deep-link region lookup failed");
                return None;
            }
        };

        let Some(center) = region.ring.centroid() else {
            warn!(region = %region.id, "region has no geometry");
            return None;
        };
        let target = match CameraTarget::at(center, self.zoom) {
            Ok(target) => target,
            Err(e) => {
                warn!(region = %region.id, error = %e, "region centroid is off the map");
                return None;
            }
        };

        info!(region = %region.id, lat = target.lat, lon = target.lon, "opening deep link");
        self.viewport.fly_to_target(target);

        if request.details
            && self
                .events
                .send(ViewEvent::OpenDetails(RegionDetails::from(&region)))
                .await
                .is_err()
        {
            debug!("view closed before detail request");
        }

        Some(region)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use livemap_api::RegionQuery;

    use super::*;
    use crate::model::{LonLat, Overlay, RegionKind, Ring};
    use crate::source::RegionListing;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    /// Serves the unit square for `ID`; records every lookup.
    #[derive(Default)]
    struct Recording {
        lookups: Mutex<Vec<RegionId>>,
    }

    #[async_trait]
    impl RegionSource for Recording {
        async fn overlay(&self) -> Result<Overlay, CoreError> {
            Ok(Overlay::default())
        }

        async fn region(&self, id: &RegionId) -> Result<RegionFeature, CoreError> {
            self.lookups.lock().unwrap().push(*id);
            if id.to_string() != ID {
                return Err(CoreError::RegionNotFound { id: id.to_string() });
            }
            Ok(RegionFeature {
                id: *id,
                kind: RegionKind::Plot,
                ring: Ring::new(vec![
                    LonLat::new(0.0, 0.0),
                    LonLat::new(0.0, 1.0),
                    LonLat::new(1.0, 1.0),
                    LonLat::new(1.0, 0.0),
                ]),
                owner_uuid: Some("069a79f4-44e9-4726-a5be-fca90e38aaf5".into()),
                owner_name: Some("Notch".into()),
                city: None,
                area: None,
                created_at: None,
            })
        }

        async fn list(&self, _query: &RegionQuery) -> Result<RegionListing, CoreError> {
            Ok(RegionListing::default())
        }

        async fn delete(&self, _id: &RegionId) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn deep_link() -> (DeepLink, Arc<Recording>, mpsc::Receiver<ViewEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let source = Arc::new(Recording::default());
        let link = DeepLink::new(
            Arc::clone(&source) as Arc<dyn RegionSource>,
            ViewportController::new(tx.clone()),
            tx,
            16.0,
        );
        (link, source, rx)
    }

    #[test]
    fn parse_variants() {
        assert_eq!(DeepLinkRequest::parse("").unwrap(), None);
        assert_eq!(DeepLinkRequest::parse("?foo=bar").unwrap(), None);

        let req = DeepLinkRequest::parse(&format!("?region={ID}&details=true"))
            .unwrap()
            .unwrap();
        assert!(req.details);
        assert_eq!(req.region.to_string(), ID);

        let req = DeepLinkRequest::parse(&format!("region={ID}&details=yes"))
            .unwrap()
            .unwrap();
        assert!(!req.details);
    }

    #[test]
    fn encoded_traversal_is_rejected() {
        for query in [
            "region=../etc/passwd",
            "region=..%2F..%2Fetc%2Fpasswd",
            "region=1234",
            "region=not-a-uuid",
            "region=",
        ] {
            assert!(
                matches!(
                    DeepLinkRequest::parse(query),
                    Err(CoreError::InvalidRegionId { .. })
                ),
                "{query}"
            );
        }
    }

    #[tokio::test]
    async fn resolves_and_flies_to_centroid() {
        let (link, _source, mut rx) = deep_link();

        let region = link.resolve(&format!("?region={ID}")).await.unwrap();
        assert_eq!(region.id.to_string(), ID);

        match rx.try_recv().unwrap() {
            ViewEvent::ViewportChange(target) => {
                assert!((target.lat - 0.5).abs() < 1e-9);
                assert!((target.lon - 0.5).abs() < 1e-9);
                assert!((target.zoom - 16.0).abs() < f64::EPSILON);
            }
            other => panic!("expected viewport change, got {other:?}"),
        }
        assert!(rx.try_recv().is_err(), "no detail view without details=true");
    }

    #[tokio::test]
    async fn details_follow_the_camera_move() {
        let (link, _source, mut rx) = deep_link();

        link.resolve(&format!("?region={ID}&details=true")).await.unwrap();

        assert!(matches!(rx.try_recv().unwrap(), ViewEvent::ViewportChange(_)));
        match rx.try_recv().unwrap() {
            ViewEvent::OpenDetails(details) => {
                assert_eq!(details.id.to_string(), ID);
                assert_eq!(details.owner_name.as_deref(), Some("Notch"));
                assert_eq!(
                    details.owner_uuid.as_deref(),
                    Some("069a79f4-44e9-4726-a5be-fca90e38aaf5")
                );
            }
            other => panic!("expected details, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn hostile_id_never_reaches_the_source() {
        let (link, source, mut rx) = deep_link();

        assert!(link.resolve("?region=../etc/passwd&details=true").await.is_none());
        assert!(source.lookups.lock().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_region_opens_nothing() {
        let (link, source, mut rx) = deep_link();

        let missing = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
        assert!(
            link.resolve(&format!("region={missing}&details=true"))
                .await
                .is_none()
        );
        assert_eq!(source.lookups.lock().unwrap().len(), 1);
        assert!(rx.try_recv().is_err(), "details only after successful resolution");
    }
}
