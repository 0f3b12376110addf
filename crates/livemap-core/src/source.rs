// ── Data source seams ──
//
// The view talks to its collaborators through these traits so that the
// search and deep-link pipelines can run against in-memory fakes. The
// HTTP clients from livemap-api are the production implementations.

use async_trait::async_trait;
use livemap_api::{GeocoderClient, RegionClient, RegionQuery};

use crate::convert::{overlay_from_geojson, region_from_record};
use crate::error::CoreError;
use crate::model::{GeocodedPlace, Overlay, RegionFeature, RegionId};

/// One page of the administrative region listing.
#[derive(Debug, Clone, Default)]
pub struct RegionListing {
    pub regions: Vec<RegionFeature>,
    pub total_pages: u32,
    /// Records that failed validation and were left out.
    pub skipped: usize,
}

/// Authoritative region store.
#[async_trait]
pub trait RegionSource: Send + Sync {
    /// Every region, for the map overlay.
    async fn overlay(&self) -> Result<Overlay, CoreError>;

    /// One region by id.
    async fn region(&self, id: &RegionId) -> Result<RegionFeature, CoreError>;

    /// Paged listing (privileged).
    async fn list(&self, query: &RegionQuery) -> Result<RegionListing, CoreError>;

    /// Remove a region (privileged).
    async fn delete(&self, id: &RegionId) -> Result<(), CoreError>;
}

/// Free-text place lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, text: &str, limit: u32) -> Result<Vec<GeocodedPlace>, CoreError>;
}

#[async_trait]
impl RegionSource for RegionClient {
    async fn overlay(&self) -> Result<Overlay, CoreError> {
        let collection = self.regions_geojson().await?;
        Ok(overlay_from_geojson(collection))
    }

    async fn region(&self, id: &RegionId) -> Result<RegionFeature, CoreError> {
        let record = self
            .get_region(id.as_uuid())
            .await
            .map_err(|e| CoreError::from_region_lookup(e, &id.to_string()))?;
        region_from_record(record)
    }

    async fn list(&self, query: &RegionQuery) -> Result<RegionListing, CoreError> {
        let page = self.list_regions(query).await?;
        let total = page.data.len();
        let regions: Vec<RegionFeature> = page
            .data
            .into_iter()
            .filter_map(|record| match region_from_record(record) {
                Ok(region) => Some(region),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping region record");
                    None
                }
            })
            .collect();

        Ok(RegionListing {
            skipped: total - regions.len(),
            regions,
            total_pages: page.total_pages,
        })
    }

    async fn delete(&self, id: &RegionId) -> Result<(), CoreError> {
        self.delete_region(id.as_uuid())
            .await
            .map_err(|e| CoreError::from_region_lookup(e, &id.to_string()))
    }
}

#[async_trait]
impl Geocoder for GeocoderClient {
    async fn geocode(&self, text: &str, limit: u32) -> Result<Vec<GeocodedPlace>, CoreError> {
        let places = self.search(text, limit).await.map_err(|e| CoreError::Provider {
            message: e.to_string(),
        })?;
        Ok(places.into_iter().map(GeocodedPlace::from).collect())
    }
}
