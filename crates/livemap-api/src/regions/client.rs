// Region service HTTP client
//
// Wraps `reqwest::Client` with `/api/v1/region` URL construction, bearer
// injection for privileged calls, and status-to-error mapping. Region ids
// are taken as `Uuid` so nothing but a validated identifier can ever be
// spliced into a request path.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::Error;
use crate::geojson::{FeatureCollection, RegionProperties};
use crate::regions::models::{RegionPage, RegionQuery, RegionRecord};
use crate::transport::{TransportConfig, error_for_status, parse_json};

/// HTTP client for the region read/delete service.
pub struct RegionClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl RegionClient {
    /// Create a new region client from a `TransportConfig`.
    ///
    /// `base_url` is the server root (e.g. `https://map.example.org`).
    /// `token` is attached as a bearer credential to privileged calls only.
    pub fn new(
        base_url: Url,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Create a region client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            token: None,
        })
    }

    /// Attach a bearer credential.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/v1/region/{path}`
    fn region_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/api/v1/region/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        );
        Ok(Url::parse(&full)?)
    }

    fn bearer(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let token = self
            .token
            .as_ref()
            .ok_or(Error::MissingToken { operation })?;
        Ok(request.bearer_auth(token.expose_secret()))
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Paged, sorted region listing.
    ///
    /// `GET /api/v1/region/all?page=&size=&sort=&direction=` (bearer)
    pub async fn list_regions(&self, query: &RegionQuery) -> Result<RegionPage, Error> {
        let url = self.region_url("all")?;
        debug!(page = query.page, size = query.size, "GET {}", url);

        let request = self.http.get(url).query(&[
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
            ("sort", query.sort.as_param().to_owned()),
            ("direction", query.direction.as_param().to_owned()),
        ]);
        let resp = self.bearer(request, "list regions")?.send().await?;
        parse_json(error_for_status(resp).await?).await
    }

    /// Fetch a single region.
    ///
    /// `GET /api/v1/region/{id}`
    pub async fn get_region(&self, id: &Uuid) -> Result<RegionRecord, Error> {
        let url = self.region_url(&id.to_string())?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        parse_json(error_for_status(resp).await?).await
    }

    /// Fetch every region as one GeoJSON collection.
    ///
    /// `GET /api/v1/region/all/geojson`
    pub async fn regions_geojson(&self) -> Result<FeatureCollection<RegionProperties>, Error> {
        let url = self.region_url("all/geojson")?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        parse_json(error_for_status(resp).await?).await
    }

    /// Delete a region.
    ///
    /// `DELETE /api/v1/region/{id}` (bearer)
    pub async fn delete_region(&self, id: &Uuid) -> Result<(), Error> {
        let url = self.region_url(&id.to_string())?;
        debug!("DELETE {}", url);

        let request = self.http.delete(url);
        let resp = self.bearer(request, "delete region")?.send().await?;
        error_for_status(resp).await?;
        Ok(())
    }
}
