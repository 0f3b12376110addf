// Region service wire models
//
// Shapes returned by `/api/v1/region/*`. Field names mirror the server's
// camelCase JSON; conversion into domain types happens in livemap-core.

use serde::{Deserialize, Serialize};

/// One region as returned by `GET /api/v1/region/{id}` and the paged list.
///
/// `data` is a JSON-encoded array of `[lat, lon]` pairs -- latitude first,
/// unlike the GeoJSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRecord {
    pub id: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, rename = "userUUID")]
    pub user_uuid: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub region_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl RegionRecord {
    /// Decode the `data` field into its `[lat, lon]` points.
    pub fn lat_lon_points(&self) -> Result<Vec<[f64; 2]>, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

/// A page of regions from `GET /api/v1/region/all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionPage {
    #[serde(default)]
    pub data: Vec<RegionRecord>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Sort column for the paged region listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegionSort {
    #[default]
    Id,
    City,
    Area,
    Username,
    CreatedAt,
}

impl RegionSort {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::City => "city",
            Self::Area => "area",
            Self::Username => "username",
            Self::CreatedAt => "createdAt",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Paging/sorting parameters for [`RegionClient::list_regions`](super::RegionClient::list_regions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionQuery {
    /// 1-based page number.
    pub page: u32,
    pub size: u32,
    pub sort: RegionSort,
    pub direction: SortDirection,
}

impl Default for RegionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 25,
            sort: RegionSort::default(),
            direction: SortDirection::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_points_are_decoded_from_string() {
        let record: RegionRecord = serde_json::from_value(serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "data": "[[48.1, 11.5], [48.2, 11.5], [48.2, 11.6]]",
            "userUUID": "u-1",
            "username": "alice"
        }))
        .unwrap();

        let points = record.lat_lon_points().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], [48.1, 11.5]);
        assert_eq!(record.user_uuid.as_deref(), Some("u-1"));
    }

    #[test]
    fn sort_params_match_server_columns() {
        assert_eq!(RegionSort::CreatedAt.as_param(), "createdAt");
        assert_eq!(SortDirection::Desc.as_param(), "desc");
        assert_eq!(RegionQuery::default().page, 1);
    }
}
