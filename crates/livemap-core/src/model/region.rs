// ── Regions and the overlay ──

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::geo::Ring;
use crate::error::CoreError;

/// Canonical hyphenated UUID, nothing else. `Uuid::parse_str` alone also
/// accepts braced, URN and unhyphenated forms.
static REGION_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid region id regex")
});

/// A validated region identifier.
///
/// The only way to build one from text is [`RegionId::parse`], so a value
/// of this type is always safe to splice into a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(Uuid);

impl RegionId {
    /// Strict 8-4-4-4-12 hex validation.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        if !REGION_ID_PATTERN.is_match(value) {
            return Err(CoreError::InvalidRegionId {
                value: value.to_owned(),
            });
        }
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| CoreError::InvalidRegionId {
                value: value.to_owned(),
            })
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for RegionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for RegionId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Region category as carried by `regionType`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    #[default]
    Normal,
    Event,
    Plot,
    Other,
}

impl RegionKind {
    /// Missing values are `normal`; anything unrecognised is `other`.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            None => Self::Normal,
            Some(s) if s.trim().is_empty() => Self::Normal,
            Some(s) => s.trim().parse().unwrap_or(Self::Other),
        }
    }
}

/// One user-owned polygon on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFeature {
    pub id: RegionId,
    pub kind: RegionKind,
    /// Outer ring in (lon, lat) order. May arrive unclosed.
    pub ring: Ring,
    pub owner_uuid: Option<String>,
    pub owner_name: Option<String>,
    pub city: Option<String>,
    pub area: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl RegionFeature {
    /// Human label used in search results and tables.
    pub fn label(&self) -> String {
        match (&self.city, &self.owner_name) {
            (Some(city), _) if !city.is_empty() => city.clone(),
            (_, Some(owner)) if !owner.is_empty() => format!("Region of {owner}"),
            _ => self.id.to_string(),
        }
    }
}

/// The full region set. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    features: Vec<RegionFeature>,
    by_id: HashMap<RegionId, usize>,
}

impl Overlay {
    /// Build an overlay; later duplicates of an id replace earlier ones.
    pub fn new(features: Vec<RegionFeature>) -> Self {
        let mut deduped: Vec<RegionFeature> = Vec::with_capacity(features.len());
        let mut by_id = HashMap::with_capacity(features.len());
        for feature in features {
            if let Some(&idx) = by_id.get(&feature.id) {
                deduped[idx] = feature;
            } else {
                by_id.insert(feature.id, deduped.len());
                deduped.push(feature);
            }
        }
        Self {
            features: deduped,
            by_id,
        }
    }

    pub fn features(&self) -> &[RegionFeature] {
        &self.features
    }

    pub fn get(&self, id: &RegionId) -> Option<&RegionFeature> {
        self.by_id.get(id).and_then(|&idx| self.features.get(idx))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature counts per kind.
    pub fn count_by_kind(&self, kind: RegionKind) -> usize {
        self.features.iter().filter(|f| f.kind == kind).count()
    }
}
