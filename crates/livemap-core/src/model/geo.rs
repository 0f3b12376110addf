// ── Geometry primitives ──

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Deepest zoom the camera accepts.
pub const MAX_ZOOM: f64 = 24.0;

/// Area below which a ring is treated as degenerate (collinear or a point).
const DEGENERATE_AREA: f64 = 1e-12;

/// A coordinate in GeoJSON axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// From a `[lon, lat]` wire pair.
    pub fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }

    /// From a `[lat, lon]` wire pair.
    pub fn from_lat_lon(pair: [f64; 2]) -> Self {
        Self::new(pair[1], pair[0])
    }
}

/// The outer boundary of a region polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ring(Vec<LonLat>);

impl Ring {
    pub fn new(points: Vec<LonLat>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[LonLat] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First point equals last point.
    pub fn is_closed(&self) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => self.0.len() > 1 && first == last,
            _ => false,
        }
    }

    /// Append the first point if the ring is open. No-op on empty or closed rings.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        if let Some(&first) = self.0.first() {
            self.0.push(first);
        }
    }

    /// Consuming variant of [`close`](Self::close).
    pub fn closed(mut self) -> Self {
        self.close();
        self
    }

    /// Area-weighted centre of mass, closing the ring first.
    ///
    /// Degenerate rings fall back to the mean of their distinct vertices.
    /// `None` only for an empty ring.
    pub fn centroid(&self) -> Option<LonLat> {
        let ring = self.clone().closed();
        let points = ring.points();
        let origin = *points.first()?;

        let distinct = &points[..points.len().saturating_sub(1).max(1)];
        #[allow(clippy::cast_precision_loss)]
        let count = distinct.len() as f64;
        let mean = LonLat::new(
            distinct.iter().map(|p| p.lon).sum::<f64>() / count,
            distinct.iter().map(|p| p.lat).sum::<f64>() / count,
        );

        // Shoelace relative to the first vertex to keep magnitudes small.
        let mut twice_area = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for (a, b) in points.iter().zip(points.iter().skip(1)) {
            let (x0, y0) = (a.lon - origin.lon, a.lat - origin.lat);
            let (x1, y1) = (b.lon - origin.lon, b.lat - origin.lat);
            let cross = x0 * y1 - x1 * y0;
            twice_area += cross;
            cx += (x0 + x1) * cross;
            cy += (y0 + y1) * cross;
        }

        if twice_area.abs() < DEGENERATE_AREA {
            return Some(mean);
        }

        let factor = 1.0 / (3.0 * twice_area);
        Some(LonLat::new(origin.lon + cx * factor, origin.lat + cy * factor))
    }
}

/// A validated camera destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTarget {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

impl CameraTarget {
    pub fn new(lat: f64, lon: f64, zoom: f64) -> Result<Self, CoreError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::ValidationFailed {
                message: format!("latitude {lat} outside [-90, 90]"),
            });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::ValidationFailed {
                message: format!("longitude {lon} outside [-180, 180]"),
            });
        }
        if !zoom.is_finite() || !(0.0..=MAX_ZOOM).contains(&zoom) {
            return Err(CoreError::ValidationFailed {
                message: format!("zoom {zoom} outside [0, {MAX_ZOOM}]"),
            });
        }
        Ok(Self { lat, lon, zoom })
    }

    pub fn at(point: LonLat, zoom: f64) -> Result<Self, CoreError> {
        Self::new(point.lat, point.lon, zoom)
    }
}

/// Render a coordinate the way the search box accepts it: `"lat, lon"`.
pub fn format_coordinates(lat: f64, lon: f64) -> String {
    format!("{lat}, {lon}")
}
