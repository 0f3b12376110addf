// Coordinate-pair recognition for the search box.

use std::sync::LazyLock;

use regex_lite::Regex;

/// `lat,lon` with optional sign, decimals and a space after the comma.
/// Latitude is bounded to [-90, 90], longitude to [-180, 180].
static COORDINATE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[-+]?([1-8]?\d(\.\d+)?|90(\.0+)?),\s*[-+]?(180(\.0+)?|((1[0-7]\d)|([1-9]?\d))(\.\d+)?)$",
    )
    .expect("valid coordinate regex")
});

/// Parse `"lat,lon"` into `(lat, lon)`; `None` for anything else.
pub fn parse_coordinate_pair(query: &str) -> Option<(f64, f64)> {
    let query = query.trim();
    if !COORDINATE_PAIR.is_match(query) {
        return None;
    }
    let (lat, lon) = query.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}
