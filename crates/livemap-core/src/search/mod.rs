// ── Search ──

mod coords;
mod hybrid;
mod local;

pub use coords::parse_coordinate_pair;
pub use hybrid::{GO_TO_COORDINATES, HybridSearch, SearchHandle};
pub use local::search_overlay;
