// livemap-core: view state between livemap-api and consumers (CLI, UI shells).

pub mod config;
pub mod controller;
pub mod convert;
pub mod deeplink;
pub mod error;
pub mod event;
pub mod model;
pub mod reconcile;
pub mod search;
pub mod source;
pub mod store;
pub mod stream;
pub mod viewport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{InitialView, MapViewConfig, SearchConfig, TlsVerification, ZoomConfig};
pub use controller::MapView;
pub use deeplink::{DeepLink, DeepLinkRequest};
pub use error::CoreError;
pub use event::{RegionDetails, ViewEvent};
pub use reconcile::MarkerReconciler;
pub use search::{HybridSearch, SearchHandle};
pub use source::{Geocoder, RegionListing, RegionSource};
pub use store::{OverlayReader, OverlayStore};
pub use stream::{PositionStream, StreamEvent};
pub use viewport::ViewportController;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    CameraTarget, ConnectionHealth, DisplayedMarker, EntityPosition, GeocodedPlace, LonLat,
    MarkerDelta, MarkerHandle, Overlay, PositionSnapshot, RegionFeature, RegionId, RegionKind,
    ResultSource, Ring, SearchResult, SearchResults, TriggerAction, format_coordinates,
};

// Wire-level types consumers need to build queries and feeds.
pub use livemap_api::{RegionQuery, RegionSort, ReconnectConfig, SocketEvent, SortDirection};
