// livemap-api: Async wire clients for the live map servers

pub mod error;
pub mod geocoder;
pub mod geojson;
pub mod regions;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use geocoder::{GeocoderClient, Place};
pub use regions::RegionClient;
pub use regions::models::{RegionPage, RegionQuery, RegionRecord, RegionSort, SortDirection};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ReconnectConfig, SocketEvent, SocketHandle};
