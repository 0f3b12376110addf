// Region service client modules
//
// Read, list, and delete endpoints of the region service, plus the wire
// models they return.

pub mod client;
pub mod models;

pub use client::RegionClient;
