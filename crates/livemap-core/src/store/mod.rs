// ── View state stores ──

mod overlay;

pub use overlay::{OverlayReader, OverlayStore};
