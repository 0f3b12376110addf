// ── Live feeds ──

mod positions;

pub use positions::{POSITIONS_EVENT, PositionStream, StreamEvent};
