//! Tile identity and per-frame tile planning.
//!
//! [`TileKey`] is the `(zoom, x, y)` triple used as the key of every cache in
//! the crate. [`Viewport`] computes which keys a frame needs.

mod key;
mod viewport;

pub use key::{TileKey, TileKeyError, MAX_ZOOM};
pub use viewport::{heading_rotation_degrees, Viewport, VisibleTile, MAX_VIEW_ZOOM, MIN_VIEW_ZOOM};
