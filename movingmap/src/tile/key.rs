//! Tile key type.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Highest zoom level a key can be valid at.
///
/// Keeps `2^zoom` within the positive `i32` range of the x/y indices.
pub const MAX_ZOOM: u8 = 30;

/// Errors raised when validating a tile key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileKeyError {
    /// Zoom exceeds [`MAX_ZOOM`].
    #[error("zoom {0} exceeds maximum of {max}", max = MAX_ZOOM)]
    InvalidZoom(u8),

    /// Column or row falls outside `[0, 2^zoom)`.
    #[error("tile {zoom}/{x}/{y} is outside the zoom {zoom} grid")]
    OutOfBounds { zoom: u8, x: i32, y: i32 },
}

/// Identity of one slippy-map tile.
///
/// Construction never fails: viewport arithmetic near the grid edges
/// legitimately produces negative or oversized indices, and those keys must
/// still flow into the fetch path where they are silently ignored. Use
/// [`TileKey::is_valid`] or [`TileKey::checked`] where validity matters.
///
/// # Example
///
/// ```
/// use movingmap::tile::TileKey;
///
/// let key = TileKey::new(13, 4500, 3070);
/// assert!(key.is_valid());
/// assert_eq!(key.to_string(), "13/4500/3070");
/// assert!(!TileKey::new(5, -1, 0).is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Zoom level
    pub zoom: u8,
    /// Column, 0 at the antimeridian, grows eastward
    pub x: i32,
    /// Row, 0 at the north, grows southward
    pub y: i32,
}

impl TileKey {
    /// Creates a key without validating it.
    #[inline]
    pub const fn new(zoom: u8, x: i32, y: i32) -> Self {
        Self { zoom, x, y }
    }

    /// Creates a key, rejecting anything outside the grid.
    pub fn checked(zoom: u8, x: i32, y: i32) -> Result<Self, TileKeyError> {
        if zoom > MAX_ZOOM {
            return Err(TileKeyError::InvalidZoom(zoom));
        }
        let key = Self::new(zoom, x, y);
        if !key.is_valid() {
            return Err(TileKeyError::OutOfBounds { zoom, x, y });
        }
        Ok(key)
    }

    /// Number of tiles along each axis at this key's zoom level.
    #[inline]
    pub fn grid_size(&self) -> i64 {
        1_i64 << self.zoom.min(MAX_ZOOM)
    }

    /// Returns true if `0 <= x < 2^zoom` and `0 <= y < 2^zoom`.
    #[inline]
    pub fn is_valid(&self) -> bool {
        if self.zoom > MAX_ZOOM {
            return false;
        }
        let max = self.grid_size();
        (0..max).contains(&(self.x as i64)) && (0..max).contains(&(self.y as i64))
    }

    /// Path of this tile relative to a cache root: `{zoom}/{x}/{y}.png`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.zoom.to_string())
            .join(self.x.to_string())
            .join(format!("{}.png", self.y))
    }

    /// Remote URL for this tile: `https://{host}/{zoom}/{x}/{y}.png`.
    pub fn url(&self, host: &str) -> String {
        format!("https://{}/{}/{}/{}.png", host, self.zoom, self.x, self.y)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}
