//! Coordinate type definitions

use std::fmt;

use crate::aircraft_position::CurrentPose;
use crate::tile::TileKey;

use super::{lat_to_fractional_tile_y, lon_to_fractional_tile_x, tile_to_lon_lat};

/// A real-valued position within the tile grid at a given zoom.
///
/// The integer part selects a tile, the fractional part is the sub-tile
/// offset used for smooth panning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalTile {
    /// Column (east-west), 0 at the antimeridian
    pub x: f64,
    /// Row (north-south), 0 at the northern Mercator limit
    pub y: f64,
    /// Zoom level
    pub zoom: u8,
}

impl FractionalTile {
    /// Creates a fractional tile position from longitude/latitude in radians.
    pub fn from_lon_lat(lon: f64, lat: f64, zoom: u8) -> Self {
        Self {
            x: lon_to_fractional_tile_x(lon, zoom),
            y: lat_to_fractional_tile_y(lat, zoom),
            zoom,
        }
    }

    /// Creates the fractional tile position under the aircraft.
    pub fn from_pose(pose: &CurrentPose, zoom: u8) -> Self {
        Self::from_lon_lat(pose.longitude, pose.latitude, zoom)
    }

    /// The tile containing this position.
    pub fn key(&self) -> TileKey {
        TileKey::new(self.zoom, self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Offset within the containing tile, each component in `[0, 1)`.
    pub fn offset(&self) -> (f64, f64) {
        (self.x - self.x.floor(), self.y - self.y.floor())
    }

    /// Converts back to `(longitude, latitude)` in radians.
    pub fn to_lon_lat(&self) -> (f64, f64) {
        tile_to_lon_lat(self.x, self.y, self.zoom)
    }
}

impl fmt::Display for FractionalTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:.4}/{:.4}", self.zoom, self.x, self.y)
    }
}
