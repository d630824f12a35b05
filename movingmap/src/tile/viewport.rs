//! Per-frame tile planning.
//!
//! Given the fractional tile under the screen centre, works out which tiles a
//! frame covers and where each one lands on screen. A margin of extra tiles
//! around the window keeps the edges filled while the map rotates with the
//! aircraft heading.

use crate::coord::FractionalTile;

use super::TileKey;

/// Lowest zoom level the map view allows.
pub const MIN_VIEW_ZOOM: u8 = 1;

/// Highest zoom level the map view allows.
pub const MAX_VIEW_ZOOM: u8 = 19;

/// Extra tiles added to each axis beyond what the window strictly needs.
const MARGIN_TILES: u32 = 3;

/// A tile scheduled for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleTile {
    /// Which tile to draw
    pub key: TileKey,
    /// Screen x of the tile's top-left corner, in pixels
    pub screen_x: i32,
    /// Screen y of the tile's top-left corner, in pixels
    pub screen_y: i32,
}

/// Window geometry used to plan a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Edge length of one tile in pixels
    pub tile_size: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            tile_size: 256,
        }
    }
}

impl Viewport {
    /// Creates a viewport with the standard 256 px tile size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Clamps a requested zoom level to the range the view supports.
    pub fn clamp_zoom(zoom: u8) -> u8 {
        zoom.clamp(MIN_VIEW_ZOOM, MAX_VIEW_ZOOM)
    }

    /// Tiles either side of the centre tile, as `(columns, rows)`.
    pub fn half_extent(&self) -> (i32, i32) {
        let tile_size = self.tile_size.max(1);
        let tiles_w = self.width / tile_size + MARGIN_TILES;
        let tiles_h = self.height / tile_size + MARGIN_TILES;
        ((tiles_w / 2) as i32, (tiles_h / 2) as i32)
    }

    /// Number of tiles [`Viewport::visible_tiles`] yields per frame.
    pub fn tile_count(&self) -> usize {
        let (half_w, half_h) = self.half_extent();
        ((2 * half_w + 1) * (2 * half_h + 1)) as usize
    }

    /// Plans every tile of a frame centred on `center`, row by row from the top.
    ///
    /// Keys are produced without bounds checks; near the grid edges some of
    /// them fall outside the grid and are ignored by the fetch path. Key
    /// arithmetic saturates, so a wild centre yields off-grid keys, never a
    /// wrap back onto the grid.
    pub fn visible_tiles(&self, center: FractionalTile) -> Vec<VisibleTile> {
        let (half_w, half_h) = self.half_extent();
        let center_key = center.key();
        let (frac_x, frac_y) = center.offset();
        let tile_size = self.tile_size as f64;

        let start_x = self.width as f64 / 2.0 - frac_x * tile_size;
        let start_y = self.height as f64 / 2.0 - frac_y * tile_size;

        let mut tiles = Vec::with_capacity(self.tile_count());
        for dy in -half_h..=half_h {
            for dx in -half_w..=half_w {
                tiles.push(VisibleTile {
                    key: TileKey::new(
                        center.zoom,
                        center_key.x.saturating_add(dx),
                        center_key.y.saturating_add(dy),
                    ),
                    screen_x: (start_x + dx as f64 * tile_size).round() as i32,
                    screen_y: (start_y + dy as f64 * tile_size).round() as i32,
                });
            }
        }
        tiles
    }
}

/// Screen rotation, in degrees, that puts the aircraft heading at the top.
pub fn heading_rotation_degrees(heading: f64) -> f64 {
    360.0 - heading.to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(x: f64, y: f64, zoom: u8) -> FractionalTile {
        FractionalTile { x, y, zoom }
    }

    #[test]
    fn test_default_window_plans_35_tiles() {
        let viewport = Viewport::default();
        assert_eq!(viewport.half_extent(), (3, 2));
        assert_eq!(viewport.tile_count(), 35);
        assert_eq!(viewport.visible_tiles(center(100.5, 200.5, 13)).len(), 35);
    }

    #[test]
    fn test_centre_tile_is_placed_at_window_centre() {
        let viewport = Viewport::default();
        let tiles = viewport.visible_tiles(center(4500.25, 3070.5, 13));

        let middle = tiles
            .iter()
            .find(|t| t.key == TileKey::new(13, 4500, 3070))
            .expect("centre tile planned");

        // 400 - 0.25 * 256 = 336, 300 - 0.5 * 256 = 172
        assert_eq!(middle.screen_x, 336);
        assert_eq!(middle.screen_y, 172);
    }

    #[test]
    fn test_neighbours_are_one_tile_apart() {
        let viewport = Viewport::default();
        let tiles = viewport.visible_tiles(center(10.0, 10.0, 5));

        assert_eq!(tiles[0].key, TileKey::new(5, 7, 8));
        assert_eq!(tiles[1].key, TileKey::new(5, 8, 8));
        assert_eq!(tiles[1].screen_x - tiles[0].screen_x, 256);
        assert_eq!(tiles.last().map(|t| t.key), Some(TileKey::new(5, 13, 12)));
    }

    #[test]
    fn test_edge_of_grid_produces_out_of_bounds_keys() {
        let viewport = Viewport::default();
        let tiles = viewport.visible_tiles(center(0.5, 0.5, 5));

        assert!(tiles.iter().any(|t| !t.key.is_valid()));
        assert!(tiles.iter().any(|t| t.key == TileKey::new(5, -1, 0)));
    }

    #[test]
    fn test_extreme_centre_saturates_off_grid() {
        let viewport = Viewport::default();
        let tiles = viewport.visible_tiles(center(1e300, -1e300, 13));

        assert_eq!(tiles.len(), 35);
        assert!(tiles.iter().all(|t| !t.key.is_valid()));
        assert!(tiles.iter().any(|t| t.key.x == i32::MAX && t.key.y == i32::MIN));
    }

    #[test]
    fn test_clamp_zoom() {
        assert_eq!(Viewport::clamp_zoom(0), 1);
        assert_eq!(Viewport::clamp_zoom(13), 13);
        assert_eq!(Viewport::clamp_zoom(25), 19);
    }

    #[test]
    fn test_heading_rotation() {
        assert_eq!(heading_rotation_degrees(0.0), 360.0);
        assert!((heading_rotation_degrees(std::f64::consts::FRAC_PI_2) - 270.0).abs() < 1e-9);
    }
}
