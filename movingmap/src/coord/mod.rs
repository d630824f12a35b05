//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates and fractional Web
//! Mercator tile coordinates used by slippy-map tile servers.
//!
//! # Units
//!
//! Every angle in this module is in **radians**. The telemetry feed already
//! delivers radians, so no degree conversion happens here; callers holding
//! degrees (command-line arguments, display strings) must convert at their
//! own boundary with [`f64::to_radians`].

mod types;

pub use types::FractionalTile;

use std::f64::consts::PI;

/// Web Mercator latitude limit in radians (≈ 85.0511°). Rows 0 and `2^z`
/// fall exactly on ±this value.
pub const MAX_LATITUDE: f64 = 1.484_422_229_745_332;

/// Number of tiles along one axis of the grid at `zoom`.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> f64 {
    2.0_f64.powi(zoom as i32)
}

/// Converts a longitude to a fractional tile column.
///
/// # Arguments
///
/// * `lon` - Longitude in radians (-π to π)
/// * `zoom` - Zoom level
#[inline]
pub fn lon_to_fractional_tile_x(lon: f64, zoom: u8) -> f64 {
    (1.0 + lon / PI) / 2.0 * tiles_per_axis(zoom)
}

/// Converts a latitude to a fractional tile row.
///
/// Uses the inverse Gudermannian `ln(tan(φ) + sec(φ))`. Rows grow southward.
///
/// # Arguments
///
/// * `lat` - Latitude in radians (within the Web Mercator band)
/// * `zoom` - Zoom level
#[inline]
pub fn lat_to_fractional_tile_y(lat: f64, zoom: u8) -> f64 {
    (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * tiles_per_axis(zoom)
}

/// Converts fractional tile coordinates back to geographic coordinates.
///
/// Returns `(longitude, latitude)` in radians. Only used for display; cache
/// keys are always derived from the forward mapping.
#[inline]
pub fn tile_to_lon_lat(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = tiles_per_axis(zoom);
    let lon = x / n * 2.0 * PI - PI;
    let lat = (PI - 2.0 * PI * y / n).sinh().atan();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_origin_maps_to_grid_centre() {
        assert_eq!(lon_to_fractional_tile_x(0.0, 1), 1.0);
        assert!((lat_to_fractional_tile_y(0.0, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_antimeridian_edges() {
        assert_eq!(lon_to_fractional_tile_x(-PI, 13), 0.0);
        assert_eq!(lon_to_fractional_tile_x(PI, 13), 8192.0);
    }

    #[test]
    fn test_mercator_limit_maps_to_top_and_bottom() {
        assert!(lat_to_fractional_tile_y(MAX_LATITUDE, 5).abs() < 1e-6);
        assert!((lat_to_fractional_tile_y(-MAX_LATITUDE, 5) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_hamburg_at_zoom_13() {
        // Hamburg: 53.55°N, 9.99°E
        let x = lon_to_fractional_tile_x(9.99_f64.to_radians(), 13);
        let y = lat_to_fractional_tile_y(53.55_f64.to_radians(), 13);

        assert_eq!(x.floor() as i32, 4323);
        assert_eq!(y.floor() as i32, 2647);
    }

    #[test]
    fn test_latitude_is_consumed_as_radians() {
        // 0.5 taken as radians (~28.6°N) lands far north of 0.5 taken as degrees.
        let as_radians = lat_to_fractional_tile_y(0.5, 10);
        let as_degrees = lat_to_fractional_tile_y(0.5_f64.to_radians(), 10);

        assert!((as_degrees - 510.6).abs() < 0.1, "got {}", as_degrees);
        assert!((as_radians - 426.9).abs() < 0.1, "got {}", as_radians);
        assert!((as_radians - as_degrees).abs() > 80.0);
    }

    #[test]
    fn test_tile_to_lon_lat_northwest_corner() {
        let (lon, lat) = tile_to_lon_lat(0.0, 0.0, 3);
        assert!((lon + PI).abs() < 1e-12);
        assert!((lat - MAX_LATITUDE).abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_at_different_zooms() {
        let lat = 51.5074_f64.to_radians(); // London
        let lon = -0.1278_f64.to_radians();

        for zoom in [0, 5, 10, 13, 19] {
            let x = lon_to_fractional_tile_x(lon, zoom);
            let y = lat_to_fractional_tile_y(lat, zoom);
            let (lon2, lat2) = tile_to_lon_lat(x, y, zoom);

            assert!((lon2 - lon).abs() < 1e-9, "zoom {}: lon drift", zoom);
            assert!((lat2 - lat).abs() < 1e-9, "zoom {}: lat drift", zoom);
        }
    }

    proptest! {
        #[test]
        fn prop_forward_then_inverse_roundtrips(
            lon in -3.1_f64..3.1,
            lat in -1.48_f64..1.48,
            zoom in 0u8..=20,
        ) {
            let x = lon_to_fractional_tile_x(lon, zoom);
            let y = lat_to_fractional_tile_y(lat, zoom);
            let (lon2, lat2) = tile_to_lon_lat(x, y, zoom);

            prop_assert!((lon2 - lon).abs() < 1e-9);
            prop_assert!((lat2 - lat).abs() < 1e-9);
        }

        #[test]
        fn prop_columns_stay_inside_grid(lon in -3.1_f64..3.1, zoom in 0u8..=20) {
            let x = lon_to_fractional_tile_x(lon, zoom);
            prop_assert!(x >= 0.0 && x < tiles_per_axis(zoom));
        }
    }
}
