//! Common types and utilities shared across CLI commands.

use clap::Args;
use movingmap::tile::{MAX_VIEW_ZOOM, MIN_VIEW_ZOOM};

use crate::error::CliError;

/// Web Mercator latitude limit in degrees.
pub const MAX_LATITUDE_DEG: f64 = 85.051_128_78;

/// A position given on the command line, in decimal degrees.
#[derive(Debug, Clone, Args)]
pub struct PositionArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

impl PositionArgs {
    /// Validates the position and converts it to `(lon, lat)` in radians.
    ///
    /// Latitudes beyond the Mercator limit are rejected rather than clamped.
    pub fn to_radians(&self) -> Result<(f64, f64), CliError> {
        if !self.lat.is_finite() || self.lat.abs() > MAX_LATITUDE_DEG {
            return Err(CliError::InvalidArgument(format!(
                "latitude {} is outside ±{:.4}°",
                self.lat, MAX_LATITUDE_DEG
            )));
        }
        if !self.lon.is_finite() || self.lon.abs() > 180.0 {
            return Err(CliError::InvalidArgument(format!(
                "longitude {} is outside ±180°",
                self.lon
            )));
        }
        Ok((self.lon.to_radians(), self.lat.to_radians()))
    }
}

/// Resolves the zoom level: CLI takes precedence, then config.
pub fn resolve_zoom(cli_zoom: Option<u8>, config_zoom: u8) -> Result<u8, CliError> {
    match cli_zoom {
        Some(zoom) if !(MIN_VIEW_ZOOM..=MAX_VIEW_ZOOM).contains(&zoom) => {
            Err(CliError::InvalidArgument(format!(
                "zoom {} is outside {}..={}",
                zoom, MIN_VIEW_ZOOM, MAX_VIEW_ZOOM
            )))
        }
        Some(zoom) => Ok(zoom),
        None => Ok(config_zoom),
    }
}
