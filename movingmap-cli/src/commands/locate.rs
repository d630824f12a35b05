//! Locate command - show the tile under a position.

use clap::Args;
use movingmap::cache::DiskCache;
use movingmap::config::MapConfig;
use movingmap::coord::FractionalTile;

use super::common::{resolve_zoom, PositionArgs};
use crate::error::CliError;

/// Arguments for the locate command.
#[derive(Debug, Clone, Args)]
pub struct LocateArgs {
    #[command(flatten)]
    pub position: PositionArgs,

    /// Zoom level (default: [view] zoom from config.ini)
    #[arg(long)]
    pub zoom: Option<u8>,
}

/// Run the locate command. Touches neither the network nor the log.
pub fn run(args: LocateArgs, config: &MapConfig) -> Result<(), CliError> {
    let (lon, lat) = args.position.to_radians()?;
    let zoom = resolve_zoom(args.zoom, config.view.zoom)?;

    let position = FractionalTile::from_lon_lat(lon, lat, zoom);
    let key = position.key();
    let (offset_x, offset_y) = position.offset();
    let disk = DiskCache::new(&config.cache.directory);

    println!(
        "Position:   {:.6}°, {:.6}° (zoom {})",
        args.position.lat, args.position.lon, zoom
    );
    println!("Tile:       {}", key);
    println!(
        "Fractional: x={:.4}, y={:.4} (offset {:.3}, {:.3})",
        position.x, position.y, offset_x, offset_y
    );
    println!("Cache path: {}", disk.path(&key).display());
    println!("URL:        {}", key.url(&config.source.host));
    println!(
        "Cached:     {}",
        if disk.exists(&key) { "yes" } else { "no" }
    );

    Ok(())
}
