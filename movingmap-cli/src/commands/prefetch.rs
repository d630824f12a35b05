//! Prefetch command - download the tiles around a position.

use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use movingmap::coord::FractionalTile;
use movingmap::fetch::RequestOutcome;
use movingmap::tile::TileKey;

use super::common::{resolve_zoom, PositionArgs};
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Largest accepted radius, in tiles.
const MAX_RADIUS: u32 = 16;

/// Arguments for the prefetch command.
#[derive(Debug, Clone, Args)]
pub struct PrefetchArgs {
    #[command(flatten)]
    pub position: PositionArgs,

    /// Zoom level (default: [view] zoom from config.ini)
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Tiles either side of the centre tile
    #[arg(long, default_value = "2")]
    pub radius: u32,
}

/// Tally of request outcomes for the square.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RequestTally {
    spawned: u64,
    cached: u64,
    skipped: u64,
}

impl RequestTally {
    fn record(&mut self, outcome: RequestOutcome) {
        match outcome {
            RequestOutcome::Spawned => self.spawned += 1,
            RequestOutcome::Cached => self.cached += 1,
            RequestOutcome::OutOfBounds
            | RequestOutcome::AlreadyInFlight
            | RequestOutcome::Closed => self.skipped += 1,
        }
    }
}

/// Every key of the `(2r+1)²` square centred on `center`, row by row.
fn square_around(center: TileKey, radius: i32) -> Vec<TileKey> {
    let mut keys = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            keys.push(TileKey::new(center.zoom, center.x + dx, center.y + dy));
        }
    }
    keys
}

fn progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");
    progress.set_style(style);
    progress
}

/// Run the prefetch command.
pub fn run(args: PrefetchArgs, options: &GlobalOptions) -> Result<(), CliError> {
    if args.radius > MAX_RADIUS {
        return Err(CliError::InvalidArgument(format!(
            "radius {} is larger than {}",
            args.radius, MAX_RADIUS
        )));
    }

    let runner = CliRunner::new(options)?;
    runner.log_startup("prefetch");

    let (lon, lat) = args.position.to_radians()?;
    let zoom = resolve_zoom(args.zoom, runner.config().view.zoom)?;
    let center = FractionalTile::from_lon_lat(lon, lat, zoom).key();
    let keys = square_around(center, args.radius as i32);

    println!(
        "Prefetching {} tiles around {} into {}",
        keys.len(),
        center,
        runner.config().cache.directory.display()
    );

    let service = runner.create_service()?;
    let mut tally = RequestTally::default();
    for key in &keys {
        tally.record(service.fetcher().request_tile(*key));
    }
    info!(
        spawned = tally.spawned,
        cached = tally.cached,
        skipped = tally.skipped,
        "Prefetch requests issued"
    );

    let progress = progress_bar(keys.len() as u64);
    progress.set_position(tally.cached + tally.skipped);

    runner.runtime().block_on(async {
        let drain = service.drain();
        tokio::pin!(drain);
        let mut tick = tokio::time::interval(Duration::from_millis(100));
        loop {
            tokio::select! {
                _ = &mut drain => break,
                _ = tick.tick() => {
                    let snapshot = service.metrics().snapshot();
                    let finished = snapshot.fetches_completed + snapshot.fetches_failed;
                    progress.set_position(tally.cached + tally.skipped + finished);
                    progress.set_message(format!("({} failed)", snapshot.fetches_failed));
                }
            }
        }
    });

    let snapshot = service.metrics().snapshot();
    progress.set_position(keys.len() as u64);
    progress.finish_with_message(format!("({} failed)", snapshot.fetches_failed));

    println!();
    println!("{}", snapshot);

    runner.runtime().block_on(service.shutdown());
    Ok(())
}
