//! Follow command - headless moving map driven by live telemetry.
//!
//! Runs the render loop without drawing: every frame resolves the tiles
//! around the aircraft, which keeps the cache warm along the flight path and
//! exercises the same code a graphical front end would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use tracing::{info, warn};

use movingmap::aircraft_position::{SharedPose, TelemetryClient};
use movingmap::coord::FractionalTile;
use movingmap::tile::heading_rotation_degrees;

use super::common::resolve_zoom;
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Target frame period (60 Hz).
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// How often a status line is logged.
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Arguments for the follow command.
#[derive(Debug, Clone, Args)]
pub struct FollowArgs {
    /// Telemetry server address (default: [telemetry] address from config.ini)
    #[arg(long)]
    pub address: Option<String>,

    /// Zoom level (default: [view] zoom from config.ini)
    #[arg(long)]
    pub zoom: Option<u8>,
}

/// Run the follow command until Ctrl+C or the feed closes.
pub fn run(args: FollowArgs, options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("follow");

    let zoom = resolve_zoom(args.zoom, runner.config().view.zoom)?;
    let address = args
        .address
        .unwrap_or_else(|| runner.config().telemetry.address.clone());
    let viewport = runner.config().viewport();

    println!("Connecting to telemetry at {}...", address);
    let client = runner.runtime().block_on(TelemetryClient::connect(&address))?;

    let pose = Arc::new(SharedPose::new());
    let feed = runner.runtime().spawn(client.run(Arc::clone(&pose)));
    let service = runner.create_service()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    println!(
        "Following aircraft at zoom {} ({} tiles per frame)",
        zoom,
        viewport.tile_count()
    );
    println!("Press Ctrl+C to exit");
    println!();

    let mut frames = 0u64;
    let mut last_status = Instant::now();
    let mut next_frame = Instant::now();

    while !shutdown.load(Ordering::SeqCst) && !feed.is_finished() {
        if pose.has_fix() {
            let current = pose.load();
            let tiles = viewport.visible_tiles(FractionalTile::from_pose(&current, zoom));
            let report = service.resolve_frame(&tiles);
            frames += 1;

            if last_status.elapsed() >= STATUS_INTERVAL {
                info!(
                    lat = current.latitude.to_degrees(),
                    lon = current.longitude.to_degrees(),
                    heading = current.heading_degrees(),
                    rotation = heading_rotation_degrees(current.heading),
                    frame = %report,
                    in_flight = service.fetcher().in_flight_count(),
                    textures = service.textures().len(),
                    "Frame status"
                );
                last_status = Instant::now();
            }
        } else if last_status.elapsed() >= STATUS_INTERVAL {
            info!(address = %address, "Waiting for first position");
            last_status = Instant::now();
        }

        next_frame += FRAME_INTERVAL;
        let now = Instant::now();
        if next_frame > now {
            std::thread::sleep(next_frame - now);
        } else {
            // Behind schedule; drop the backlog instead of bursting.
            next_frame = now;
        }
    }

    let feed_result = if feed.is_finished() {
        Some(runner.runtime().block_on(feed))
    } else {
        feed.abort();
        None
    };

    println!("Waiting for downloads to finish...");
    let metrics = Arc::clone(service.metrics());
    runner.runtime().block_on(service.shutdown());

    println!();
    println!("Session Summary ({} frames)", frames);
    println!("{}", metrics.snapshot());

    match feed_result {
        Some(Ok(Ok(published))) => {
            info!(published, "Telemetry feed closed");
            println!();
            println!("Telemetry feed closed after {} positions.", published);
            Ok(())
        }
        Some(Ok(Err(e))) => Err(e.into()),
        Some(Err(e)) => {
            warn!(error = %e, "Telemetry task ended abnormally");
            Ok(())
        }
        None => Ok(()),
    }
}
