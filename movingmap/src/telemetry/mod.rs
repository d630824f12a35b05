//! Tile engine telemetry.
//!
//! Lock-free counters updated by the render thread and the fetch workers,
//! read out as a point-in-time snapshot for the CLI.
//!
//! ```text
//! TileService / workers ─────► TileMetrics ─────► TileMetricsSnapshot ─────► CLI
//!                          (atomic counters)     (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```
//! use movingmap::telemetry::TileMetrics;
//!
//! let metrics = TileMetrics::new();
//! metrics.fetch_spawned();
//! metrics.fetch_completed(18_000);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.fetches_completed, 1);
//! assert_eq!(snapshot.bytes_downloaded, 18_000);
//! ```

mod metrics;
mod snapshot;

pub use metrics::TileMetrics;
pub use snapshot::TileMetricsSnapshot;
