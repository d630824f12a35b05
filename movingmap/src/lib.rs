//! movingmap - Slippy-map tile acquisition and caching for a live moving map
//!
//! This library provides the tile engine behind a scrolling, zoomable map that
//! follows an aircraft position supplied by an external telemetry feed. The
//! renderer asks the [`service::TileService`] for each visible tile once per
//! frame; the service answers from memory or disk, and schedules a background
//! download for anything missing without ever blocking the frame.
//!
//! # Architecture
//!
//! ```text
//! Renderer ──► TileService::resolve(key)
//!                 │
//!                 ├─► TextureRegistry   (decoded, render-ready handles)
//!                 ├─► DiskCache         ({root}/{z}/{x}/{y}.png)
//!                 └─► FetchCoordinator ─► InFlightRegistry (one fetch per key)
//!                                      └► tokio worker ─► HTTP ─► TileWriter
//! ```

pub mod aircraft_position;
pub mod cache;
pub mod config;
pub mod coord;
pub mod fetch;
pub mod logging;
pub mod provider;
pub mod service;
pub mod telemetry;
pub mod tile;

/// Fixed client identifier sent with every tile request.
pub const USER_AGENT: &str = concat!("movingmap/", env!("CARGO_PKG_VERSION"));
