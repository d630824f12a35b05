//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`locate`] - Show the tile under a position and whether it is cached
//! - [`prefetch`] - Download the tiles around a position
//! - [`follow`] - Headless moving map driven by live telemetry

pub mod common;
pub mod follow;
pub mod locate;
pub mod prefetch;
