//! Renderer-facing tile service.
//!
//! [`TileService`] is the single entry point the render loop uses: for each
//! visible tile, once per frame, ask for it and either draw it or draw a
//! placeholder.

mod error;
mod facade;

pub use error::ServiceError;
pub use facade::{DisplayState, FrameReport, TileService};
