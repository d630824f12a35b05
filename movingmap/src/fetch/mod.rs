//! Background tile fetching.
//!
//! The coordinator turns "this tile is missing" into at most one download
//! per key, run as a tokio task so the render loop never waits on the
//! network.

mod coordinator;
mod error;
mod limiter;

pub use coordinator::{FetchConfig, FetchCoordinator, RequestOutcome};
pub use error::FetchError;
pub use limiter::{FetchLimiter, FetchPermit};
