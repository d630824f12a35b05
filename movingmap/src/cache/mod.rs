//! Tile storage.
//!
//! Three layers, from slowest to fastest:
//!
//! - [`DiskCache`]: PNG files persisted across runs
//! - [`InFlightRegistry`]: keys whose download is under way
//! - [`TextureRegistry`]: decoded tiles ready to draw

mod disk;
mod in_flight;
mod texture;

pub use disk::{CacheError, DiskCache, TileWriter, DEFAULT_CACHE_DIR};
pub use in_flight::{InFlightGuard, InFlightRegistry};
pub use texture::{
    CorruptTilePolicy, RasterUploader, TextureEntry, TextureError, TextureRegistry,
    TextureUploader,
};
