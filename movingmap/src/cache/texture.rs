//! Decoded, render-ready tiles.
//!
//! The registry maps a [`TileKey`] to the handle produced by a
//! [`TextureUploader`]. Entries are created at most once per key and live
//! until evicted by the optional capacity bound or until [`TextureRegistry::clear`].
//!
//! Uploading happens on the thread that owns the graphics context, so
//! [`TextureRegistry::load_if_present`] is only called from the render thread.
//! Lookups are safe from anywhere.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use image::RgbaImage;
use moka::sync::Cache;
use tracing::{debug, warn};

use super::disk::{CacheError, DiskCache};
use crate::tile::TileKey;

/// What to do with a cached file that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptTilePolicy {
    /// Leave the file in place. The tile stays unavailable until the file is
    /// removed by hand.
    #[default]
    Keep,
    /// Delete the file so the next frame fetches it again.
    Discard,
}

impl FromStr for CorruptTilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "discard" => Ok(Self::Discard),
            other => Err(format!("expected 'keep' or 'discard', got '{}'", other)),
        }
    }
}

impl fmt::Display for CorruptTilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Discard => write!(f, "discard"),
        }
    }
}

/// Errors that can occur while turning a cached file into a texture.
#[derive(Debug)]
pub enum TextureError {
    /// The cached file could not be read.
    Read(CacheError),
    /// The bytes are not a decodable image.
    Decode { key: TileKey, reason: String },
    /// The uploader rejected the image.
    Upload { key: TileKey, reason: String },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Read(e) => write!(f, "{}", e),
            TextureError::Decode { key, reason } => {
                write!(f, "Failed to decode tile {}: {}", key, reason)
            }
            TextureError::Upload { key, reason } => {
                write!(f, "Failed to upload tile {}: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Read(e) => Some(e),
            _ => None,
        }
    }
}

/// Turns a decoded raster into a handle the renderer can draw.
///
/// Implementations typically wrap a GPU texture upload and must be called
/// on the thread that owns the graphics context.
pub trait TextureUploader {
    /// Render-ready handle stored in the registry.
    type Handle: Send + Sync + 'static;

    /// Uploads one decoded tile.
    fn upload(&self, key: TileKey, image: RgbaImage) -> Result<Self::Handle, TextureError>;
}

/// Uploader that keeps the decoded RGBA raster as the handle.
///
/// Used by headless front ends and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterUploader;

impl TextureUploader for RasterUploader {
    type Handle = RgbaImage;

    fn upload(&self, _key: TileKey, image: RgbaImage) -> Result<RgbaImage, TextureError> {
        Ok(image)
    }
}

/// A loaded tile.
#[derive(Debug)]
pub struct TextureEntry<H> {
    /// Which tile this is
    pub key: TileKey,
    /// Shared render handle
    pub handle: Arc<H>,
}

impl<H> Clone for TextureEntry<H> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            handle: Arc::clone(&self.handle),
        }
    }
}

/// Map from tile key to loaded texture.
pub struct TextureRegistry<H> {
    cache: Cache<TileKey, Arc<H>>,
    capacity: Option<u64>,
    policy: CorruptTilePolicy,
}

impl<H: Send + Sync + 'static> TextureRegistry<H> {
    /// Creates a registry.
    ///
    /// `capacity` bounds the number of entries; `None` keeps every texture
    /// for the life of the registry.
    pub fn new(capacity: Option<u64>, policy: CorruptTilePolicy) -> Self {
        let mut builder = Cache::builder();
        if let Some(max) = capacity {
            builder = builder.max_capacity(max);
        }
        Self {
            cache: builder.build(),
            capacity,
            policy,
        }
    }

    /// Unbounded registry that keeps corrupt files.
    pub fn unbounded() -> Self {
        Self::new(None, CorruptTilePolicy::Keep)
    }

    /// Configured entry bound, if any.
    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    /// Configured corrupt tile policy.
    pub fn policy(&self) -> CorruptTilePolicy {
        self.policy
    }

    /// Returns the texture for `key` if it has been loaded.
    pub fn lookup(&self, key: &TileKey) -> Option<TextureEntry<H>> {
        self.cache.get(key).map(|handle| TextureEntry { key: *key, handle })
    }

    /// Loads `key` from disk if it is not already registered.
    ///
    /// Returns `Ok(None)` when the tile is not on disk. A decode or upload
    /// failure is returned as an error and nothing is registered.
    pub fn load<U>(
        &self,
        key: &TileKey,
        disk: &DiskCache,
        uploader: &U,
    ) -> Result<Option<TextureEntry<H>>, TextureError>
    where
        U: TextureUploader<Handle = H>,
    {
        if let Some(entry) = self.lookup(key) {
            return Ok(Some(entry));
        }
        if !disk.exists(key) {
            return Ok(None);
        }

        let bytes = disk.read(key).map_err(TextureError::Read)?;
        let image = match image::load_from_memory(&bytes) {
            Ok(decoded) => decoded.to_rgba8(),
            Err(e) => {
                self.apply_policy(key, disk);
                return Err(TextureError::Decode {
                    key: *key,
                    reason: e.to_string(),
                });
            }
        };

        let handle = Arc::new(uploader.upload(*key, image)?);
        self.cache.insert(*key, Arc::clone(&handle));
        debug!(tile = %key, "Texture loaded from disk cache");

        Ok(Some(TextureEntry { key: *key, handle }))
    }

    /// Like [`TextureRegistry::load`], but absorbs failures.
    ///
    /// A tile that cannot be loaded is logged and reported as absent.
    pub fn load_if_present<U>(
        &self,
        key: &TileKey,
        disk: &DiskCache,
        uploader: &U,
    ) -> Option<TextureEntry<H>>
    where
        U: TextureUploader<Handle = H>,
    {
        match self.load(key, disk, uploader) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(tile = %key, error = %e, "Tile unavailable");
                None
            }
        }
    }

    fn apply_policy(&self, key: &TileKey, disk: &DiskCache) {
        if self.policy != CorruptTilePolicy::Discard {
            return;
        }
        match disk.remove(key) {
            Ok(_) => debug!(tile = %key, "Discarded corrupt tile"),
            Err(e) => warn!(tile = %key, error = %e, "Failed to discard corrupt tile"),
        }
    }

    /// Number of registered textures.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Returns true if no texture is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every registered texture.
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }
}

impl<H> fmt::Debug for TextureRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureRegistry")
            .field("entries", &self.cache.entry_count())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}
