//! On-disk tile store.
//!
//! Tiles live at `{root}/{zoom}/{x}/{y}.png`. The presence of the file is the
//! whole cache entry: there is no index, no metadata and no expiry. A tile on
//! disk is never revalidated.
//!
//! Writers never expose a partial file under the canonical name. Bytes go to
//! `{y}.png.part` first and are renamed into place once complete, so
//! [`DiskCache::exists`] only ever answers true for a whole tile.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::tile::TileKey;

/// Default cache root, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "tilecache";

const PART_EXTENSION: &str = "png.part";

/// Errors raised by disk cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Creating the `{root}/{zoom}/{x}` directory failed.
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Writing tile bytes failed.
    #[error("Failed to write tile {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Reading tile bytes failed.
    #[error("Failed to read tile {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Moving the completed part file into place failed.
    #[error("Failed to commit tile {path}: {source}")]
    CommitFailed { path: PathBuf, source: io::Error },
}

/// Tile store rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `root`. Nothing is created until a tile is written.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path of a tile: `{root}/{zoom}/{x}/{y}.png`.
    pub fn path(&self, key: &TileKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    fn part_path(&self, key: &TileKey) -> PathBuf {
        self.path(key).with_extension(PART_EXTENSION)
    }

    /// Returns true if the tile file is present.
    ///
    /// Content is not inspected: an empty or corrupt file still counts.
    pub fn exists(&self, key: &TileKey) -> bool {
        self.path(key).is_file()
    }

    /// Creates `{root}/{zoom}/{x}` if missing. Safe to call repeatedly.
    pub fn ensure_directories(&self, key: &TileKey) -> Result<PathBuf, CacheError> {
        let dir = self
            .root
            .join(key.zoom.to_string())
            .join(key.x.to_string());
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDirFailed {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Reads a tile's bytes.
    pub fn read(&self, key: &TileKey) -> Result<Vec<u8>, CacheError> {
        let path = self.path(key);
        std::fs::read(&path).map_err(|source| CacheError::ReadFailed { path, source })
    }

    /// Stores a complete tile.
    ///
    /// On failure no file is left at either the part or the canonical path.
    pub fn write(&self, key: &TileKey, bytes: &[u8]) -> Result<(), CacheError> {
        self.ensure_directories(key)?;
        let part = self.part_path(key);
        let path = self.path(key);

        if let Err(source) = std::fs::write(&part, bytes) {
            let _ = std::fs::remove_file(&part);
            return Err(CacheError::WriteFailed { path: part, source });
        }

        if let Err(source) = std::fs::rename(&part, &path) {
            let _ = std::fs::remove_file(&part);
            return Err(CacheError::CommitFailed { path, source });
        }

        debug!(tile = %key, bytes = bytes.len(), "Tile written to disk cache");
        Ok(())
    }

    /// Deletes a tile. A missing file is not an error.
    pub fn remove(&self, key: &TileKey) -> Result<bool, CacheError> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::WriteFailed { path, source }),
        }
    }

    /// Opens a streaming writer for a tile.
    ///
    /// The directories are created first. The writer's part file is removed if
    /// it is dropped before [`TileWriter::finish`] succeeds.
    pub async fn create_writer(&self, key: &TileKey) -> Result<TileWriter, CacheError> {
        let dir = self
            .root
            .join(key.zoom.to_string())
            .join(key.x.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| CacheError::CreateDirFailed { path: dir, source })?;

        let part = self.part_path(key);
        let file = File::create(&part)
            .await
            .map_err(|source| CacheError::WriteFailed {
                path: part.clone(),
                source,
            })?;

        Ok(TileWriter {
            writer: BufWriter::new(file),
            part: Some(part),
            target: self.path(key),
            written: 0,
        })
    }
}

/// Streaming writer for one tile download.
pub struct TileWriter {
    writer: BufWriter<File>,
    part: Option<PathBuf>,
    target: PathBuf,
    written: u64,
}

impl TileWriter {
    /// Appends a chunk of the tile body.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CacheError> {
        self.writer
            .write_all(chunk)
            .await
            .map_err(|source| CacheError::WriteFailed {
                path: self.target.clone(),
                source,
            })?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flushes the body and renames it onto the canonical tile path.
    ///
    /// Returns the tile size in bytes.
    pub async fn finish(mut self) -> Result<u64, CacheError> {
        self.writer
            .flush()
            .await
            .map_err(|source| CacheError::WriteFailed {
                path: self.target.clone(),
                source,
            })?;
        self.writer
            .get_mut()
            .sync_all()
            .await
            .map_err(|source| CacheError::WriteFailed {
                path: self.target.clone(),
                source,
            })?;

        let Some(part) = self.part.take() else {
            return Ok(self.written);
        };
        if let Err(source) = tokio::fs::rename(&part, &self.target).await {
            self.part = Some(part);
            return Err(CacheError::CommitFailed {
                path: self.target.clone(),
                source,
            });
        }
        Ok(self.written)
    }
}

impl Drop for TileWriter {
    fn drop(&mut self) {
        if let Some(part) = self.part.take() {
            if let Err(e) = std::fs::remove_file(&part) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %part.display(), error = %e, "Failed to remove partial tile");
                }
            }
        }
    }
}
