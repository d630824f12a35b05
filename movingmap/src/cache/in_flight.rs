//! Set of tiles with a download in progress.
//!
//! A key is inserted before a worker is spawned and removed when the worker
//! finishes, whatever the outcome. The lock is held only for the insert or
//! remove itself, never across I/O.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::tile::TileKey;

/// Tracks which tiles are being fetched.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    keys: Mutex<HashSet<TileKey>>,
}

impl InFlightRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims `key`.
    ///
    /// Returns true if the key was absent and is now held by the caller,
    /// false if someone else already holds it.
    pub fn try_begin(&self, key: TileKey) -> bool {
        self.keys.lock().insert(key)
    }

    /// Releases `key`. Releasing a key that is not held does nothing.
    pub fn end(&self, key: &TileKey) {
        self.keys.lock().remove(key);
    }

    /// Claims `key` and returns a guard that releases it on drop.
    pub fn begin(self: &Arc<Self>, key: TileKey) -> Option<InFlightGuard> {
        self.try_begin(key).then(|| InFlightGuard {
            registry: Arc::clone(self),
            key,
        })
    }

    /// Returns true if `key` is currently held.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.keys.lock().contains(key)
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    /// Returns true if no fetch is in progress.
    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

/// Holds a claim on one key in an [`InFlightRegistry`].
///
/// The key is released when the guard is dropped, including when the owning
/// task panics or is cancelled.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    key: TileKey,
}

impl InFlightGuard {
    /// The claimed key.
    pub fn key(&self) -> TileKey {
        self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.end(&self.key);
    }
}
