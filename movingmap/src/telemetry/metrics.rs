//! Lock-free atomic metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::TileMetricsSnapshot;

/// Counters for the tile engine.
///
/// All operations use `Relaxed` ordering. The counters are independent
/// measurements and no reader relies on ordering between them.
#[derive(Debug)]
pub struct TileMetrics {
    start_time: Instant,

    // === Request path ===
    /// Calls to request_tile
    requests: AtomicU64,
    /// Requests ignored because the key is outside the grid
    out_of_bounds: AtomicU64,
    /// Requests answered by a file already on disk
    disk_hits: AtomicU64,
    /// Requests dropped because the key was already being fetched
    deduplicated: AtomicU64,

    // === Workers ===
    /// Workers spawned
    fetches_spawned: AtomicU64,
    /// Tiles written to disk
    fetches_completed: AtomicU64,
    /// Workers that gave up
    fetches_failed: AtomicU64,
    /// Body bytes written to disk
    bytes_downloaded: AtomicU64,

    // === Textures ===
    /// Tiles decoded and uploaded
    textures_loaded: AtomicU64,
    /// Cached files that failed to decode or upload
    decode_failures: AtomicU64,
}

impl TileMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            requests: AtomicU64::new(0),
            out_of_bounds: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            deduplicated: AtomicU64::new(0),
            fetches_spawned: AtomicU64::new(0),
            fetches_completed: AtomicU64::new(0),
            fetches_failed: AtomicU64::new(0),
            bytes_downloaded: AtomicU64::new(0),
            textures_loaded: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
        }
    }

    // === Request path ===

    /// Record a call to request_tile.
    pub fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request for a key outside the grid.
    pub fn out_of_bounds(&self) {
        self.out_of_bounds.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request satisfied by the disk cache.
    pub fn disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request for a key already in flight.
    pub fn deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    // === Workers ===

    /// Record a worker being spawned.
    pub fn fetch_spawned(&self) {
        self.fetches_spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tile successfully written to disk.
    pub fn fetch_completed(&self, bytes: u64) {
        self.fetches_completed.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed fetch.
    pub fn fetch_failed(&self) {
        self.fetches_failed.fetch_add(1, Ordering::Relaxed);
    }

    // === Textures ===

    /// Record a texture loaded into the registry.
    pub fn texture_loaded(&self) {
        self.textures_loaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cached tile that could not be turned into a texture.
    pub fn decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of every counter.
    pub fn snapshot(&self) -> TileMetricsSnapshot {
        let fetches_spawned = self.fetches_spawned.load(Ordering::Relaxed);
        let fetches_completed = self.fetches_completed.load(Ordering::Relaxed);
        let fetches_failed = self.fetches_failed.load(Ordering::Relaxed);

        TileMetricsSnapshot {
            uptime: self.start_time.elapsed(),
            requests: self.requests.load(Ordering::Relaxed),
            out_of_bounds: self.out_of_bounds.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            fetches_spawned,
            fetches_completed,
            fetches_failed,
            fetches_active: fetches_spawned.saturating_sub(fetches_completed + fetches_failed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            textures_loaded: self.textures_loaded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TileMetrics {
    fn default() -> Self {
        Self::new()
    }
}
