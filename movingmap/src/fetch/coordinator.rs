//! Background tile download scheduling.
//!
//! [`FetchCoordinator::request_tile`] is called from the render thread and
//! returns immediately. It starts at most one worker per key; the worker
//! streams the tile into the disk cache and releases the key whatever the
//! outcome. Nothing is pushed back to the renderer: a later frame finds the
//! file on disk.

use std::sync::Arc;

use futures::StreamExt;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

use super::{FetchError, FetchLimiter};
use crate::cache::{DiskCache, InFlightGuard, InFlightRegistry};
use crate::provider::{AsyncHttpClient, DEFAULT_TILE_HOST};
use crate::telemetry::TileMetrics;
use crate::tile::TileKey;

/// What [`FetchCoordinator::request_tile`] did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The key lies outside the zoom grid and was ignored.
    OutOfBounds,
    /// The tile is already on disk.
    Cached,
    /// A worker for this key is already running or queued.
    AlreadyInFlight,
    /// A new worker was started.
    Spawned,
    /// The coordinator has been shut down.
    Closed,
}

impl RequestOutcome {
    /// Returns true if this call started a download.
    pub fn is_spawned(&self) -> bool {
        matches!(self, RequestOutcome::Spawned)
    }
}

/// Fetch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Tile server host name
    pub host: String,
    /// Limit on concurrent transfers, `None` for unbounded
    pub max_concurrent_fetches: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TILE_HOST.to_string(),
            max_concurrent_fetches: None,
        }
    }
}

/// Starts and supervises tile download workers.
pub struct FetchCoordinator<C> {
    client: Arc<C>,
    disk: DiskCache,
    in_flight: Arc<InFlightRegistry>,
    limiter: Option<Arc<FetchLimiter>>,
    host: Arc<str>,
    metrics: Arc<TileMetrics>,
    runtime: Handle,
    tracker: TaskTracker,
}

impl<C: AsyncHttpClient + 'static> FetchCoordinator<C> {
    /// Creates a coordinator that spawns workers on `runtime`.
    pub fn new(client: Arc<C>, disk: DiskCache, config: FetchConfig, runtime: Handle) -> Self {
        let limiter = config
            .max_concurrent_fetches
            .map(|max| Arc::new(FetchLimiter::new(max)));

        info!(
            host = %config.host,
            cache_dir = %disk.root().display(),
            max_concurrent = ?config.max_concurrent_fetches,
            "Fetch coordinator started"
        );

        Self {
            client,
            disk,
            in_flight: Arc::new(InFlightRegistry::new()),
            limiter,
            host: config.host.into(),
            metrics: Arc::new(TileMetrics::new()),
            runtime,
            tracker: TaskTracker::new(),
        }
    }

    /// Records into shared metrics instead of private ones.
    pub fn with_metrics(mut self, metrics: Arc<TileMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Ensures a download for `key` is under way unless the tile is already
    /// available or the key is invalid.
    ///
    /// Never blocks on the network and never fails. Checks run in order:
    /// bounds, disk, in-flight claim. Only a successful claim spawns a worker.
    pub fn request_tile(&self, key: TileKey) -> RequestOutcome {
        self.metrics.request();

        if !key.is_valid() {
            trace!(tile = %key, "Ignoring out-of-bounds tile");
            self.metrics.out_of_bounds();
            return RequestOutcome::OutOfBounds;
        }

        if self.disk.exists(&key) {
            self.metrics.disk_hit();
            return RequestOutcome::Cached;
        }

        if self.tracker.is_closed() {
            return RequestOutcome::Closed;
        }

        let Some(guard) = self.in_flight.begin(key) else {
            self.metrics.deduplicated();
            return RequestOutcome::AlreadyInFlight;
        };

        // A worker may have committed the file between the disk check and the claim.
        if self.disk.exists(&key) {
            self.metrics.disk_hit();
            return RequestOutcome::Cached;
        }

        let worker = Worker {
            client: Arc::clone(&self.client),
            disk: self.disk.clone(),
            limiter: self.limiter.clone(),
            url: key.url(&self.host),
            metrics: Arc::clone(&self.metrics),
        };

        debug!(tile = %key, "Spawning tile fetch");
        self.metrics.fetch_spawned();
        self.tracker.spawn_on(worker.run(guard), &self.runtime);

        RequestOutcome::Spawned
    }

    /// Number of keys with a worker running or queued.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns true if a worker for `key` is running or queued.
    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.in_flight.contains(key)
    }

    /// The disk cache workers write into.
    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }

    /// The concurrency limiter, if one is configured.
    pub fn limiter(&self) -> Option<&FetchLimiter> {
        self.limiter.as_deref()
    }

    /// Shared metrics.
    pub fn metrics(&self) -> &Arc<TileMetrics> {
        &self.metrics
    }

    /// Waits for every worker started so far. New requests are accepted
    /// again afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Stops accepting requests and waits for running workers to finish.
    ///
    /// Workers still queued on the concurrency limit give up without
    /// downloading; transfers that already hold a permit run to completion.
    pub async fn shutdown(&self) {
        self.tracker.close();
        if let Some(limiter) = &self.limiter {
            limiter.close();
        }
        info!(in_flight = self.in_flight.len(), "Waiting for tile fetches to finish");
        self.tracker.wait().await;
        info!("Fetch coordinator stopped");
    }
}

/// Everything a worker task owns.
struct Worker<C> {
    client: Arc<C>,
    disk: DiskCache,
    limiter: Option<Arc<FetchLimiter>>,
    url: String,
    metrics: Arc<TileMetrics>,
}

impl<C: AsyncHttpClient> Worker<C> {
    /// Fetches one tile. The in-flight key is released when `guard` drops at
    /// the end of this future, including on cancellation.
    async fn run(self, guard: InFlightGuard) {
        let key = guard.key();
        match self.fetch(key).await {
            Ok(bytes) => {
                self.metrics.fetch_completed(bytes);
                debug!(tile = %key, bytes, "Tile fetched");
            }
            Err(e) => {
                self.metrics.fetch_failed();
                warn!(tile = %key, url = %self.url, error = %e, "Tile fetch failed");
            }
        }
        drop(guard);
    }

    async fn fetch(&self, key: TileKey) -> Result<u64, FetchError> {
        let _permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire().await?),
            None => None,
        };

        let mut body = self.client.get_stream(&self.url).await?;
        let mut writer = self.disk.create_writer(&key).await?;

        while let Some(chunk) = body.next().await {
            writer.write_chunk(&chunk?).await?;
        }

        Ok(writer.finish().await?)
    }
}
