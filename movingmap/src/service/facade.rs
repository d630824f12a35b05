//! Tile service facade.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::ServiceError;
use crate::cache::{
    CorruptTilePolicy, DiskCache, TextureEntry, TextureError, TextureRegistry, TextureUploader,
};
use crate::config::MapConfig;
use crate::fetch::{FetchCoordinator, RequestOutcome};
use crate::provider::{AsyncHttpClient, ReqwestClient};
use crate::telemetry::TileMetrics;
use crate::tile::{TileKey, VisibleTile};

/// Whether a tile can be drawn this frame.
#[derive(Debug)]
pub enum DisplayState<H> {
    /// The tile is loaded.
    Ready(TextureEntry<H>),
    /// Not available yet; draw a placeholder. A fetch has been requested if
    /// one was needed.
    Pending,
}

impl<H> DisplayState<H> {
    /// Returns true if the tile can be drawn.
    pub fn is_ready(&self) -> bool {
        matches!(self, DisplayState::Ready(_))
    }

    /// The loaded texture, if any.
    pub fn entry(&self) -> Option<&TextureEntry<H>> {
        match self {
            DisplayState::Ready(entry) => Some(entry),
            DisplayState::Pending => None,
        }
    }
}

impl<H> Clone for DisplayState<H> {
    fn clone(&self) -> Self {
        match self {
            DisplayState::Ready(entry) => DisplayState::Ready(entry.clone()),
            DisplayState::Pending => DisplayState::Pending,
        }
    }
}

/// Result of resolving every tile of one frame.
#[derive(Debug)]
pub struct FrameReport<H> {
    /// Tiles to draw, with their screen placement
    pub ready: Vec<(VisibleTile, TextureEntry<H>)>,
    /// Valid tiles still loading
    pub pending: usize,
    /// Tiles outside the zoom grid
    pub out_of_bounds: usize,
}

impl<H> FrameReport<H> {
    /// Number of tiles planned for the frame.
    pub fn total(&self) -> usize {
        self.ready.len() + self.pending + self.out_of_bounds
    }

    /// Returns true if every valid tile of the frame is drawable.
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }
}

impl<H> fmt::Display for FrameReport<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ready, {} pending, {} off-grid",
            self.ready.len(),
            self.pending,
            self.out_of_bounds
        )
    }
}

/// Answers "can I draw tile (z, x, y) now?" for the render loop.
///
/// Lookups go memory, then disk, then network. Only the network step is
/// asynchronous: it is handed to the [`FetchCoordinator`] and the tile is
/// reported [`DisplayState::Pending`] until a later frame finds it on disk.
///
/// The service is neither `Send` nor `Sync`. Texture handles are created by
/// the uploader during [`TileService::resolve`], and graphics contexts are
/// bound to the thread that created them, so the service stays on the thread
/// that built it.
pub struct TileService<U: TextureUploader, C = ReqwestClient> {
    disk: DiskCache,
    textures: TextureRegistry<U::Handle>,
    uploader: U,
    fetcher: FetchCoordinator<C>,
    metrics: Arc<TileMetrics>,
    /// Kept-on-disk tiles that failed to decode; not read again.
    corrupt: RefCell<HashSet<TileKey>>,
    _render_thread: PhantomData<Rc<()>>,
}

impl<U: TextureUploader> TileService<U, ReqwestClient> {
    /// Starts a service that downloads over HTTPS.
    ///
    /// Workers are spawned on `runtime`, which must outlive the service.
    pub fn start(config: &MapConfig, uploader: U, runtime: Handle) -> Result<Self, ServiceError> {
        let client =
            ReqwestClient::with_options(&config.source.user_agent, config.source.timeout())?;
        Self::with_client(config, uploader, Arc::new(client), runtime)
    }
}

impl<U: TextureUploader, C: AsyncHttpClient + 'static> TileService<U, C> {
    /// Starts a service with a custom HTTP client.
    pub fn with_client(
        config: &MapConfig,
        uploader: U,
        client: Arc<C>,
        runtime: Handle,
    ) -> Result<Self, ServiceError> {
        let root = &config.cache.directory;
        std::fs::create_dir_all(root).map_err(|source| ServiceError::CacheDirectory {
            path: root.clone(),
            source,
        })?;

        let disk = DiskCache::new(root);
        let metrics = Arc::new(TileMetrics::new());
        let fetcher = FetchCoordinator::new(client, disk.clone(), config.fetch_config(), runtime)
            .with_metrics(Arc::clone(&metrics));
        let textures =
            TextureRegistry::new(config.cache.texture_capacity, config.cache.corrupt_tiles);

        info!(
            cache_dir = %root.display(),
            texture_capacity = ?config.cache.texture_capacity,
            corrupt_tiles = %config.cache.corrupt_tiles,
            "Tile service started"
        );

        Ok(Self {
            disk,
            textures,
            uploader,
            fetcher,
            metrics,
            corrupt: RefCell::new(HashSet::new()),
            _render_thread: PhantomData,
        })
    }

    /// Returns the tile if it can be drawn now, requesting a download otherwise.
    ///
    /// Never waits on the network and never fails. Calling this every frame
    /// for a missing tile starts at most one download.
    pub fn resolve(&self, key: TileKey) -> DisplayState<U::Handle> {
        if let Some(entry) = self.textures.lookup(&key) {
            return DisplayState::Ready(entry);
        }

        if key.is_valid() && !self.corrupt.borrow().contains(&key) {
            match self.textures.load(&key, &self.disk, &self.uploader) {
                Ok(Some(entry)) => {
                    self.metrics.texture_loaded();
                    return DisplayState::Ready(entry);
                }
                Ok(None) => {}
                Err(e) => {
                    self.metrics.decode_failure();
                    warn!(tile = %key, error = %e, "Cached tile unusable");
                    if matches!(e, TextureError::Decode { .. })
                        && self.textures.policy() == CorruptTilePolicy::Keep
                    {
                        self.corrupt.borrow_mut().insert(key);
                    }
                }
            }
        }

        let outcome = self.fetcher.request_tile(key);
        if outcome == RequestOutcome::Spawned {
            debug!(tile = %key, "Tile pending download");
        }
        DisplayState::Pending
    }

    /// Resolves every tile planned for a frame.
    pub fn resolve_frame(&self, tiles: &[VisibleTile]) -> FrameReport<U::Handle> {
        let mut report = FrameReport {
            ready: Vec::with_capacity(tiles.len()),
            pending: 0,
            out_of_bounds: 0,
        };

        for tile in tiles {
            if !tile.key.is_valid() {
                // Still routed through the fetch path, which ignores it.
                self.fetcher.request_tile(tile.key);
                report.out_of_bounds += 1;
                continue;
            }
            match self.resolve(tile.key) {
                DisplayState::Ready(entry) => report.ready.push((*tile, entry)),
                DisplayState::Pending => report.pending += 1,
            }
        }

        report
    }

    /// The on-disk tile store.
    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }

    /// Loaded textures.
    pub fn textures(&self) -> &TextureRegistry<U::Handle> {
        &self.textures
    }

    /// Background fetch scheduling.
    pub fn fetcher(&self) -> &FetchCoordinator<C> {
        &self.fetcher
    }

    /// Shared counters.
    pub fn metrics(&self) -> &Arc<TileMetrics> {
        &self.metrics
    }

    /// Returns true if `key` is on disk but failed to decode and is no
    /// longer read.
    pub fn is_known_corrupt(&self, key: &TileKey) -> bool {
        self.corrupt.borrow().contains(key)
    }

    /// Waits for every download started so far.
    pub async fn drain(&self) {
        self.fetcher.drain().await;
    }

    /// Stops fetching, waits for running downloads and releases every texture.
    pub async fn shutdown(self) {
        self.fetcher.shutdown().await;
        self.textures.clear();
        info!("Tile service stopped");
    }
}
