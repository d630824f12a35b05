//! Integration tests for the tile service.
//!
//! These tests drive the full resolve → fetch → disk → texture path with a
//! scripted HTTP client, so no network access is needed:
//! - Pending then Ready for an uncached tile
//! - Out-of-bounds keys are ignored
//! - Repeated resolves never duplicate a download
//! - Failed downloads leave nothing behind and are retried on demand
//!
//! Run with: `cargo test --test tile_service_integration`

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use movingmap::cache::{CorruptTilePolicy, RasterUploader};
use movingmap::config::MapConfig;
use movingmap::coord::FractionalTile;
use movingmap::fetch::RequestOutcome;
use movingmap::provider::{AsyncHttpClient, BodyStream, ProviderError};
use movingmap::service::{DisplayState, TileService};
use movingmap::tile::{TileKey, Viewport};

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode a small solid PNG, the shape of a real tile response.
fn png_tile() -> Vec<u8> {
    let image = RgbaImage::from_pixel(16, 16, Rgba([200, 180, 140, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// One scripted server reply.
#[derive(Clone)]
enum Reply {
    /// 200 with this body, split into two chunks
    Tile(Vec<u8>),
    /// Non-success status
    Status(u16),
    /// Body starts, then the connection drops
    Truncated(Vec<u8>),
}

/// HTTP client that serves scripted replies and records every request.
///
/// Requests block on `gate` until the test opens it, which keeps fetches
/// in flight while the test inspects the service.
struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    gate: Arc<Semaphore>,
    requests: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn serving(reply: Reply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: reply,
            gate: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
            requests: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Replies consumed in order before falling back to `fallback`.
    fn then(self, reply: Reply) -> Self {
        self.replies.lock().push_back(reply);
        self
    }

    /// Start with the gate closed.
    fn gated(mut self) -> Self {
        self.gate = Arc::new(Semaphore::new(0));
        self
    }

    fn open_gate(&self) {
        self.gate.add_permits(1024);
    }

    fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl AsyncHttpClient for ScriptedClient {
    async fn get_stream(&self, url: &str) -> Result<BodyStream, ProviderError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.to_string());

        let _pass = self
            .gate
            .acquire()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Tile(body) => {
                let (head, tail) = body.split_at(body.len() / 2);
                let chunks: Vec<Result<Bytes, ProviderError>> = vec![
                    Ok(Bytes::copy_from_slice(head)),
                    Ok(Bytes::copy_from_slice(tail)),
                ];
                Ok(Box::pin(futures::stream::iter(chunks)))
            }
            Reply::Status(status) => Err(ProviderError::Status {
                url: url.to_string(),
                status,
            }),
            Reply::Truncated(body) => {
                let chunks: Vec<Result<Bytes, ProviderError>> = vec![
                    Ok(Bytes::from(body)),
                    Err(ProviderError::Body("connection reset".to_string())),
                ];
                Ok(Box::pin(futures::stream::iter(chunks)))
            }
        }
    }
}

fn start_service(
    client: Arc<ScriptedClient>,
    configure: impl FnOnce(&mut MapConfig),
) -> (TempDir, TileService<RasterUploader, ScriptedClient>) {
    let dir = TempDir::new().unwrap();
    let mut config = MapConfig::default();
    config.cache.directory = dir.path().join("tilecache");
    configure(&mut config);

    let service =
        TileService::with_client(&config, RasterUploader, client, Handle::current()).unwrap();
    (dir, service)
}

// ============================================================================
// Scenarios
// ============================================================================

/// An uncached tile is Pending with exactly one download outstanding, then
/// Ready once the download has landed.
#[tokio::test]
async fn test_uncached_tile_becomes_ready() {
    let client = Arc::new(ScriptedClient::serving(Reply::Tile(png_tile())).gated());
    let (dir, service) = start_service(Arc::clone(&client), |_| {});
    let key = TileKey::new(13, 4500, 3070);

    assert!(matches!(service.resolve(key), DisplayState::Pending));
    assert_eq!(service.fetcher().in_flight_count(), 1);

    client.open_gate();
    service.drain().await;

    let path = dir.path().join("tilecache/13/4500/3070.png");
    assert!(path.is_file());
    assert!(service.disk().exists(&key));

    match service.resolve(key) {
        DisplayState::Ready(entry) => {
            assert_eq!(entry.key, key);
            assert_eq!(entry.handle.dimensions(), (16, 16));
        }
        DisplayState::Pending => panic!("tile should be ready after the fetch landed"),
    }

    assert_eq!(client.request_count(), 1);
    assert_eq!(
        client.urls.lock().as_slice(),
        ["https://tile.openstreetmap.org/13/4500/3070.png"]
    );
}

/// A key left of the grid is ignored: no request, no file, no crash.
#[tokio::test]
async fn test_out_of_bounds_key_is_noop() {
    let client = Arc::new(ScriptedClient::serving(Reply::Tile(png_tile())));
    let (dir, service) = start_service(Arc::clone(&client), |_| {});

    let outcome = service.fetcher().request_tile(TileKey::new(5, -1, 0));
    assert_eq!(outcome, RequestOutcome::OutOfBounds);
    assert!(!service.resolve(TileKey::new(5, -1, 0)).is_ready());

    service.drain().await;

    assert_eq!(client.request_count(), 0);
    assert_eq!(service.fetcher().in_flight_count(), 0);
    let entries = std::fs::read_dir(dir.path().join("tilecache")).unwrap().count();
    assert_eq!(entries, 0);
}

/// Two frames resolving the same uncached key before the first download
/// completes produce one network request.
#[tokio::test]
async fn test_repeated_resolves_share_one_request() {
    let client = Arc::new(ScriptedClient::serving(Reply::Tile(png_tile())).gated());
    let (_dir, service) = start_service(Arc::clone(&client), |_| {});
    let key = TileKey::new(13, 4500, 3070);

    for _frame in 0..10 {
        assert!(!service.resolve(key).is_ready());
        tokio::task::yield_now().await;
    }
    assert!(service.fetcher().is_in_flight(&key));

    client.open_gate();
    service.drain().await;

    assert_eq!(client.request_count(), 1);
    assert!(service.resolve(key).is_ready());
    assert_eq!(service.metrics().snapshot().fetches_spawned, 1);
}

/// A non-success status leaves no file, releases the key, and the next
/// resolve starts a fresh attempt that can succeed.
#[tokio::test]
async fn test_failed_fetch_is_retried_on_next_resolve() {
    let client =
        Arc::new(ScriptedClient::serving(Reply::Tile(png_tile())).then(Reply::Status(503)));
    let (_dir, service) = start_service(Arc::clone(&client), |_| {});
    let key = TileKey::new(13, 4500, 3070);

    assert!(!service.resolve(key).is_ready());
    service.drain().await;

    assert!(!service.disk().exists(&key));
    assert!(!service.fetcher().is_in_flight(&key));
    assert_eq!(client.request_count(), 1);

    assert!(!service.resolve(key).is_ready());
    service.drain().await;

    assert_eq!(client.request_count(), 2);
    assert!(service.resolve(key).is_ready());

    let snapshot = service.metrics().snapshot();
    assert_eq!(snapshot.fetches_failed, 1);
    assert_eq!(snapshot.fetches_completed, 1);
}

/// A body that breaks mid-transfer leaves neither the tile nor its part file.
#[tokio::test]
async fn test_truncated_body_leaves_nothing_on_disk() {
    let mut body = png_tile();
    body.truncate(body.len() / 2);
    let client = Arc::new(ScriptedClient::serving(Reply::Truncated(body)));
    let (_dir, service) = start_service(Arc::clone(&client), |_| {});
    let key = TileKey::new(13, 4500, 3070);

    service.resolve(key);
    service.drain().await;

    let tile_path = service.disk().path(&key);
    assert!(!tile_path.exists());
    assert!(!tile_path.with_extension("png.part").exists());
    assert!(!service.fetcher().is_in_flight(&key));
}

/// With the discard policy a corrupt cached file is removed and refetched.
#[tokio::test]
async fn test_corrupt_tile_is_refetched_with_discard_policy() {
    let client = Arc::new(ScriptedClient::serving(Reply::Tile(png_tile())));
    let (_dir, service) = start_service(Arc::clone(&client), |config| {
        config.cache.corrupt_tiles = CorruptTilePolicy::Discard;
    });
    let key = TileKey::new(10, 540, 330);
    service.disk().write(&key, b"<html>rate limited</html>").unwrap();

    assert!(!service.resolve(key).is_ready());
    service.drain().await;

    assert_eq!(client.request_count(), 1);
    assert!(service.resolve(key).is_ready());
}

/// A bounded fetcher still completes a whole frame, one download at a time.
#[tokio::test]
async fn test_bounded_fetcher_completes_frame() {
    let client = Arc::new(ScriptedClient::serving(Reply::Tile(png_tile())));
    let (_dir, service) = start_service(Arc::clone(&client), |config| {
        config.source.max_concurrent_fetches = Some(2);
    });
    let tiles = Viewport::default().visible_tiles(FractionalTile::from_lon_lat(0.17, 0.93, 13));

    let first = service.resolve_frame(&tiles);
    assert_eq!(first.pending, 35);
    assert_eq!(service.fetcher().in_flight_count(), 35);

    service.drain().await;

    let second = service.resolve_frame(&tiles);
    assert!(second.is_complete());
    assert_eq!(second.ready.len(), 35);
    assert_eq!(client.request_count(), 35);
    assert!(service.fetcher().limiter().unwrap().peak_in_flight() <= 2);
}

/// Tiles cached by a previous run are used without touching the network.
#[tokio::test]
async fn test_tiles_persist_across_services() {
    let client = Arc::new(ScriptedClient::serving(Reply::Tile(png_tile())));
    let dir = TempDir::new().unwrap();
    let mut config = MapConfig::default();
    config.cache.directory = dir.path().join("tilecache");
    let key = TileKey::new(13, 4500, 3070);

    {
        let first = TileService::with_client(
            &config,
            RasterUploader,
            Arc::clone(&client),
            Handle::current(),
        )
        .unwrap();
        first.resolve(key);
        first.shutdown().await;
    }

    let second =
        TileService::with_client(&config, RasterUploader, Arc::clone(&client), Handle::current())
            .unwrap();

    assert!(second.resolve(key).is_ready());
    assert_eq!(client.request_count(), 1);
}
