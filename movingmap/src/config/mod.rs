//! Configuration for the tile engine and its front ends.
//!
//! Settings are read from `config.ini` in the platform config directory
//! (`~/.config/movingmap/config.ini` on Linux). Every key is optional; a
//! missing file or section leaves the defaults below in place.
//!
//! ```ini
//! [cache]
//! directory = tilecache
//! texture_capacity = 512
//! corrupt_tiles = keep
//!
//! [source]
//! host = tile.openstreetmap.org
//! timeout_secs = 30
//! max_concurrent_fetches = 8
//!
//! [telemetry]
//! address = 127.0.0.1:10747
//!
//! [view]
//! width = 800
//! height = 600
//! zoom = 13
//! ```

mod file;

pub use file::{config_directory, config_file_path, ConfigFileError};

use std::path::PathBuf;
use std::time::Duration;

use crate::aircraft_position::DEFAULT_TELEMETRY_ADDRESS;
use crate::cache::{CorruptTilePolicy, DEFAULT_CACHE_DIR};
use crate::fetch::FetchConfig;
use crate::provider::{DEFAULT_TILE_HOST, DEFAULT_TIMEOUT_SECS};
use crate::tile::Viewport;
use crate::USER_AGENT;

/// Default map zoom level.
pub const DEFAULT_ZOOM: u8 = 13;

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapConfig {
    pub cache: CacheSettings,
    pub source: SourceSettings,
    pub telemetry: TelemetrySettings,
    pub view: ViewSettings,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Root of the on-disk tile store
    pub directory: PathBuf,
    /// Maximum decoded tiles kept in memory, `None` for unbounded
    pub texture_capacity: Option<u64>,
    /// What to do with cached files that fail to decode
    pub corrupt_tiles: CorruptTilePolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_CACHE_DIR),
            texture_capacity: None,
            corrupt_tiles: CorruptTilePolicy::Keep,
        }
    }
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub host: String,
    pub user_agent: String,
    /// Whole-request timeout in seconds; 0 disables it
    pub timeout_secs: u64,
    /// Limit on concurrent downloads, `None` for unbounded
    pub max_concurrent_fetches: Option<usize>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_TILE_HOST.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent_fetches: None,
        }
    }
}

impl SourceSettings {
    /// Request timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySettings {
    /// `host:port` of the simulator's telemetry server
    pub address: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_TELEMETRY_ADDRESS.to_string(),
        }
    }
}

/// `[view]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub width: u32,
    pub height: u32,
    /// Always within the range the view supports
    pub zoom: u8,
}

impl Default for ViewSettings {
    fn default() -> Self {
        let viewport = Viewport::default();
        Self {
            width: viewport.width,
            height: viewport.height,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapConfig {
    /// Settings for the fetch coordinator.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            host: self.source.host.clone(),
            max_concurrent_fetches: self.source.max_concurrent_fetches,
        }
    }

    /// Window geometry for frame planning.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.view.width, self.view.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = MapConfig::default();

        assert_eq!(config.cache.directory, PathBuf::from("tilecache"));
        assert_eq!(config.cache.texture_capacity, None);
        assert_eq!(config.cache.corrupt_tiles, CorruptTilePolicy::Keep);
        assert_eq!(config.source.host, "tile.openstreetmap.org");
        assert!(config.source.user_agent.starts_with("movingmap/"));
        assert_eq!(config.source.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.source.max_concurrent_fetches, None);
        assert_eq!(config.telemetry.address, "127.0.0.1:10747");
        assert_eq!((config.view.width, config.view.height), (800, 600));
        assert_eq!(config.view.zoom, 13);
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let source = SourceSettings {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(source.timeout(), None);
    }

    #[test]
    fn test_derived_settings() {
        let mut config = MapConfig::default();
        config.source.host = "tiles.example.org".to_string();
        config.source.max_concurrent_fetches = Some(4);
        config.view.width = 1024;

        let fetch = config.fetch_config();
        assert_eq!(fetch.host, "tiles.example.org");
        assert_eq!(fetch.max_concurrent_fetches, Some(4));
        assert_eq!(config.viewport(), Viewport::new(1024, 600));
    }
}
