//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading, logging initialization, runtime
//! creation and service construction so command handlers stay short.

use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;
use tracing::info;

use movingmap::cache::RasterUploader;
use movingmap::config::MapConfig;
use movingmap::logging::{init_logging, LoggingGuard, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE};
use movingmap::service::TileService;

use crate::error::CliError;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Config file to read instead of the default location
    pub config: Option<PathBuf>,
    /// Directory for the session log
    pub log_dir: Option<PathBuf>,
}

/// Loads `--config` if given, otherwise the default config file.
pub fn load_config(options: &GlobalOptions) -> Result<MapConfig, CliError> {
    let config = match &options.config {
        Some(path) => MapConfig::load_from(path)?,
        None => MapConfig::load()?,
    };
    Ok(config)
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the log writer alive while the runner exists
    logging_guard: LoggingGuard,
    config: MapConfig,
    runtime: Runtime,
}

impl CliRunner {
    /// Loads the configuration, starts logging and builds the worker runtime.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = load_config(options)?;

        let log_dir = options
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        let logging_guard =
            init_logging(&log_dir, DEFAULT_LOG_FILE).map_err(CliError::LoggingInit)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("movingmap-worker")
            .build()
            .map_err(CliError::Runtime)?;

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Runtime that hosts fetch workers and the telemetry client.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Path of the session log file.
    pub fn log_path(&self) -> &Path {
        self.logging_guard.log_path()
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("movingmap v{}", env!("CARGO_PKG_VERSION"));
        info!(
            command,
            cache_dir = %self.config.cache.directory.display(),
            host = %self.config.source.host,
            log = %self.log_path().display(),
            "CLI command starting"
        );
    }

    /// Starts a tile service backed by in-memory rasters.
    ///
    /// Must be called on the thread that will resolve tiles.
    pub fn create_service(&self) -> Result<TileService<RasterUploader>, CliError> {
        let handle = self.runtime.handle().clone();
        let service = TileService::start(&self.config, RasterUploader, handle)?;
        info!("Service created successfully");
        Ok(service)
    }
}
