//! Point-in-time metrics snapshot.

use std::fmt;
use std::time::Duration;

/// Immutable copy of [`TileMetrics`](super::TileMetrics) counters.
#[derive(Clone, Debug, Default)]
pub struct TileMetricsSnapshot {
    /// Time since the metrics were created
    pub uptime: Duration,

    // === Request path ===
    pub requests: u64,
    pub out_of_bounds: u64,
    pub disk_hits: u64,
    pub deduplicated: u64,

    // === Workers ===
    pub fetches_spawned: u64,
    pub fetches_completed: u64,
    pub fetches_failed: u64,
    /// Spawned workers that have not finished yet
    pub fetches_active: u64,
    pub bytes_downloaded: u64,

    // === Textures ===
    pub textures_loaded: u64,
    pub decode_failures: u64,
}

impl TileMetricsSnapshot {
    /// Fraction of finished fetches that failed (0.0 - 1.0).
    pub fn failure_rate(&self) -> f64 {
        let total = self.fetches_completed + self.fetches_failed;
        if total == 0 {
            0.0
        } else {
            self.fetches_failed as f64 / total as f64
        }
    }

    /// Download throughput averaged over the uptime.
    pub fn bytes_per_second(&self) -> f64 {
        self.bytes_downloaded as f64 / self.uptime.as_secs_f64().max(0.001)
    }
}

impl fmt::Display for TileMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tile Telemetry (uptime: {})", format_duration(self.uptime))?;
        writeln!(f, "─────────────────────────────────────────")?;

        writeln!(f, "Requests:")?;
        writeln!(f, "  Total: {}", self.requests)?;
        writeln!(f, "  Disk hits: {}", self.disk_hits)?;
        writeln!(f, "  Already in flight: {}", self.deduplicated)?;
        writeln!(f, "  Out of bounds: {}", self.out_of_bounds)?;
        writeln!(f)?;

        writeln!(f, "Downloads:")?;
        writeln!(f, "  Completed: {}", self.fetches_completed)?;
        writeln!(f, "  Active: {}", self.fetches_active)?;
        writeln!(
            f,
            "  Failed: {} ({:.1}%)",
            self.fetches_failed,
            self.failure_rate() * 100.0
        )?;
        writeln!(
            f,
            "  Downloaded: {} ({})",
            format_bytes(self.bytes_downloaded),
            format_bytes_per_second(self.bytes_per_second())
        )?;
        writeln!(f)?;

        writeln!(f, "Textures:")?;
        writeln!(f, "  Loaded: {}", self.textures_loaded)?;
        write!(f, "  Decode failures: {}", self.decode_failures)
    }
}

fn format_bytes_per_second(bps: f64) -> String {
    if bps >= 1_000_000.0 {
        format!("{:.1} MB/s", bps / 1_000_000.0)
    } else if bps >= 1_000.0 {
        format!("{:.1} KB/s", bps / 1_000.0)
    } else {
        format!("{:.0} B/s", bps)
    }
}

/// Format bytes in human-readable form.
fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
