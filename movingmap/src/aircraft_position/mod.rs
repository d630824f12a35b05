//! Aircraft position input.
//!
//! The map follows a pose published by an external telemetry feed. The feed
//! writes into a [`SharedPose`]; the render loop reads it once per frame.
//!
//! # Consistency
//!
//! Each field of the pose is stored in its own atomic. A reader racing a
//! writer may see a new latitude paired with an old heading, but never a
//! half-written number. A position a few milliseconds stale relative to the
//! heading is invisible on a moving map, so no multi-field lock is taken.

mod client;
mod protocol;

pub use client::{
    PositionCodec, TelemetryClient, TelemetryError, DEFAULT_TELEMETRY_ADDRESS, MAX_LINE_LENGTH,
};
pub use protocol::{parse_position_line, POSITION_TAG};

use std::sync::atomic::{AtomicU64, Ordering};

/// Aircraft pose, all angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurrentPose {
    /// Latitude in radians
    pub latitude: f64,
    /// Longitude in radians
    pub longitude: f64,
    /// True heading in radians
    pub heading: f64,
}

impl CurrentPose {
    /// Heading in degrees, for display.
    pub fn heading_degrees(&self) -> f64 {
        self.heading.to_degrees()
    }
}

/// Lock-free holder for the latest pose.
#[derive(Debug, Default)]
pub struct SharedPose {
    latitude: AtomicU64,
    longitude: AtomicU64,
    heading: AtomicU64,
    updates: AtomicU64,
}

impl SharedPose {
    /// Creates a holder at (0, 0) heading north with no updates recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a pose. Fields are written one at a time.
    pub fn store(&self, pose: CurrentPose) {
        self.latitude.store(pose.latitude.to_bits(), Ordering::Relaxed);
        self.longitude.store(pose.longitude.to_bits(), Ordering::Relaxed);
        self.heading.store(pose.heading.to_bits(), Ordering::Relaxed);
        self.updates.fetch_add(1, Ordering::Release);
    }

    /// Reads the latest pose.
    pub fn load(&self) -> CurrentPose {
        CurrentPose {
            latitude: f64::from_bits(self.latitude.load(Ordering::Relaxed)),
            longitude: f64::from_bits(self.longitude.load(Ordering::Relaxed)),
            heading: f64::from_bits(self.heading.load(Ordering::Relaxed)),
        }
    }

    /// Number of poses published so far.
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Acquire)
    }

    /// Returns true once at least one pose has been published.
    pub fn has_fix(&self) -> bool {
        self.update_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_pose_has_no_fix() {
        let pose = SharedPose::new();
        assert!(!pose.has_fix());
        assert_eq!(pose.load(), CurrentPose::default());
    }

    #[test]
    fn test_store_then_load() {
        let shared = SharedPose::new();
        let pose = CurrentPose {
            latitude: 0.9346,
            longitude: 0.1744,
            heading: 1.5708,
        };

        shared.store(pose);

        assert!(shared.has_fix());
        assert_eq!(shared.update_count(), 1);
        assert_eq!(shared.load(), pose);
    }

    #[test]
    fn test_concurrent_reader_sees_only_written_values() {
        let shared = Arc::new(SharedPose::new());
        let a = CurrentPose {
            latitude: 0.1,
            longitude: 0.2,
            heading: 0.3,
        };
        let b = CurrentPose {
            latitude: -0.4,
            longitude: -0.5,
            heading: -0.6,
        };

        let writer = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    shared.store(if i % 2 == 0 { a } else { b });
                }
            })
        };

        for _ in 0..10_000 {
            let seen = shared.load();
            assert!([0.0, a.latitude, b.latitude].contains(&seen.latitude));
            assert!([0.0, a.longitude, b.longitude].contains(&seen.longitude));
            assert!([0.0, a.heading, b.heading].contains(&seen.heading));
        }

        writer.join().unwrap();
        assert_eq!(shared.update_count(), 10_000);
    }

    #[test]
    fn test_heading_degrees() {
        let pose = CurrentPose {
            heading: std::f64::consts::PI,
            ..Default::default()
        };
        assert!((pose.heading_degrees() - 180.0).abs() < 1e-9);
    }
}
