//! Concurrency bound for fetch workers.
//!
//! A worker holds a [`FetchPermit`] for the duration of its HTTP transfer.
//! Workers waiting for a permit still hold their in-flight key, so a tile
//! queued behind the limit is not requested twice.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

use super::FetchError;

/// Semaphore-backed limit on concurrent downloads.
#[derive(Debug)]
pub struct FetchLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    /// Uses Arc so permits can be moved into spawned tasks.
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
}

impl FetchLimiter {
    /// Creates a limiter allowing `max_concurrent` transfers at once.
    ///
    /// A limit of zero is raised to one.
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        info!(max_concurrent, "Fetch limiter created");
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Waits for a permit.
    pub async fn acquire(&self) -> Result<FetchPermit, FetchError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| FetchError::LimiterClosed)?;

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::Relaxed);

        Ok(FetchPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Fails every pending and future [`FetchLimiter::acquire`]. Permits
    /// already held stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Returns true once [`FetchLimiter::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Configured limit.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest number of permits held at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }
}

/// A permit from the fetch limiter. Released when dropped.
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for FetchPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_limit_is_raised_to_one() {
        let limiter = FetchLimiter::new(0);
        assert_eq!(limiter.max_concurrent(), 1);
    }

    #[tokio::test]
    async fn test_permits_are_bounded() {
        let limiter = FetchLimiter::new(2);

        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);
        assert!(
            tokio::time::timeout(Duration::from_millis(20), limiter.acquire())
                .await
                .is_err()
        );

        drop(a);
        assert_eq!(limiter.in_flight(), 1);
        let c = limiter.acquire().await.unwrap();

        drop(b);
        drop(c);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let limiter = Arc::new(FetchLimiter::new(1));
        let held = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(held);
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_close_fails_acquire_but_keeps_held_permits() {
        let limiter = FetchLimiter::new(1);
        let held = limiter.acquire().await.unwrap();

        limiter.close();

        assert!(limiter.is_closed());
        assert!(matches!(
            limiter.acquire().await,
            Err(FetchError::LimiterClosed)
        ));
        assert_eq!(limiter.in_flight(), 1);
        drop(held);
        assert_eq!(limiter.in_flight(), 0);
    }
}
