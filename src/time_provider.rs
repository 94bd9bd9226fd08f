//! Time abstraction layer for testable time-dependent operations
//!
//! This module provides a `TimeProvider` trait that allows for mocking time
//! in tests while using real time in production, without conditional
//! compilation. The ephemeral store stamps rows and computes eviction
//! cutoffs exclusively through this trait, so eviction behavior can be
//! exercised with simulated time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep as tokio_sleep;

/// Trait for providing time-related functionality
///
/// This allows for dependency injection of time behavior, enabling fast
/// test execution without real-time delays.
#[async_trait]
pub trait TimeProvider: Send + Sync + std::fmt::Debug {
    /// Sleep for the specified duration
    async fn sleep(&self, duration: Duration);

    /// Get the current wall-clock time
    #[must_use]
    fn now(&self) -> DateTime<Utc>;
}

/// Real time provider for production use
#[derive(Debug, Clone, Default)]
pub struct RealTimeProvider;

impl RealTimeProvider {
    /// Creates a new real time provider
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TimeProvider for RealTimeProvider {
    async fn sleep(&self, duration: Duration) {
        tokio_sleep(duration).await;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock time provider for testing
///
/// Holds an adjustable clock. Sleeps return immediately after advancing the
/// clock by the requested duration, so a periodic task observes simulated
/// time passing at full test speed.
#[derive(Debug, Clone)]
pub struct MockTimeProvider {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockTimeProvider {
    /// Creates a mock clock starting at the current wall-clock time
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Creates a mock clock starting at the given instant
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Advances the clock without sleeping
    ///
    /// # Panics
    ///
    /// Panics if the internal clock lock is poisoned.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += chrono::Duration::from_std(duration).expect("duration fits chrono range");
    }
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeProvider for MockTimeProvider {
    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }

    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// Type alias for shared time provider
pub type SharedTimeProvider = Arc<dyn TimeProvider>;

/// Create a production time provider
#[must_use]
pub fn production_time_provider() -> SharedTimeProvider {
    Arc::new(RealTimeProvider::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_mock_time_provider_advances_instead_of_sleeping() {
        let provider = MockTimeProvider::new();
        let before = provider.now();
        let start = Instant::now();

        provider.sleep(Duration::from_secs(600)).await;

        assert!(
            start.elapsed() < Duration::from_millis(100),
            "mock sleep took too long"
        );
        assert_eq!(provider.now() - before, chrono::Duration::seconds(600));
    }

    #[tokio::test]
    async fn test_real_time_provider_actually_sleeps() {
        let provider = RealTimeProvider::new();
        let start = Instant::now();

        provider.sleep(Duration::from_millis(50)).await;

        assert!(
            start.elapsed() >= Duration::from_millis(50),
            "real sleep was too short"
        );
    }

    #[test]
    fn test_mock_advance_is_visible_across_clones() {
        let provider = MockTimeProvider::new();
        let clone = provider.clone();
        let before = clone.now();

        provider.advance(Duration::from_secs(30));

        assert_eq!(clone.now() - before, chrono::Duration::seconds(30));
    }
}
