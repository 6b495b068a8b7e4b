//! Scan Session
//!
//! Observable state holder between the identification pipeline and the UI.
//! Single writer (the capture flow), multiple readers (screens). A request
//! generation counter suppresses stale responses so a late answer can never
//! overwrite the state of a newer scan.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::image::ImageSource;

use super::models::ShoeIdentification;
use super::service::IdentificationService;

// =============================================================================
// Scan State
// =============================================================================

/// Snapshot of the current scan, as consumed by the UI
#[derive(Clone, Debug, Default)]
pub struct ScanState {
    /// Last arbitrated identification, if any
    pub result: Option<ShoeIdentification>,
    /// Image of the scan currently shown
    pub image: Option<ImageSource>,
    /// Whether an identification is in flight
    pub is_loading: bool,
    /// Actionable error message (connectivity), if the last scan failed
    pub error: Option<String>,
}

// =============================================================================
// Scan Session
// =============================================================================

/// Drives scans against the identification service and holds their state
pub struct ScanSession {
    service: Arc<IdentificationService>,
    state: Arc<RwLock<ScanState>>,
    generation: AtomicU64,
}

impl ScanSession {
    /// Creates a session over the given service
    pub fn new(service: Arc<IdentificationService>) -> Self {
        Self {
            service,
            state: Arc::new(RwLock::new(ScanState::default())),
            generation: AtomicU64::new(0),
        }
    }

    /// Captures an image and runs identification.
    ///
    /// Starting a capture supersedes any capture still in flight: the older
    /// one finishes but its outcome is discarded instead of merged.
    pub async fn capture(&self, image: ImageSource) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.write().await;
            state.image = Some(image.clone());
            state.is_loading = true;
            state.error = None;
        }

        let outcome = self.service.identify(&image).await;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding stale identification outcome");
            return;
        }

        state.is_loading = false;
        match outcome {
            Ok(result) => state.result = Some(result),
            Err(e) => state.error = Some(e.to_string()),
        }
    }

    /// Clears the scan state and invalidates any capture in flight
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        *state = ScanState::default();
    }

    /// Returns a snapshot of the current state
    pub async fn state(&self) -> ScanState {
        self.state.read().await.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connectivity::StaticProbe;
    use crate::core::identify::arbiter::Arbiter;
    use crate::core::identify::coordinator::FanOutCoordinator;
    use crate::core::identify::provider::MockVisionProvider;
    use std::time::Duration;

    fn service_with(provider: MockVisionProvider, online: bool) -> Arc<IdentificationService> {
        let mut coordinator = FanOutCoordinator::new();
        coordinator.register(provider);

        let probe = if online {
            StaticProbe::online()
        } else {
            StaticProbe::offline()
        };

        Arc::new(IdentificationService::new(
            Arc::new(probe),
            coordinator,
            Arbiter::new(),
        ))
    }

    fn image() -> ImageSource {
        ImageSource::bytes(vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_capture_stores_result() {
        let session = ScanSession::new(service_with(MockVisionProvider::new("mock"), true));

        session.capture(image()).await;

        let state = session.state().await;
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(state.result.unwrap().brand, "Nike");
        assert_eq!(state.image, Some(image()));
    }

    #[tokio::test]
    async fn test_capture_offline_surfaces_error() {
        let session = ScanSession::new(service_with(MockVisionProvider::new("mock"), false));

        session.capture(image()).await;

        let state = session.state().await;
        assert!(!state.is_loading);
        assert!(state.result.is_none());
        assert!(state.error.unwrap().contains("No network connection"));
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let session = ScanSession::new(service_with(MockVisionProvider::new("mock"), true));

        session.capture(image()).await;
        session.reset().await;

        let state = session.state().await;
        assert!(state.result.is_none());
        assert!(state.image.is_none());
        assert!(state.error.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_newer_capture_supersedes_older() {
        let slow = MockVisionProvider::new("slow").with_delay(Duration::from_millis(400));
        let session = Arc::new(ScanSession::new(service_with(slow, true)));

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.capture(ImageSource::bytes(vec![1])).await })
        };
        tokio::time::sleep(Duration::from_millis(120)).await;
        let second = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.capture(ImageSource::bytes(vec![2])).await })
        };

        first.await.unwrap();

        // The first capture has settled but was superseded: its outcome is
        // discarded and the second scan is still loading.
        let state = session.state().await;
        assert!(state.is_loading);
        assert!(state.result.is_none());
        assert_eq!(state.image, Some(ImageSource::bytes(vec![2])));

        second.await.unwrap();
        let state = session.state().await;
        assert!(!state.is_loading);
        assert!(state.result.is_some());
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_capture() {
        let slow = MockVisionProvider::new("slow").with_delay(Duration::from_millis(150));
        let session = Arc::new(ScanSession::new(service_with(slow, true)));

        let background = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.capture(image()).await })
        };

        // Let the capture get in flight, then supersede it.
        tokio::time::sleep(Duration::from_millis(30)).await;
        session.reset().await;
        background.await.unwrap();

        let state = session.state().await;
        assert!(state.result.is_none());
        assert!(state.image.is_none());
    }
}
