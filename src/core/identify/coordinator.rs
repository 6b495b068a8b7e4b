//! Fan-out Coordinator
//!
//! Issues all registered provider calls concurrently and waits for every one
//! of them to settle before proceeding. Adapters already absorb their own
//! failures; the coordinator additionally defends against a task that panics
//! or stalls, converting either into the sentinel result for that provider.

use std::sync::Arc;
use std::time::Duration;

use futures::future;

use crate::core::image::ImageSource;

use super::models::ShoeIdentification;
use super::provider::VisionProvider;

// =============================================================================
// Provider Outcome
// =============================================================================

/// One provider's settled outcome for a request
#[derive(Clone, Debug)]
pub struct ProviderOutcome {
    /// Provider name, as registered
    pub provider: String,
    /// The provider's identification, or the sentinel on failure
    pub result: ShoeIdentification,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Settle-all join over the registered vision providers.
///
/// Output ordering is stable and matches provider registration order,
/// independent of completion order. No call is retried and no call is
/// cancelled because a sibling finished first or failed.
pub struct FanOutCoordinator {
    providers: Vec<Arc<dyn VisionProvider>>,
    provider_timeout: Duration,
}

impl FanOutCoordinator {
    /// Backstop timeout per provider call.
    ///
    /// Sits above every adapter's own HTTP client timeout so it only fires
    /// for a genuinely stuck task; elapsing is treated as adapter failure.
    pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(150);

    /// Creates an empty coordinator
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            provider_timeout: Self::DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Sets the per-provider settle timeout
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Registers a provider; registration order is the output order
    /// and the arbitration tie-break order
    pub fn register(&mut self, provider: impl VisionProvider + 'static) {
        self.providers.push(Arc::new(provider));
    }

    /// Registers a boxed provider (factory output)
    pub fn register_boxed(&mut self, provider: Box<dyn VisionProvider>) {
        self.providers.push(Arc::from(provider));
    }

    /// Returns registered provider names in registration order
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Calls every provider concurrently and collects all outcomes.
    ///
    /// Never short-circuits: a slow, failed, panicked, or timed-out provider
    /// contributes its sentinel while the others contribute their answers.
    pub async fn identify_all(&self, image: &ImageSource) -> Vec<ProviderOutcome> {
        let mut names = Vec::with_capacity(self.providers.len());
        let mut tasks = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            names.push(provider.name().to_string());

            let provider = Arc::clone(provider);
            let image = image.clone();
            let timeout = self.provider_timeout;

            tasks.push(tokio::spawn(async move {
                match tokio::time::timeout(timeout, provider.identify(&image)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            provider = provider.name(),
                            timeout_secs = timeout.as_secs(),
                            "provider timed out, returning sentinel"
                        );
                        ShoeIdentification::unidentified()
                    }
                }
            }));
        }

        let settled = future::join_all(tasks).await;

        names
            .into_iter()
            .zip(settled)
            .map(|(provider, joined)| {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(
                            provider = %provider,
                            error = %e,
                            "provider task aborted, returning sentinel"
                        );
                        ShoeIdentification::unidentified()
                    }
                };
                ProviderOutcome { provider, result }
            })
            .collect()
    }
}

impl Default for FanOutCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identify::models::ShoePrice;
    use crate::core::identify::provider::MockVisionProvider;

    fn named_result(brand: &str) -> ShoeIdentification {
        ShoeIdentification {
            brand: brand.to_string(),
            ..ShoeIdentification::fallback()
        }
    }

    fn image() -> ImageSource {
        ImageSource::bytes(vec![1, 2, 3])
    }

    // -------------------------------------------------------------------------
    // Ordering Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_output_order_matches_registration_order() {
        let mut coordinator = FanOutCoordinator::new();
        // First-registered provider completes last
        coordinator.register(
            MockVisionProvider::new("slow")
                .with_result(named_result("Nike"))
                .with_delay(Duration::from_millis(100)),
        );
        coordinator.register(MockVisionProvider::new("fast").with_result(named_result("Adidas")));

        let outcomes = coordinator.identify_all(&image()).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].provider, "slow");
        assert_eq!(outcomes[0].result.brand, "Nike");
        assert_eq!(outcomes[1].provider, "fast");
        assert_eq!(outcomes[1].result.brand, "Adidas");
    }

    #[tokio::test]
    async fn test_empty_coordinator_settles_to_nothing() {
        let coordinator = FanOutCoordinator::new();
        assert!(coordinator.is_empty());
        assert!(coordinator.identify_all(&image()).await.is_empty());
    }

    // -------------------------------------------------------------------------
    // Failure Isolation Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_panicking_provider_yields_sentinel() {
        let mut coordinator = FanOutCoordinator::new();
        coordinator.register(MockVisionProvider::new("broken").with_panic());
        coordinator.register(MockVisionProvider::new("healthy").with_result(named_result("Puma")));

        let outcomes = coordinator.identify_all(&image()).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_unidentified());
        assert_eq!(outcomes[1].result.brand, "Puma");
    }

    #[tokio::test]
    async fn test_timed_out_provider_yields_sentinel() {
        let mut coordinator =
            FanOutCoordinator::new().with_provider_timeout(Duration::from_millis(50));
        coordinator.register(
            MockVisionProvider::new("stalled")
                .with_result(named_result("Nike"))
                .with_delay(Duration::from_secs(5)),
        );
        coordinator.register(MockVisionProvider::new("prompt").with_result(named_result("Asics")));

        let outcomes = coordinator.identify_all(&image()).await;

        assert!(outcomes[0].result.is_unidentified());
        assert_eq!(outcomes[1].result.brand, "Asics");
    }

    #[tokio::test]
    async fn test_all_providers_called_exactly_once() {
        let first = MockVisionProvider::new("a");
        let second = MockVisionProvider::new("b");
        let first_calls = first.call_counter();
        let second_calls = second.call_counter();

        let mut coordinator = FanOutCoordinator::new();
        coordinator.register(first);
        coordinator.register(second);

        coordinator.identify_all(&image()).await;

        assert_eq!(first_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    // -------------------------------------------------------------------------
    // Registration Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_register_boxed_provider() {
        let mut coordinator = FanOutCoordinator::new();
        coordinator.register_boxed(Box::new(
            MockVisionProvider::new("boxed").with_result(ShoeIdentification {
                price: ShoePrice {
                    usd: 80.0,
                    range: "$70-$90".to_string(),
                },
                ..named_result("Adidas")
            }),
        ));

        assert_eq!(coordinator.provider_names(), vec!["boxed"]);
        let outcomes = coordinator.identify_all(&image()).await;
        assert_eq!(outcomes[0].result.price.usd, 80.0);
    }
}
