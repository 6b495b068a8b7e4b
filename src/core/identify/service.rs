//! Identification Service
//!
//! The single entry point per scan: connectivity guard, provider fan-out,
//! arbitration. Only the missing-network precondition surfaces as an error;
//! every provider-level failure is absorbed into the arbitrated result.

use std::sync::Arc;

use crate::core::connectivity::{ConnectivityProbe, TcpConnectivityProbe};
use crate::core::image::ImageSource;
use crate::core::CoreResult;

use super::arbiter::{Arbiter, FallbackEnrichment};
use super::coordinator::FanOutCoordinator;
use super::models::ShoeIdentification;
use super::providers::{create_provider, ProviderConfig};

// =============================================================================
// Identification Service
// =============================================================================

/// Identifies a shoe photo by reconciling the answers of every configured
/// vision provider.
pub struct IdentificationService {
    probe: Arc<dyn ConnectivityProbe>,
    coordinator: FanOutCoordinator,
    arbiter: Arbiter,
}

impl IdentificationService {
    /// Creates a service from preassembled parts
    pub fn new(
        probe: Arc<dyn ConnectivityProbe>,
        coordinator: FanOutCoordinator,
        arbiter: Arbiter,
    ) -> Self {
        Self {
            probe,
            coordinator,
            arbiter,
        }
    }

    /// Creates a service from provider configurations, using the default
    /// TCP connectivity probe
    pub fn from_configs(
        configs: Vec<ProviderConfig>,
        fallback_enrichment: FallbackEnrichment,
    ) -> CoreResult<Self> {
        let mut coordinator = FanOutCoordinator::new();
        for config in configs {
            coordinator.register_boxed(create_provider(config)?);
        }

        Ok(Self {
            probe: Arc::new(TcpConnectivityProbe::new()),
            coordinator,
            arbiter: Arbiter::with_fallback_enrichment(fallback_enrichment),
        })
    }

    /// Replaces the connectivity probe
    pub fn with_probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Returns registered provider names in registration order
    pub fn provider_names(&self) -> Vec<String> {
        self.coordinator.provider_names()
    }

    /// Identifies the shoe in the given image.
    ///
    /// Fails only with `CoreError::NoConnectivity`, raised before any
    /// provider call is attempted. Otherwise exactly one identification is
    /// returned: a real answer, or the fallback when every provider came
    /// back empty-handed.
    pub async fn identify(&self, image: &ImageSource) -> CoreResult<ShoeIdentification> {
        self.probe.check().await?;

        tracing::debug!(
            providers = self.coordinator.len(),
            "starting identification fan-out"
        );
        let outcomes = self.coordinator.identify_all(image).await;

        let results: Vec<ShoeIdentification> =
            outcomes.into_iter().map(|o| o.result).collect();

        Ok(self.arbiter.arbitrate(&results))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connectivity::StaticProbe;
    use crate::core::identify::models::ShoePrice;
    use crate::core::identify::provider::MockVisionProvider;
    use crate::core::CoreError;
    use std::sync::atomic::Ordering;

    fn result(brand: &str, confidence: f64, usd: f64, popularity: &str) -> ShoeIdentification {
        ShoeIdentification {
            brand: brand.to_string(),
            confidence,
            popularity: popularity.to_string(),
            price: ShoePrice {
                usd,
                range: "$0-$0".to_string(),
            },
            ..ShoeIdentification::fallback()
        }
    }

    fn image() -> ImageSource {
        ImageSource::bytes(vec![1, 2, 3])
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    // -------------------------------------------------------------------------
    // Pipeline Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_identify_selects_highest_confidence() {
        init_tracing();
        let mut coordinator = FanOutCoordinator::new();
        coordinator.register(
            MockVisionProvider::new("gemini").with_result(result("Nike", 0.8, 100.0, "High")),
        );
        coordinator.register(
            MockVisionProvider::new("openai").with_result(ShoeIdentification::unidentified()),
        );
        coordinator.register(
            MockVisionProvider::new("anthropic").with_result(result("Nike", 0.5, 100.0, "High")),
        );

        let service = IdentificationService::new(
            Arc::new(StaticProbe::online()),
            coordinator,
            Arbiter::new(),
        );

        let identified = service.identify(&image()).await.unwrap();

        assert_eq!(identified.brand, "Nike");
        assert_eq!(identified.confidence, 0.8);
        let rarity = identified.rarity.unwrap();
        assert_eq!(rarity.collector_value, 120.0);
    }

    #[tokio::test]
    async fn test_identify_all_unknown_uses_fallback() {
        let mut coordinator = FanOutCoordinator::new();
        for name in ["gemini", "openai", "anthropic"] {
            coordinator.register(
                MockVisionProvider::new(name).with_result(ShoeIdentification::unidentified()),
            );
        }

        let service = IdentificationService::new(
            Arc::new(StaticProbe::online()),
            coordinator,
            Arbiter::new(),
        );

        let identified = service.identify(&image()).await.unwrap();
        assert_eq!(identified, ShoeIdentification::fallback());
    }

    #[tokio::test]
    async fn test_identify_survives_one_broken_provider() {
        init_tracing();
        let mut coordinator = FanOutCoordinator::new();
        coordinator.register(MockVisionProvider::new("broken").with_panic());
        coordinator.register(
            MockVisionProvider::new("healthy").with_result(result("Adidas", 0.7, 80.0, "Medium")),
        );

        let service = IdentificationService::new(
            Arc::new(StaticProbe::online()),
            coordinator,
            Arbiter::new(),
        );

        let identified = service.identify(&image()).await.unwrap();
        assert_eq!(identified.brand, "Adidas");
    }

    // -------------------------------------------------------------------------
    // Connectivity Guard Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_offline_fails_before_any_provider_call() {
        let provider = MockVisionProvider::new("gemini");
        let calls = provider.call_counter();

        let mut coordinator = FanOutCoordinator::new();
        coordinator.register(provider);

        let service = IdentificationService::new(
            Arc::new(StaticProbe::offline()),
            coordinator,
            Arbiter::new(),
        );

        let outcome = service.identify(&image()).await;

        assert!(matches!(outcome, Err(CoreError::NoConnectivity)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    // -------------------------------------------------------------------------
    // Construction Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_from_configs_registers_in_order() {
        let service = IdentificationService::from_configs(
            vec![
                ProviderConfig::gemini("k1"),
                ProviderConfig::openai("k2"),
                ProviderConfig::anthropic("k3"),
            ],
            FallbackEnrichment::Plain,
        )
        .unwrap();

        assert_eq!(
            service.provider_names(),
            vec!["gemini", "openai", "anthropic"]
        );
    }

    #[test]
    fn test_from_configs_rejects_missing_key() {
        let mut config = ProviderConfig::gemini("k");
        config.api_key = None;

        let outcome =
            IdentificationService::from_configs(vec![config], FallbackEnrichment::Plain);
        assert!(outcome.is_err());
    }
}
