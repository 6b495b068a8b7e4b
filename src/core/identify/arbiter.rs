//! Arbitration Engine
//!
//! Selects a single winner among the settled provider results and enriches
//! it with a derived rarity classification and collector-value estimate.

use super::models::{RarityAssessment, RarityLevel, ShoeIdentification};

// =============================================================================
// Fallback Policy
// =============================================================================

/// Behavior of the all-unknown path.
///
/// Both forms shipped at different points; callers pick one explicitly
/// instead of the engine silently choosing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackEnrichment {
    /// Return the fallback result with no rarity attached
    #[default]
    Plain,
    /// Return the fallback decorated with a Common-level assessment
    /// (collector value = fallback price x 1.2)
    WithRarity,
}

// =============================================================================
// Arbiter
// =============================================================================

/// Deterministic winner selection over provider results.
///
/// Exactly one result comes out per request: the highest-confidence
/// identification among non-sentinel entries, or the fixed fallback when
/// every provider was excluded.
pub struct Arbiter {
    fallback_enrichment: FallbackEnrichment,
}

impl Arbiter {
    /// Common-tier multiplier applied to the decorated fallback
    const FALLBACK_MULTIPLIER: f64 = 1.2;

    /// Creates an arbiter with the plain fallback behavior
    pub fn new() -> Self {
        Self {
            fallback_enrichment: FallbackEnrichment::Plain,
        }
    }

    /// Creates an arbiter with an explicit fallback policy
    pub fn with_fallback_enrichment(fallback_enrichment: FallbackEnrichment) -> Self {
        Self {
            fallback_enrichment,
        }
    }

    /// Arbitrates the settled results into a single enriched identification.
    ///
    /// Sentinel results are excluded regardless of confidence; ties on
    /// confidence resolve to the earliest-registered provider. Never fails
    /// and never returns an absent result.
    pub fn arbitrate(&self, results: &[ShoeIdentification]) -> ShoeIdentification {
        let mut winner: Option<&ShoeIdentification> = None;

        for candidate in results.iter().filter(|r| !r.is_unidentified()) {
            match winner {
                // Strictly greater keeps the first-registered result on ties.
                Some(best) if candidate.confidence > best.confidence => winner = Some(candidate),
                Some(_) => {}
                None => winner = Some(candidate),
            }
        }

        match winner {
            Some(best) => {
                let mut selected = best.clone();
                selected.rarity = Some(assess_rarity(selected.price.usd, &selected.popularity));
                selected
            }
            None => {
                tracing::info!("no provider produced an identification, using fallback result");
                let mut fallback = ShoeIdentification::fallback();
                if self.fallback_enrichment == FallbackEnrichment::WithRarity {
                    fallback.rarity = Some(RarityAssessment {
                        level: RarityLevel::Common,
                        description: RarityLevel::Common.description().to_string(),
                        collector_value: (fallback.price.usd * Self::FALLBACK_MULTIPLIER).round(),
                    });
                }
                fallback
            }
        }
    }
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Rarity Assessment
// =============================================================================

/// Derives the rarity tier and collector value from price and popularity.
///
/// Tiers are evaluated as a descending cascade with strict `>` boundaries:
/// a shoe priced exactly at a boundary stays in the lower tier. Popularity
/// is compared case-insensitively against "low"; a low-popularity shoe is
/// bumped one tier earlier at each price band.
pub fn assess_rarity(price: f64, popularity: &str) -> RarityAssessment {
    let low = popularity.eq_ignore_ascii_case("low");

    let (level, multiplier) = if price > 500.0 || (price > 300.0 && low) {
        (RarityLevel::Legendary, 2.5)
    } else if price > 300.0 || (price > 200.0 && low) {
        (RarityLevel::UltraRare, 2.0)
    } else if price > 200.0 || (price > 150.0 && low) {
        (RarityLevel::Rare, 1.5)
    } else if price > 150.0 || low {
        (RarityLevel::Uncommon, 1.3)
    } else {
        (RarityLevel::Common, 1.2)
    };

    RarityAssessment {
        level,
        description: level.description().to_string(),
        collector_value: (price * multiplier).round(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identify::models::ShoePrice;

    fn result(brand: &str, confidence: f64, usd: f64, popularity: &str) -> ShoeIdentification {
        ShoeIdentification {
            brand: brand.to_string(),
            model: format!("{} model", brand),
            price: ShoePrice {
                usd,
                range: "$0-$0".to_string(),
            },
            release_year: 2021,
            shoe_type: "Lifestyle".to_string(),
            colors: vec!["White".to_string()],
            popularity: popularity.to_string(),
            description: String::new(),
            confidence,
            rarity: None,
        }
    }

    // -------------------------------------------------------------------------
    // Winner Selection Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_highest_confidence_wins() {
        let arbiter = Arbiter::new();
        let results = vec![
            result("Gemini Pick", 0.8, 100.0, "High"),
            ShoeIdentification::unidentified(),
            result("Claude Pick", 0.5, 100.0, "High"),
        ];

        let winner = arbiter.arbitrate(&results);

        assert_eq!(winner.brand, "Gemini Pick");
        let rarity = winner.rarity.unwrap();
        assert_eq!(rarity.level, RarityLevel::Common);
        assert_eq!(rarity.collector_value, 120.0);
    }

    #[test]
    fn test_tie_resolves_to_first_registered() {
        let arbiter = Arbiter::new();
        let results = vec![
            result("First", 0.7, 100.0, "High"),
            result("Second", 0.7, 100.0, "High"),
        ];

        assert_eq!(arbiter.arbitrate(&results).brand, "First");
    }

    #[test]
    fn test_unknown_excluded_regardless_of_confidence() {
        let arbiter = Arbiter::new();
        let mut bogus = ShoeIdentification::unidentified();
        bogus.confidence = 1.0;

        let results = vec![bogus, result("Legit", 0.1, 100.0, "High")];

        assert_eq!(arbiter.arbitrate(&results).brand, "Legit");
    }

    #[test]
    fn test_arbitrate_is_idempotent() {
        let arbiter = Arbiter::new();
        let results = vec![
            result("A", 0.6, 250.0, "Low"),
            result("B", 0.6, 180.0, "High"),
        ];

        let first = arbiter.arbitrate(&results);
        let second = arbiter.arbitrate(&results);

        assert_eq!(first, second);
    }

    // -------------------------------------------------------------------------
    // Fallback Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_all_unknown_returns_plain_fallback() {
        let arbiter = Arbiter::new();
        let results = vec![
            ShoeIdentification::unidentified(),
            ShoeIdentification::unidentified(),
            ShoeIdentification::unidentified(),
        ];

        let outcome = arbiter.arbitrate(&results);

        assert_eq!(outcome, ShoeIdentification::fallback());
        assert!(outcome.rarity.is_none());
    }

    #[test]
    fn test_empty_input_returns_fallback() {
        let arbiter = Arbiter::new();
        let outcome = arbiter.arbitrate(&[]);
        assert_eq!(outcome.brand, "Nike");
    }

    #[test]
    fn test_enriched_fallback_gets_common_rarity() {
        let arbiter = Arbiter::with_fallback_enrichment(FallbackEnrichment::WithRarity);
        let outcome = arbiter.arbitrate(&[]);

        let rarity = outcome.rarity.unwrap();
        assert_eq!(rarity.level, RarityLevel::Common);
        // fallback price 170 x 1.2
        assert_eq!(rarity.collector_value, 204.0);
    }

    // -------------------------------------------------------------------------
    // Rarity Cascade Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tier_multipliers() {
        assert_eq!(assess_rarity(600.0, "High").collector_value, 1500.0); // x2.5
        assert_eq!(assess_rarity(400.0, "High").collector_value, 800.0); // x2.0
        assert_eq!(assess_rarity(250.0, "High").collector_value, 375.0); // x1.5
        assert_eq!(assess_rarity(160.0, "High").collector_value, 208.0); // x1.3
        assert_eq!(assess_rarity(100.0, "High").collector_value, 120.0); // x1.2
    }

    #[test]
    fn test_boundaries_are_strict() {
        // exactly 500 is not Legendary
        assert_eq!(assess_rarity(500.0, "High").level, RarityLevel::UltraRare);
        assert_eq!(assess_rarity(501.0, "High").level, RarityLevel::Legendary);

        assert_eq!(assess_rarity(300.0, "High").level, RarityLevel::Rare);
        assert_eq!(assess_rarity(200.0, "High").level, RarityLevel::Uncommon);
        assert_eq!(assess_rarity(150.0, "High").level, RarityLevel::Common);
    }

    #[test]
    fn test_low_popularity_bumps_tier() {
        assert_eq!(assess_rarity(301.0, "Low").level, RarityLevel::Legendary);
        assert_eq!(assess_rarity(201.0, "Low").level, RarityLevel::UltraRare);
        assert_eq!(assess_rarity(151.0, "Low").level, RarityLevel::Rare);
        assert_eq!(assess_rarity(100.0, "Low").level, RarityLevel::Uncommon);

        // comparison is case-insensitive
        assert_eq!(assess_rarity(100.0, "LOW").level, RarityLevel::Uncommon);
        assert_eq!(assess_rarity(100.0, "low").level, RarityLevel::Uncommon);
    }

    #[test]
    fn test_collector_value_rounds_to_whole_units() {
        // 333 x 2.0 = 666, 111 x 1.2 = 133.2 -> 133
        assert_eq!(assess_rarity(333.0, "High").collector_value, 666.0);
        assert_eq!(assess_rarity(111.0, "High").collector_value, 133.0);
        // 155 x 1.3 = 201.5 -> 202
        assert_eq!(assess_rarity(155.0, "High").collector_value, 202.0);
    }

    #[test]
    fn test_tier_descriptions_are_fixed() {
        let assessment = assess_rarity(600.0, "High");
        assert_eq!(assessment.description, RarityLevel::Legendary.description());
    }
}
