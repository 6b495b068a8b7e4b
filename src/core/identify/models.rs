//! Identification Data Model
//!
//! Wire-compatible types for provider answers and the derived rarity
//! enrichment attached to the arbitration winner.

use serde::{Deserialize, Serialize};

// =============================================================================
// Shoe Identification
// =============================================================================

/// Brand value marking a non-identification.
///
/// A result carrying this brand is excluded from winner selection regardless
/// of its confidence value.
pub const UNKNOWN_BRAND: &str = "Unknown";

/// Approximate market price of an identified shoe
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoePrice {
    /// Approximate price in USD
    pub usd: f64,
    /// Human-readable price range, e.g. "$160-$180"
    pub range: String,
}

/// One provider's answer for a scanned shoe.
///
/// Constructed from a parsed provider response, or synthesized as the
/// sentinel "could not identify" value on any adapter-level failure.
/// Immutable once returned by an adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoeIdentification {
    /// Brand name, or [`UNKNOWN_BRAND`] for a non-identification
    pub brand: String,
    /// Model name
    pub model: String,
    /// Approximate price
    pub price: ShoePrice,
    /// Year of release, 0 when unknown
    pub release_year: i32,
    /// Shoe type, e.g. "Running", "Basketball", "Casual"
    #[serde(rename = "type")]
    pub shoe_type: String,
    /// Colors, primary first
    pub colors: Vec<String>,
    /// Popularity: High / Medium / Low / Unknown
    pub popularity: String,
    /// Brief description
    pub description: String,
    /// Identification confidence in [0.0, 1.0]
    pub confidence: f64,
    /// Derived rarity enrichment; attached to the arbitration winner only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<RarityAssessment>,
}

impl ShoeIdentification {
    /// The sentinel "could not identify" result.
    ///
    /// Every adapter failure mode collapses to this value.
    pub fn unidentified() -> Self {
        Self {
            brand: UNKNOWN_BRAND.to_string(),
            model: "Could not identify".to_string(),
            price: ShoePrice {
                usd: 0.0,
                range: "Unknown".to_string(),
            },
            release_year: 0,
            shoe_type: "Unknown".to_string(),
            colors: vec!["Unknown".to_string()],
            popularity: "Unknown".to_string(),
            description: "Sorry, we couldn't identify this shoe. Please try again with a clearer image.".to_string(),
            confidence: 0.0,
            rarity: None,
        }
    }

    /// The fixed fallback identification returned when every provider is
    /// excluded. A canned, clearly-labeled example so downstream consumers
    /// can always assume a result is present.
    pub fn fallback() -> Self {
        Self {
            brand: "Nike".to_string(),
            model: "Air Jordan 1 Retro High OG".to_string(),
            price: ShoePrice {
                usd: 170.0,
                range: "$160-$180".to_string(),
            },
            release_year: 2021,
            shoe_type: "Basketball/Lifestyle".to_string(),
            colors: vec![
                "University Blue".to_string(),
                "White".to_string(),
                "Black".to_string(),
            ],
            popularity: "High".to_string(),
            description: "The Air Jordan 1 Retro High OG 'University Blue' features a University Blue leather upper with black and white accents throughout the shoe. A white midsole and black outsole complete the design.".to_string(),
            confidence: 0.92,
            rarity: None,
        }
    }

    /// Whether this result is the sentinel non-identification
    pub fn is_unidentified(&self) -> bool {
        self.brand == UNKNOWN_BRAND
    }

    /// Stable identifier used as the rating key (brand-model-price)
    pub fn shoe_id(&self) -> String {
        format!("{}-{}-{}", self.brand, self.model, self.price.usd)
    }
}

// =============================================================================
// Rarity
// =============================================================================

/// Rarity tier derived from price and popularity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RarityLevel {
    Common,
    Uncommon,
    Rare,
    #[serde(rename = "Ultra Rare")]
    UltraRare,
    Legendary,
}

impl RarityLevel {
    /// Fixed descriptive sentence for the tier
    pub fn description(&self) -> &'static str {
        match self {
            RarityLevel::Common => "A widely available shoe with steady market supply.",
            RarityLevel::Uncommon => "A sought-after shoe that is getting harder to find at retail.",
            RarityLevel::Rare => "A hard-to-find shoe that trades well above its retail price.",
            RarityLevel::UltraRare => "A very limited release that is highly prized by collectors.",
            RarityLevel::Legendary => "A grail-level shoe that rarely appears on the open market.",
        }
    }
}

impl std::fmt::Display for RarityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RarityLevel::Common => write!(f, "Common"),
            RarityLevel::Uncommon => write!(f, "Uncommon"),
            RarityLevel::Rare => write!(f, "Rare"),
            RarityLevel::UltraRare => write!(f, "Ultra Rare"),
            RarityLevel::Legendary => write!(f, "Legendary"),
        }
    }
}

/// Derived rarity classification and collector-value estimate.
///
/// Computed once during arbitration and attached to the winning result;
/// never recomputed and never taken from a provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityAssessment {
    /// Rarity tier
    pub level: RarityLevel,
    /// Fixed tier description
    pub description: String,
    /// Estimated collector value in whole USD
    pub collector_value: f64,
}

// =============================================================================
// Tests
// =============================================================================
