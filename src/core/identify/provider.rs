//! Vision Provider Trait
//!
//! Defines the interface for AI vision backends that identify a shoe from a
//! photo, plus the shared identification prompt and the best-effort JSON
//! extraction every adapter runs on raw provider output.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::image::ImageSource;
use crate::core::{CoreError, CoreResult};

use super::models::ShoeIdentification;

// =============================================================================
// Identification Prompt
// =============================================================================

/// Fixed instruction sent with every provider request.
///
/// Declares the exact JSON schema expected back, forbids surrounding prose,
/// and requires a best guess with low confidence instead of an empty answer.
pub const IDENTIFICATION_PROMPT: &str = r#"Identify this shoe in the image. Provide detailed information in the following JSON format only:
{
  "brand": "Brand name",
  "model": "Model name",
  "price": {
    "usd": approximate price in USD as a number,
    "range": "Price range as a string"
  },
  "releaseYear": year of release as a number,
  "type": "Type of shoe (e.g., Running, Basketball, Casual)",
  "colors": ["Primary color", "Secondary color"],
  "popularity": "High/Medium/Low",
  "description": "Brief description of the shoe",
  "confidence": your confidence in this identification from 0.0 to 1.0
}

If you cannot identify the shoe, provide your best guess and set confidence accordingly.
DO NOT include any other text in your response, only valid JSON."#;

// =============================================================================
// Vision Provider Trait
// =============================================================================

/// Trait for AI vision backends (Gemini, OpenAI, Anthropic, mocks).
///
/// `identify` never fails: every internal failure mode (preprocessing,
/// network, auth, schema drift, hallucinated formatting) is absorbed and
/// converted to the sentinel result, so one bad backend cannot sink the
/// whole identification attempt.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    /// Identifies the shoe in the given image.
    ///
    /// Returns [`ShoeIdentification::unidentified`] on any failure.
    async fn identify(&self, image: &ImageSource) -> ShoeIdentification;

    /// Performs a lightweight connectivity/auth check.
    ///
    /// Should be cheap (no image upload) and must not leak secrets in
    /// error messages.
    async fn health_check(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Checks if the provider is configured (e.g. API key present)
    fn is_available(&self) -> bool;
}

// =============================================================================
// Response Parsing
// =============================================================================

/// Extracts and validates a [`ShoeIdentification`] from raw provider text.
///
/// Providers are instructed to emit only JSON but routinely wrap it in
/// commentary; the first `{` to the last `}` is treated as the candidate
/// object. Extraction failure, malformed JSON, and out-of-range confidence
/// are all reported as an invalid response for the caller to absorb.
pub fn parse_identification(raw: &str) -> CoreResult<ShoeIdentification> {
    let json = extract_json_object(raw).ok_or_else(|| {
        CoreError::InvalidProviderResponse("no JSON object in response".to_string())
    })?;

    let mut parsed: ShoeIdentification = serde_json::from_str(json).map_err(|e| {
        CoreError::InvalidProviderResponse(format!("malformed identification JSON: {}", e))
    })?;

    if !parsed.confidence.is_finite() || !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(CoreError::InvalidProviderResponse(format!(
            "confidence out of range: {}",
            parsed.confidence
        )));
    }

    // Rarity is derived locally during arbitration, never taken from a provider.
    parsed.rarity = None;

    Ok(parsed)
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

// =============================================================================
// Mock Provider (for testing)
// =============================================================================

/// Mock vision provider for tests
pub struct MockVisionProvider {
    name: String,
    result: ShoeIdentification,
    delay: Duration,
    panics: bool,
    available: bool,
    calls: Arc<AtomicUsize>,
}

impl MockVisionProvider {
    /// Creates a mock returning the fallback identification
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            result: ShoeIdentification::fallback(),
            delay: Duration::ZERO,
            panics: false,
            available: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sets the result to return
    pub fn with_result(mut self, result: ShoeIdentification) -> Self {
        self.result = result;
        self
    }

    /// Delays each `identify` call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes `identify` panic, to exercise defensive settle-all handling
    pub fn with_panic(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Sets availability
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Handle to the call counter, usable after the mock is registered
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn identify(&self, _image: &ImageSource) -> ShoeIdentification {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panics {
            panic!("mock provider panic");
        }
        self.result.clone()
    }

    async fn health_check(&self) -> CoreResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(CoreError::ProviderRequestFailed(
                "mock provider unavailable".to_string(),
            ))
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

// =============================================================================
// Tests
// =============================================================================
