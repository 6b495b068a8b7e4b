//! Vision Provider Implementations
//!
//! Concrete implementations of the VisionProvider trait for the supported
//! AI vision backends.

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use serde::{Deserialize, Serialize};

use crate::core::image::ImageOptions;
use crate::core::CoreResult;

use super::provider::VisionProvider;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Supported vision backend types
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Google Gemini vision models
    Gemini,
    /// OpenAI GPT vision models
    OpenAI,
    /// Anthropic Claude vision models
    Anthropic,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Gemini => write!(f, "gemini"),
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderType::Gemini),
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" | "claude" => Ok(ProviderType::Anthropic),
            _ => Err(format!("Unknown provider type: {}", s)),
        }
    }
}

/// Configuration for creating a provider.
///
/// Credentials and endpoints are supplied by the caller; nothing is read
/// from process-wide state and nothing is embedded in source.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Provider type
    pub provider_type: ProviderType,
    /// API key
    pub api_key: Option<String>,
    /// Base URL (for custom endpoints or proxies)
    pub base_url: Option<String>,
    /// Model to use
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Image resize/quality parameters applied before upload
    #[serde(default)]
    pub image_options: ImageOptions,
}

impl ProviderConfig {
    /// Creates a new Google Gemini provider config
    pub fn gemini(api_key: &str) -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            api_key: Some(api_key.to_string()),
            base_url: None,
            model: Some("gemini-3-flash-preview".to_string()),
            timeout_secs: Some(120),
            image_options: ImageOptions::default(),
        }
    }

    /// Creates a new OpenAI provider config
    pub fn openai(api_key: &str) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.to_string()),
            base_url: None,
            model: Some("gpt-5.2".to_string()),
            timeout_secs: Some(60),
            image_options: ImageOptions::default(),
        }
    }

    /// Creates a new Anthropic provider config
    pub fn anthropic(api_key: &str) -> Self {
        Self {
            provider_type: ProviderType::Anthropic,
            api_key: Some(api_key.to_string()),
            base_url: None,
            model: Some("claude-haiku-4-5-20251015".to_string()),
            timeout_secs: Some(60),
            image_options: ImageOptions::default(),
        }
    }

    /// Sets the model
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Sets the base URL
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Sets the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Sets the image preprocessing options
    pub fn with_image_options(mut self, image_options: ImageOptions) -> Self {
        self.image_options = image_options;
        self
    }
}

// =============================================================================
// Provider Factory
// =============================================================================

/// Creates a vision provider from configuration
pub fn create_provider(config: ProviderConfig) -> CoreResult<Box<dyn VisionProvider>> {
    match config.provider_type {
        ProviderType::Gemini => {
            let provider = GeminiProvider::new(config)?;
            Ok(Box::new(provider))
        }
        ProviderType::OpenAI => {
            let provider = OpenAiProvider::new(config)?;
            Ok(Box::new(provider))
        }
        ProviderType::Anthropic => {
            let provider = AnthropicProvider::new(config)?;
            Ok(Box::new(provider))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
