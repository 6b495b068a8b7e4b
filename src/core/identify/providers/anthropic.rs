//! Anthropic Provider Implementation
//!
//! Implements the VisionProvider trait for Anthropic's Claude vision models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderConfig;
use crate::core::identify::models::ShoeIdentification;
use crate::core::identify::provider::{
    parse_identification, VisionProvider, IDENTIFICATION_PROMPT,
};
use crate::core::image::{prepare_image, EncodedImage, ImageOptions, ImageSource};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Anthropic Provider
// =============================================================================

/// Anthropic API provider for Claude models
pub struct AnthropicProvider {
    /// API key
    api_key: String,
    /// Base URL for API requests
    base_url: String,
    /// Vision model
    model: String,
    /// Image preprocessing parameters
    image_options: ImageOptions,
    /// HTTP client
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Default Anthropic API base URL
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    /// API version header
    pub const API_VERSION: &'static str = "2023-06-01";

    /// Maximum completion tokens for an identification answer
    const MAX_TOKENS: u32 = 1000;

    /// Creates a new Anthropic provider
    pub fn new(config: ProviderConfig) -> CoreResult<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            CoreError::ValidationError("Anthropic API key is required".to_string())
        })?;

        if api_key.is_empty() {
            return Err(CoreError::ValidationError(
                "Anthropic API key cannot be empty".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());

        let model = config
            .model
            .unwrap_or_else(|| "claude-haiku-4-5-20251015".to_string());
        let timeout_secs = config.timeout_secs.unwrap_or(60);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url,
            model,
            image_options: config.image_options,
            client,
        })
    }

    fn build_messages_request(&self, image: &EncodedImage) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: Self::MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Text {
                        text: IDENTIFICATION_PROMPT.to_string(),
                    },
                    ContentBlock::Image {
                        source: ImageBlockSource {
                            source_type: "base64".to_string(),
                            media_type: image.mime_type().to_string(),
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
        }
    }

    async fn request_identification(
        &self,
        image: &ImageSource,
    ) -> CoreResult<ShoeIdentification> {
        let encoded = prepare_image(image, &self.image_options)?;
        let api_request = self.build_messages_request(&encoded);

        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| CoreError::ProviderRequestFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CoreError::ProviderRequestFailed(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            let error: ApiError = serde_json::from_str(&body).unwrap_or(ApiError {
                error: ApiErrorDetail {
                    message: body.clone(),
                    error_type: None,
                },
            });
            let error_type = error.error.error_type.as_deref().unwrap_or("unknown");
            return Err(CoreError::ProviderRequestFailed(format!(
                "Anthropic API error ({}; type={}): {}",
                status, error_type, error.error.message
            )));
        }

        let api_response: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            CoreError::InvalidProviderResponse(format!("Failed to parse response: {}", e))
        })?;

        let text = api_response
            .content
            .iter()
            .find_map(|block| block.text.as_deref())
            .ok_or_else(|| {
                CoreError::InvalidProviderResponse(
                    "No text content block from Anthropic".to_string(),
                )
            })?;

        parse_identification(text)
    }
}

// =============================================================================
// Anthropic API Types
// =============================================================================

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageBlockSource },
}

#[derive(Serialize)]
struct ImageBlockSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// =============================================================================
// VisionProvider Implementation
// =============================================================================

#[async_trait]
impl VisionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn identify(&self, image: &ImageSource) -> ShoeIdentification {
        match self.request_identification(image).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(provider = "anthropic", error = %e, "identification failed, returning sentinel");
                ShoeIdentification::unidentified()
            }
        }
    }

    async fn health_check(&self) -> CoreResult<()> {
        let url = format!("{}/v1/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .send()
            .await
            .map_err(|e| CoreError::ProviderRequestFailed(format!("Health check failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(CoreError::ProviderRequestFailed(format!(
            "Anthropic health check failed ({})",
            response.status()
        )))
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
