//! OpenAI Provider Implementation
//!
//! Implements the VisionProvider trait for OpenAI's GPT vision models.

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
// OpenAI Provider
// =============================================================================

/// OpenAI API provider
pub struct OpenAiProvider {
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

impl OpenAiProvider {
    /// Default OpenAI API base URL
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    /// Maximum completion tokens for an identification answer
    const MAX_TOKENS: u32 = 1000;

    /// Creates a new OpenAI provider
    pub fn new(config: ProviderConfig) -> CoreResult<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| CoreError::ValidationError("OpenAI API key is required".to_string()))?;

        if api_key.is_empty() {
            return Err(CoreError::ValidationError(
                "OpenAI API key cannot be empty".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());

        let model = config.model.unwrap_or_else(|| "gpt-5.2".to_string());
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

    fn build_chat_completion_request(&self, image: &EncodedImage) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: IDENTIFICATION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.to_data_url(),
                        },
                    },
                ],
            }],
            max_tokens: Some(Self::MAX_TOKENS),
        }
    }

    async fn request_identification(
        &self,
        image: &ImageSource,
    ) -> CoreResult<ShoeIdentification> {
        let encoded = prepare_image(image, &self.image_options)?;
        let api_request = self.build_chat_completion_request(&encoded);

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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
                "OpenAI API error ({}; type={}): {}",
                status, error_type, error.error.message
            )));
        }

        let api_response: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            CoreError::InvalidProviderResponse(format!("Failed to parse response: {}", e))
        })?;

        let text = api_response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| {
                CoreError::InvalidProviderResponse("No completion choice from OpenAI".to_string())
            })?;

        parse_identification(text)
    }
}

// =============================================================================
// OpenAI API Types
// =============================================================================

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
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
impl VisionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn identify(&self, image: &ImageSource) -> ShoeIdentification {
        match self.request_identification(image).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(provider = "openai", error = %e, "identification failed, returning sentinel");
                ShoeIdentification::unidentified()
            }
        }
    }

    async fn health_check(&self) -> CoreResult<()> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CoreError::ProviderRequestFailed(format!("Health check failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(CoreError::ProviderRequestFailed(format!(
            "OpenAI health check failed ({})",
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
