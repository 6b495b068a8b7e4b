//! SoleMate Error Definitions
//!
//! Defines error types used throughout the crate.

use thiserror::Error;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Connectivity Errors
    // =========================================================================
    #[error("No network connection available")]
    NoConnectivity,

    // =========================================================================
    // Provider Errors
    // =========================================================================
    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Invalid provider response: {0}")]
    InvalidProviderResponse(String),

    // =========================================================================
    // Image Errors
    // =========================================================================
    #[error("Image processing failed: {0}")]
    ImageProcessingFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
