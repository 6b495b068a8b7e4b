//! Identification Module
//!
//! Provides multi-provider shoe identification: concurrent provider fan-out,
//! deterministic arbitration, and the observable scan session state.

pub mod arbiter;
pub mod coordinator;
pub mod models;
pub mod provider;
pub mod providers;
pub mod service;
pub mod session;

pub use arbiter::{assess_rarity, Arbiter, FallbackEnrichment};
pub use coordinator::{FanOutCoordinator, ProviderOutcome};
pub use models::{
    RarityAssessment, RarityLevel, ShoeIdentification, ShoePrice, UNKNOWN_BRAND,
};
pub use provider::{
    parse_identification, MockVisionProvider, VisionProvider, IDENTIFICATION_PROMPT,
};
pub use providers::{
    create_provider, AnthropicProvider, GeminiProvider, OpenAiProvider, ProviderConfig,
    ProviderType,
};
pub use service::IdentificationService;
pub use session::{ScanSession, ScanState};
