//! Chat and image providers behind one interface.

mod catalog;
mod error;
mod gemini;
mod image;
mod openai;
mod provider;
mod registry;
mod types;
pub mod vision;

pub use catalog::{
    AVAILABLE_MODELS, AvailableModel, ModelCapabilities, Speed, model_capabilities,
    provider_for_model, supported_file_types, supports_file_input,
};
pub use error::LLMError;
pub use gemini::GeminiProvider;
pub use image::{ImageGenerator, ImageOptions, ImageSize, OpenAIImageGenerator};
pub use openai::OpenAICompatibleProvider;
pub use provider::{
    ChatProvider, GEMINI_DEFAULT_MODEL, GEMINI_ENDPOINT, OPENAI_COMPATIBLE, ProviderConfig,
    ProviderKind, provider_config,
};
pub use registry::ProviderRegistry;
pub use types::{ChatMessage, ChatOptions, ContentPart, ImageDetail, ImageUrl, MessageContent, Role};
