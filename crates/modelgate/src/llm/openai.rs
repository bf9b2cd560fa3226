//! OpenAI-compatible chat provider.
//!
//! Works with OpenAI, DeepSeek, Groq, GLM, and any other API that follows the
//! chat-completions schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::LLMError;
use super::provider::{ChatProvider, ProviderConfig};
use super::types::{ChatMessage, ChatOptions};
use crate::http::{HttpClient, RequestOptions};

/// OpenAI-compatible provider.
pub struct OpenAICompatibleProvider {
    http: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    display_name: String,
    options: RequestOptions,
}

impl OpenAICompatibleProvider {
    /// `options` carries the per-attempt timeout and retry count for every call.
    #[must_use]
    pub fn new(
        http: HttpClient,
        api_key: String,
        base_url: String,
        default_model: String,
        display_name: String,
        options: RequestOptions,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model,
            display_name,
            options,
        }
    }

    /// Build from a static table entry, optionally overriding its endpoint.
    #[must_use]
    pub fn from_config(
        http: HttpClient,
        api_key: String,
        config: &ProviderConfig,
        base_url: Option<&str>,
        options: RequestOptions,
    ) -> Self {
        Self::new(
            http,
            api_key,
            base_url.unwrap_or(config.endpoint).to_string(),
            config.default_model.to_string(),
            config.display_name().to_string(),
            options,
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatProvider for OpenAICompatibleProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LLMError> {
        let request = Request {
            model: options.model.as_deref().unwrap_or(&self.default_model),
            messages,
            temperature: options.temperature_or_default(),
            max_tokens: options.max_tokens_or_default(),
        };

        debug!(
            provider = %self.display_name,
            model = request.model,
            messages = messages.len(),
            "Calling chat completions"
        );

        let response = self
            .http
            .post::<Response>(
                &self.completions_url(),
                &request,
                self.options.clone().bearer(&self.api_key)?,
            )
            .await?;

        response
            .data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LLMError::EmptyMessage {
                provider: self.display_name.clone(),
            })
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
