//! Google Gemini provider with native API format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::LLMError;
use super::provider::{ChatProvider, GEMINI_DEFAULT_MODEL, GEMINI_ENDPOINT};
use super::types::{ChatMessage, ChatOptions, ContentPart, MessageContent, Role};
use crate::http::{HttpClient, RequestOptions};

const DISPLAY_NAME: &str = "Google Gemini";
const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Gemini provider. Authenticates with a `key` query parameter.
pub struct GeminiProvider {
    http: HttpClient,
    base_url: String,
    api_key: String,
    options: RequestOptions,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(
        http: HttpClient,
        api_key: String,
        base_url: Option<&str>,
        options: RequestOptions,
    ) -> Self {
        Self {
            http,
            base_url: base_url
                .unwrap_or(GEMINI_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            options,
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LLMError> {
        let model = options.model.as_deref().unwrap_or(GEMINI_DEFAULT_MODEL);
        let request = Request {
            contents: to_contents(messages),
            generation_config: GenerationConfig {
                temperature: options.temperature_or_default(),
                max_output_tokens: options.max_tokens_or_default(),
            },
        };

        debug!(
            provider = DISPLAY_NAME,
            model,
            messages = messages.len(),
            "Calling generateContent"
        );

        let response = self
            .http
            .post::<Response>(&self.generate_url(model), &request, self.options.clone())
            .await?;

        response
            .data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| LLMError::EmptyMessage {
                provider: DISPLAY_NAME.to_string(),
            })
    }

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }
}

// --- Request/Response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

// --- Conversions ---

fn to_contents(messages: &[ChatMessage]) -> Vec<Content> {
    messages
        .iter()
        .map(|msg| Content {
            role: match msg.role {
                Role::Assistant => "model",
                Role::System | Role::User => "user",
            },
            parts: match &msg.content {
                MessageContent::Text(text) => vec![Part::Text { text: text.clone() }],
                MessageContent::Parts(parts) => parts.iter().map(to_part).collect(),
            },
        })
        .collect()
}

fn to_part(part: &ContentPart) -> Part {
    match part {
        ContentPart::Text { text } => Part::Text { text: text.clone() },
        ContentPart::ImageUrl { image_url } => {
            let (mime_type, data) = split_data_uri(&image_url.url);
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                },
            }
        }
    }
}

/// Split `data:<mime>;base64,<payload>` into mime type and payload.
///
/// The payload is whatever follows the first comma (the whole input when there
/// is none). The mime type falls back to `image/jpeg` when it cannot be read.
fn split_data_uri(url: &str) -> (&str, &str) {
    let data = url.split_once(',').map_or(url, |(_, payload)| payload);
    let mime_type = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(';'))
        .map(|(mime, _)| mime)
        .filter(|mime| mime.len() > "image/".len() && mime.starts_with("image/"))
        .unwrap_or(FALLBACK_MIME_TYPE);
    (mime_type, data)
}
