//! Chat endpoints.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ApiError, json_body};
use crate::llm::{
    AVAILABLE_MODELS, AvailableModel, ChatMessage, ChatOptions, ContentPart, ImageDetail,
    MessageContent, ModelCapabilities, ProviderKind, model_capabilities, provider_for_model,
};
use crate::server::AppState;

/// Text sent with an image when the user typed nothing.
const DEFAULT_IMAGE_QUESTION: &str = "请分析这张图片";
/// Text sent when a dropped image was the only input.
const DEFAULT_GREETING: &str = "你好";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    message: Option<String>,
    /// Base64 data URI.
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    model_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatReply {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfigReply {
    current_model: String,
    service_type: String,
    service_name: String,
    model_name: String,
    model_description: String,
    file_input_supported: bool,
    accept_types: String,
    #[serde(flatten)]
    capabilities: CapabilityFlags,
    available_models: &'static [AvailableModel],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CapabilityFlags {
    supports_image: bool,
    supported_image_types: Vec<String>,
    supports_document: bool,
    supported_document_types: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let body = json_body(body)?;
    let message = non_empty(body.message);
    let image = non_empty(body.image);

    if message.is_none() && image.is_none() {
        return Err(ApiError::validation("message must not be empty"));
    }

    let (kind, model) = match non_empty(body.model_id) {
        Some(model_id) => {
            let kind = provider_for_model(&model_id)
                .ok_or_else(|| ApiError::unsupported(format!("unsupported model: {model_id}")))?;
            (kind, model_id)
        }
        None => {
            let kind = state
                .config
                .chat
                .default_provider
                .parse::<ProviderKind>()
                .map_err(|e| ApiError::unsupported(e.to_string()))?;
            (kind, kind.default_model().to_string())
        }
    };

    let api_key = state
        .api_key(kind)
        .ok_or_else(|| ApiError::missing_key(kind))?;
    let capabilities = model_capabilities(&model);
    let (content, warning) = build_content(kind, &capabilities, message, image);

    info!(
        provider = %kind,
        model = %model,
        multimodal = matches!(content, MessageContent::Parts(_)),
        "Chat request"
    );

    let provider = state.providers.create_kind(kind, api_key);
    let reply = provider
        .chat(&[ChatMessage::user(content)], &ChatOptions::with_model(&model))
        .await?;

    let message = match warning {
        Some(warning) => format!("{warning}\n\n{reply}"),
        None => reply,
    };
    Ok(Json(ChatReply { message }))
}

/// GET /api/chat/config
pub async fn chat_config(State(state): State<AppState>) -> Json<ChatConfigReply> {
    let service_type = state.config.chat.default_provider.clone();
    let (current_model, service_name) = match service_type.parse::<ProviderKind>() {
        Ok(kind) => (kind.default_model(), kind.display_name().to_string()),
        Err(_) => (ProviderKind::Groq.default_model(), service_type.clone()),
    };

    let capabilities = model_capabilities(current_model);
    Json(ChatConfigReply {
        current_model: current_model.to_string(),
        service_type,
        service_name,
        model_name: capabilities.name.clone(),
        model_description: capabilities.description.clone(),
        file_input_supported: capabilities.supports_file_input(),
        accept_types: capabilities.accept_types(),
        capabilities: CapabilityFlags {
            supports_image: capabilities.supports_image,
            supported_image_types: capabilities.supported_image_mime_types,
            supports_document: capabilities.supports_document,
            supported_document_types: capabilities.supported_document_mime_types,
        },
        available_models: AVAILABLE_MODELS,
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Empty strings count as absent; whitespace is kept and forwarded.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Build the user message content, dropping the image when the model cannot read it.
///
/// Returns the warning to prepend to the reply when an image was dropped.
fn build_content(
    kind: ProviderKind,
    capabilities: &ModelCapabilities,
    message: Option<String>,
    image: Option<String>,
) -> (MessageContent, Option<String>) {
    match image {
        Some(image) if capabilities.supports_image => {
            let text = message.unwrap_or_else(|| DEFAULT_IMAGE_QUESTION.to_string());
            let parts = vec![
                ContentPart::text(text),
                ContentPart::image(image, Some(ImageDetail::Auto)),
            ];
            (MessageContent::Parts(parts), None)
        }
        Some(_) => {
            warn!(
                provider = %kind,
                model = %capabilities.name,
                "Model cannot read images, dropping image"
            );
            let warning = format!(
                "提示：当前使用的 {} ({}) 不支持图片识别功能，已忽略图片。\
                 如需使用图片识别，请切换到 Gemini 或 OpenAI GPT-4o 服务。",
                kind.display_name(),
                capabilities.name
            );
            let text = message.unwrap_or_else(|| DEFAULT_GREETING.to_string());
            (MessageContent::Text(text), Some(warning))
        }
        None => (MessageContent::Text(message.unwrap_or_default()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: &str = "data:image/png;base64,QQ==";

    #[test]
    fn image_kept_for_vision_model() {
        let caps = model_capabilities("gemini-1.5-flash");
        let (content, warning) =
            build_content(ProviderKind::Gemini, &caps, None, Some(IMAGE.to_string()));

        assert!(warning.is_none());
        assert_eq!(
            content,
            MessageContent::Parts(vec![
                ContentPart::text(DEFAULT_IMAGE_QUESTION),
                ContentPart::image(IMAGE, Some(ImageDetail::Auto)),
            ])
        );
    }

    #[test]
    fn image_dropped_for_text_model() {
        let caps = model_capabilities("llama-3.3-70b-versatile");
        let (content, warning) = build_content(
            ProviderKind::Groq,
            &caps,
            Some("what is this?".to_string()),
            Some(IMAGE.to_string()),
        );

        assert_eq!(content, MessageContent::Text("what is this?".to_string()));
        assert_eq!(
            warning.as_deref(),
            Some(
                "提示：当前使用的 Groq (Llama 3.3 70B) 不支持图片识别功能，已忽略图片。\
                 如需使用图片识别，请切换到 Gemini 或 OpenAI GPT-4o 服务。"
            )
        );
    }

    #[test]
    fn dropped_image_without_text_sends_greeting() {
        let caps = model_capabilities("deepseek-chat");
        let (content, warning) =
            build_content(ProviderKind::DeepSeek, &caps, None, Some(IMAGE.to_string()));

        assert_eq!(content, MessageContent::Text(DEFAULT_GREETING.to_string()));
        assert!(warning.is_some());
    }

    #[test]
    fn text_only_message() {
        let caps = model_capabilities("gpt-4o");
        let (content, warning) =
            build_content(ProviderKind::OpenAI, &caps, Some("hi".to_string()), None);

        assert_eq!(content, MessageContent::Text("hi".to_string()));
        assert!(warning.is_none());
    }

    #[test]
    fn only_empty_strings_are_absent() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("   ".to_string())), Some("   ".to_string()));
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
    }
}
