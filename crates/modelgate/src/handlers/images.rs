//! Image endpoints: generation, prompt extraction and the download proxy.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use super::error::{ApiError, json_body};
use crate::llm::vision::{FALLBACK_PROMPT, analysis_message, clean_prompt};
use crate::llm::{
    ChatOptions, ChatProvider, ImageGenerator, ImageOptions, LLMError, OpenAICompatibleProvider,
    OpenAIImageGenerator, ProviderKind,
};
use crate::server::AppState;

const DEFAULT_DIMENSION: u32 = 1024;
const DEFAULT_CONTENT_TYPE: &str = "image/png";
const ANALYSIS_TEMPERATURE: f64 = 0.7;
const ANALYSIS_MAX_TOKENS: u32 = 1000;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct GenerateImageBody {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageReply {
    image_url: String,
}

/// Width and height are accepted for API compatibility but not used.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageBody {
    #[serde(default)]
    image_base64: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeImageReply {
    prompt: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadImageBody {
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadImageReply {
    data: String,
    content_type: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/generate-image
pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Json<GenerateImageBody>, JsonRejection>,
) -> Result<Json<GenerateImageReply>, ApiError> {
    let body = json_body(body)?;
    let prompt = body
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("prompt must not be empty"))?;
    let api_key = state
        .api_key(ProviderKind::OpenAI)
        .ok_or_else(|| ApiError::missing_key(ProviderKind::OpenAI))?;

    let images = &state.config.images;
    let generator = OpenAIImageGenerator::new(
        state.providers.http().clone(),
        api_key.to_string(),
        images.base_url.clone(),
        state.providers.options().clone(),
    )
    .with_defaults(&images.model, &images.quality);

    let options = ImageOptions {
        width: Some(dimension_or_default(body.width)),
        height: Some(dimension_or_default(body.height)),
        ..ImageOptions::default()
    };

    info!(model = %images.model, "Image generation request");
    let image_url = generator.generate(&prompt, &options).await?;
    Ok(Json(GenerateImageReply { image_url }))
}

/// POST /api/analyze-image
///
/// Asks a vision model to describe the image as a text-to-image prompt.
pub async fn analyze_image(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeImageBody>, JsonRejection>,
) -> Result<Json<AnalyzeImageReply>, ApiError> {
    let body = json_body(body)?;
    let image_base64 = body
        .image_base64
        .filter(|data| !data.is_empty())
        .ok_or_else(|| ApiError::validation("image data must not be empty"))?;
    let api_key = state
        .api_key(ProviderKind::OpenAI)
        .ok_or_else(|| ApiError::missing_key(ProviderKind::OpenAI))?;

    let vision = &state.config.vision;
    let provider = OpenAICompatibleProvider::new(
        state.providers.http().clone(),
        api_key.to_string(),
        vision.base_url.clone(),
        vision.model.clone(),
        ProviderKind::OpenAI.display_name().to_string(),
        state.providers.options().clone(),
    );
    let options = ChatOptions {
        temperature: Some(ANALYSIS_TEMPERATURE),
        max_tokens: Some(ANALYSIS_MAX_TOKENS),
        model: None,
    };

    let raw = match provider
        .chat(&[analysis_message(&image_base64)], &options)
        .await
    {
        Ok(text) => text,
        Err(LLMError::EmptyMessage { .. }) => FALLBACK_PROMPT.to_string(),
        Err(e) => {
            error!(error = %e, "Image analysis failed");
            return Err(ApiError::Upstream("image analysis failed"));
        }
    };

    Ok(Json(AnalyzeImageReply {
        prompt: clean_prompt(&raw),
    }))
}

/// POST /api/download-image
///
/// Fetches a remote image server-side and returns it base64-encoded.
pub async fn download_image(
    State(state): State<AppState>,
    body: Result<Json<DownloadImageBody>, JsonRejection>,
) -> Result<Json<DownloadImageReply>, ApiError> {
    let body = json_body(body)?;
    let image_url = body
        .image_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::validation("image URL must not be empty"))?;

    let url = Url::parse(image_url.trim())
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .ok_or_else(|| ApiError::validation("invalid image URL"))?;

    let response = state
        .providers
        .http()
        .fetch_bytes(url.as_str(), state.providers.options().clone())
        .await
        .map_err(|e| {
            error!(url = %url, error = %e, "Image download failed");
            ApiError::Upstream("image download failed")
        })?;

    Ok(Json(DownloadImageReply {
        data: STANDARD.encode(&response.data),
        content_type: response
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
    }))
}

/// Missing or zero dimensions become 1024.
fn dimension_or_default(value: Option<u32>) -> u32 {
    value.filter(|&d| d > 0).unwrap_or(DEFAULT_DIMENSION)
}
