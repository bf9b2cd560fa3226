//! Image generation through the OpenAI images API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::LLMError;
use crate::http::{HttpClient, RequestOptions};

/// Output sizes accepted by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageSize {
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1792x1024")]
    Landscape,
    #[serde(rename = "1024x1792")]
    Portrait,
}

impl ImageSize {
    /// Pick the preset matching the requested orientation.
    pub fn for_dimensions(width: Option<u32>, height: Option<u32>) -> Self {
        match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 && w > h => ImageSize::Landscape,
            (Some(w), Some(h)) if w > 0 && h > 0 && h > w => ImageSize::Portrait,
            _ => ImageSize::Square,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `standard` or `hd`.
    pub quality: Option<String>,
    pub model: Option<String>,
}

/// Anything that turns a prompt into an image URL.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: &ImageOptions) -> Result<String, LLMError>;
}

pub struct OpenAIImageGenerator {
    http: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_quality: String,
    options: RequestOptions,
}

impl OpenAIImageGenerator {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "dall-e-3";
    pub const DEFAULT_QUALITY: &'static str = "standard";

    #[must_use]
    pub fn new(
        http: HttpClient,
        api_key: String,
        base_url: String,
        options: RequestOptions,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model: Self::DEFAULT_MODEL.to_string(),
            default_quality: Self::DEFAULT_QUALITY.to_string(),
            options,
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, model: impl Into<String>, quality: impl Into<String>) -> Self {
        self.default_model = model.into();
        self.default_quality = quality.into();
        self
    }

    fn generations_url(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

#[async_trait]
impl ImageGenerator for OpenAIImageGenerator {
    async fn generate(&self, prompt: &str, options: &ImageOptions) -> Result<String, LLMError> {
        let request = Request {
            model: options.model.as_deref().unwrap_or(&self.default_model),
            prompt,
            n: 1,
            size: ImageSize::for_dimensions(options.width, options.height),
            quality: options.quality.as_deref().unwrap_or(&self.default_quality),
        };

        debug!(model = request.model, size = ?request.size, "Generating image");

        let response = self
            .http
            .post::<Response>(
                &self.generations_url(),
                &request,
                self.options.clone().bearer(&self.api_key)?,
            )
            .await?;

        response
            .data
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or(LLMError::NoImage)
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: ImageSize,
    quality: &'a str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(base_url: &str) -> OpenAIImageGenerator {
        OpenAIImageGenerator::new(
            HttpClient::default(),
            "img-key".to_string(),
            base_url.to_string(),
            RequestOptions::default(),
        )
    }

    #[test]
    fn size_follows_orientation() {
        assert_eq!(ImageSize::for_dimensions(Some(1920), Some(1080)), ImageSize::Landscape);
        assert_eq!(ImageSize::for_dimensions(Some(768), Some(1024)), ImageSize::Portrait);
        assert_eq!(ImageSize::for_dimensions(Some(512), Some(512)), ImageSize::Square);
        assert_eq!(ImageSize::for_dimensions(None, Some(1024)), ImageSize::Square);
        assert_eq!(ImageSize::for_dimensions(Some(0), Some(10)), ImageSize::Square);
    }

    #[test]
    fn size_serializes_as_dimensions() {
        assert_eq!(serde_json::to_value(ImageSize::Landscape).unwrap(), "1792x1024");
        assert_eq!(serde_json::to_value(ImageSize::Portrait).unwrap(), "1024x1792");
        assert_eq!(serde_json::to_value(ImageSize::Square).unwrap(), "1024x1024");
    }

    #[tokio::test]
    async fn returns_first_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(header("Authorization", "Bearer img-key"))
            .and(body_partial_json(json!({
                "model": "dall-e-3",
                "prompt": "a lighthouse at dusk",
                "n": 1,
                "size": "1792x1024",
                "quality": "standard"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created": 1,
                "data": [{"url": "https://images.example.com/1.png"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = ImageOptions {
            width: Some(1600),
            height: Some(900),
            ..ImageOptions::default()
        };
        let url = generator(&server.uri())
            .generate("a lighthouse at dusk", &options)
            .await
            .unwrap();

        assert_eq!(url, "https://images.example.com/1.png");
    }

    #[tokio::test]
    async fn empty_result_is_no_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let err = generator(&server.uri())
            .generate("anything", &ImageOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::NoImage));
        assert_eq!(err.to_string(), "no image produced");
    }
}
