//! Static model tables: input capabilities and the selectable model catalog.

use serde::Serialize;

use super::provider::ProviderKind;

// ============================================================================
// Capabilities
// ============================================================================

const IMAGES_GEMINI: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];
const IMAGES_OPENAI: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
const IMAGES_BASIC: &[&str] = &["image/jpeg", "image/png"];
const DOCUMENTS_GEMINI: &[&str] = &[
    "application/pdf",
    "text/plain",
    "text/html",
    "text/css",
    "text/javascript",
    "application/json",
];

struct CapabilitySpec {
    id: &'static str,
    name: &'static str,
    image_types: &'static [&'static str],
    document_types: &'static [&'static str],
    description: &'static str,
}

const fn text_only(
    id: &'static str,
    name: &'static str,
    description: &'static str,
) -> CapabilitySpec {
    CapabilitySpec {
        id,
        name,
        image_types: &[],
        document_types: &[],
        description,
    }
}

static CAPABILITIES: &[CapabilitySpec] = &[
    // Gemini
    CapabilitySpec {
        id: "gemini-1.5-flash",
        name: "Gemini 1.5 Flash",
        image_types: IMAGES_GEMINI,
        document_types: DOCUMENTS_GEMINI,
        description: "Fast Google Gemini model with image and document input",
    },
    CapabilitySpec {
        id: "gemini-1.5-pro",
        name: "Gemini 1.5 Pro",
        image_types: IMAGES_GEMINI,
        document_types: DOCUMENTS_GEMINI,
        description: "Google Gemini Pro with image and document input",
    },
    // OpenAI
    CapabilitySpec {
        id: "gpt-4o",
        name: "GPT-4o",
        image_types: IMAGES_OPENAI,
        document_types: &[],
        description: "OpenAI GPT-4o with image input",
    },
    CapabilitySpec {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        image_types: IMAGES_OPENAI,
        document_types: &[],
        description: "OpenAI GPT-4o Mini with image input",
    },
    CapabilitySpec {
        id: "gpt-4-vision-preview",
        name: "GPT-4 Vision",
        image_types: IMAGES_OPENAI,
        document_types: &[],
        description: "OpenAI GPT-4 Vision preview with image input",
    },
    text_only("gpt-4", "GPT-4", "OpenAI GPT-4, text only"),
    text_only("gpt-3.5-turbo", "GPT-3.5 Turbo", "OpenAI GPT-3.5 Turbo, text only"),
    // Zhipu GLM
    text_only("glm-4", "GLM-4", "Zhipu GLM-4, text only"),
    text_only("glm-4-flash", "GLM-4 Flash", "Zhipu GLM-4 Flash, text only"),
    CapabilitySpec {
        id: "glm-4v",
        name: "GLM-4V",
        image_types: IMAGES_BASIC,
        document_types: &[],
        description: "Zhipu GLM-4V with image input",
    },
    // Groq
    text_only("llama-3.3-70b-versatile", "Llama 3.3 70B", "Groq Llama 3.3 70B, text only"),
    text_only("llama-3.1-8b-instant", "Llama 3.1 8B", "Groq Llama 3.1 8B, text only"),
    text_only("mixtral-8x7b-32768", "Mixtral 8x7B", "Groq Mixtral 8x7B, text only"),
    text_only("gemma2-9b-it", "Gemma 2 9B", "Groq Gemma 2 9B, text only"),
    CapabilitySpec {
        id: "llama-3.2-11b-vision-preview",
        name: "Llama 3.2 11B Vision",
        image_types: IMAGES_BASIC,
        document_types: &[],
        description: "Groq Llama 3.2 11B Vision with image input",
    },
    CapabilitySpec {
        id: "llama-3.2-90b-vision-preview",
        name: "Llama 3.2 90B Vision",
        image_types: IMAGES_BASIC,
        document_types: &[],
        description: "Groq Llama 3.2 90B Vision with image input",
    },
    // DeepSeek
    text_only("deepseek-chat", "DeepSeek Chat", "DeepSeek Chat, text only"),
];

/// Which input modalities a model accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    pub name: String,
    pub supports_image: bool,
    #[serde(rename = "supportedImageTypes")]
    pub supported_image_mime_types: Vec<String>,
    pub supports_document: bool,
    #[serde(rename = "supportedDocumentTypes")]
    pub supported_document_mime_types: Vec<String>,
    pub description: String,
}

impl ModelCapabilities {
    /// Text-only record for a model missing from the table.
    pub fn unknown(model: &str) -> Self {
        Self {
            name: model.to_string(),
            supports_image: false,
            supported_image_mime_types: Vec::new(),
            supports_document: false,
            supported_document_mime_types: Vec::new(),
            description: "Unknown model".to_string(),
        }
    }

    /// Image then document MIME types, comma-joined for a file picker's `accept` filter.
    pub fn accept_types(&self) -> String {
        self.supported_image_mime_types
            .iter()
            .chain(&self.supported_document_mime_types)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn supports_file_input(&self) -> bool {
        self.supports_image || self.supports_document
    }
}

impl From<&CapabilitySpec> for ModelCapabilities {
    fn from(spec: &CapabilitySpec) -> Self {
        let owned = |types: &[&str]| types.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        Self {
            name: spec.name.to_string(),
            supports_image: !spec.image_types.is_empty(),
            supported_image_mime_types: owned(spec.image_types),
            supports_document: !spec.document_types.is_empty(),
            supported_document_mime_types: owned(spec.document_types),
            description: spec.description.to_string(),
        }
    }
}

/// Capabilities for a model id, or a text-only record named after the id.
pub fn model_capabilities(model: &str) -> ModelCapabilities {
    CAPABILITIES
        .iter()
        .find(|spec| spec.id == model)
        .map_or_else(|| ModelCapabilities::unknown(model), ModelCapabilities::from)
}

/// Comma-joined MIME types the model accepts, empty when it takes none.
pub fn supported_file_types(model: &str) -> String {
    model_capabilities(model).accept_types()
}

pub fn supports_file_input(model: &str) -> bool {
    model_capabilities(model).supports_file_input()
}

// ============================================================================
// Available models
// ============================================================================

/// Relative response speed shown in the model picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Fast,
    Normal,
    Slow,
}

/// One entry of the selectable model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableModel {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "serviceType")]
    pub provider: ProviderKind,
    #[serde(rename = "serviceName")]
    pub provider_name: &'static str,
    pub description: &'static str,
    pub supports_image: bool,
    pub supports_document: bool,
    pub is_free: bool,
    pub speed: Speed,
}

/// Selectable chat models, grouped by provider.
pub static AVAILABLE_MODELS: &[AvailableModel] = &[
    AvailableModel {
        id: "llama-3.3-70b-versatile",
        name: "Llama 3.3 70B",
        provider: ProviderKind::Groq,
        provider_name: "Groq",
        description: "Latest Meta model, very fast (free)",
        supports_image: false,
        supports_document: false,
        is_free: true,
        speed: Speed::Fast,
    },
    AvailableModel {
        id: "llama-3.1-8b-instant",
        name: "Llama 3.1 8B",
        provider: ProviderKind::Groq,
        provider_name: "Groq",
        description: "Lightweight fast model (free)",
        supports_image: false,
        supports_document: false,
        is_free: true,
        speed: Speed::Fast,
    },
    AvailableModel {
        id: "mixtral-8x7b-32768",
        name: "Mixtral 8x7B",
        provider: ProviderKind::Groq,
        provider_name: "Groq",
        description: "Mixtral mixture-of-experts model (free)",
        supports_image: false,
        supports_document: false,
        is_free: true,
        speed: Speed::Fast,
    },
    AvailableModel {
        id: "gemma2-9b-it",
        name: "Gemma 2 9B",
        provider: ProviderKind::Groq,
        provider_name: "Groq",
        description: "Google Gemma 2 (free)",
        supports_image: false,
        supports_document: false,
        is_free: true,
        speed: Speed::Fast,
    },
    AvailableModel {
        id: "gemini-1.5-flash",
        name: "Gemini 1.5 Flash",
        provider: ProviderKind::Gemini,
        provider_name: "Google",
        description: "Google model with image and document input (free)",
        supports_image: true,
        supports_document: true,
        is_free: true,
        speed: Speed::Fast,
    },
    AvailableModel {
        id: "gemini-1.5-pro",
        name: "Gemini 1.5 Pro",
        provider: ProviderKind::Gemini,
        provider_name: "Google",
        description: "Google professional tier (free)",
        supports_image: true,
        supports_document: true,
        is_free: true,
        speed: Speed::Normal,
    },
    AvailableModel {
        id: "glm-4-flash",
        name: "GLM-4 Flash",
        provider: ProviderKind::Glm,
        provider_name: "Zhipu AI",
        description: "Fast Zhipu model, strong Chinese (free quota)",
        supports_image: false,
        supports_document: false,
        is_free: true,
        speed: Speed::Fast,
    },
    AvailableModel {
        id: "glm-4",
        name: "GLM-4",
        provider: ProviderKind::Glm,
        provider_name: "Zhipu AI",
        description: "Standard Zhipu model, strong Chinese (free quota)",
        supports_image: false,
        supports_document: false,
        is_free: true,
        speed: Speed::Normal,
    },
    AvailableModel {
        id: "gpt-3.5-turbo",
        name: "GPT-3.5 Turbo",
        provider: ProviderKind::OpenAI,
        provider_name: "OpenAI",
        description: "Classic OpenAI model (paid)",
        supports_image: false,
        supports_document: false,
        is_free: false,
        speed: Speed::Fast,
    },
    AvailableModel {
        id: "gpt-4",
        name: "GPT-4",
        provider: ProviderKind::OpenAI,
        provider_name: "OpenAI",
        description: "Capable OpenAI model (paid)",
        supports_image: false,
        supports_document: false,
        is_free: false,
        speed: Speed::Normal,
    },
    AvailableModel {
        id: "gpt-4o",
        name: "GPT-4o",
        provider: ProviderKind::OpenAI,
        provider_name: "OpenAI",
        description: "Multimodal OpenAI model with image input (paid)",
        supports_image: true,
        supports_document: false,
        is_free: false,
        speed: Speed::Normal,
    },
    AvailableModel {
        id: "deepseek-chat",
        name: "DeepSeek Chat",
        provider: ProviderKind::DeepSeek,
        provider_name: "DeepSeek",
        description: "DeepSeek model (requires balance)",
        supports_image: false,
        supports_document: false,
        is_free: false,
        speed: Speed::Normal,
    },
];

/// Provider serving a catalog model, `None` for ids outside the catalog.
pub fn provider_for_model(model: &str) -> Option<ProviderKind> {
    AVAILABLE_MODELS
        .iter()
        .find(|m| m.id == model)
        .map(|m| m.provider)
}
