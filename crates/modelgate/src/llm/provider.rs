//! Provider identifiers, static endpoint table and the chat trait.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use super::error::LLMError;
use super::types::{ChatMessage, ChatOptions};

/// Trait for chat providers with different wire formats.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the conversation and return the assistant's text.
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions)
    -> Result<String, LLMError>;

    /// Human-readable name for logs and error messages.
    fn display_name(&self) -> &str;
}

// ============================================================================
// ProviderKind
// ============================================================================

/// Supported provider vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    DeepSeek,
    Groq,
    Gemini,
    Glm,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAI,
        ProviderKind::DeepSeek,
        ProviderKind::Groq,
        ProviderKind::Gemini,
        ProviderKind::Glm,
    ];

    /// Identifier used in configuration and the HTTP API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Glm => "glm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::DeepSeek => "DeepSeek",
            ProviderKind::Groq => "Groq",
            ProviderKind::Gemini => "Google Gemini",
            ProviderKind::Glm => "智谱 AI",
        }
    }

    /// Environment variable holding the API key.
    pub fn env_key(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Glm => "GLM_API_KEY",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => GEMINI_ENDPOINT,
            other => provider_config(*other).map_or(GEMINI_ENDPOINT, |c| c.endpoint),
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => GEMINI_DEFAULT_MODEL,
            other => provider_config(*other).map_or(GEMINI_DEFAULT_MODEL, |c| c.default_model),
        }
    }

    /// Whether the provider speaks the OpenAI chat-completions schema.
    pub fn is_openai_compatible(&self) -> bool {
        provider_config(*self).is_some()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| LLMError::UnsupportedProvider(s.to_string()))
    }
}

// ============================================================================
// ProviderConfig table
// ============================================================================

pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Connection defaults for one OpenAI-compatible provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub endpoint: &'static str,
    pub default_model: &'static str,
}

impl ProviderConfig {
    pub fn display_name(&self) -> &'static str {
        self.kind.display_name()
    }
}

/// All OpenAI-compatible providers.
pub static OPENAI_COMPATIBLE: &[ProviderConfig] = &[
    ProviderConfig {
        kind: ProviderKind::OpenAI,
        endpoint: "https://api.openai.com/v1",
        default_model: "gpt-3.5-turbo",
    },
    ProviderConfig {
        kind: ProviderKind::DeepSeek,
        endpoint: "https://api.deepseek.com",
        default_model: "deepseek-chat",
    },
    ProviderConfig {
        kind: ProviderKind::Groq,
        endpoint: "https://api.groq.com/openai/v1",
        default_model: "llama-3.3-70b-versatile",
    },
    ProviderConfig {
        kind: ProviderKind::Glm,
        endpoint: "https://open.bigmodel.cn/api/paas/v4",
        default_model: "glm-4-flash",
    },
];

/// Look up the OpenAI-compatible config for a provider. `None` for Gemini.
pub fn provider_config(kind: ProviderKind) -> Option<&'static ProviderConfig> {
    OPENAI_COMPATIBLE.iter().find(|c| c.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identifiers() {
        assert_eq!("groq".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert_eq!(" OpenAI ".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!("glm".parse::<ProviderKind>().unwrap(), ProviderKind::Glm);
    }

    #[test]
    fn unknown_identifier_is_unsupported() {
        let err = "anthropic".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, LLMError::UnsupportedProvider(ref id) if id == "anthropic"));
        assert_eq!(err.to_string(), "unsupported provider: anthropic");
    }

    #[test]
    fn identifiers_round_trip_through_display() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn table_names_come_from_the_kind() {
        for config in OPENAI_COMPATIBLE {
            assert_eq!(config.display_name(), config.kind.display_name());
        }
        assert_eq!(provider_config(ProviderKind::Glm).unwrap().display_name(), "智谱 AI");
    }

    #[test]
    fn gemini_is_not_in_the_compatible_table() {
        assert!(provider_config(ProviderKind::Gemini).is_none());
        assert!(!ProviderKind::Gemini.is_openai_compatible());
        assert_eq!(ProviderKind::Gemini.default_model(), "gemini-1.5-flash");
        assert_eq!(
            ProviderKind::Gemini.default_endpoint(),
            "https://generativelanguage.googleapis.com/v1"
        );
    }

    #[test]
    fn compatible_defaults() {
        let groq = provider_config(ProviderKind::Groq).unwrap();
        assert_eq!(groq.endpoint, "https://api.groq.com/openai/v1");
        assert_eq!(groq.default_model, "llama-3.3-70b-versatile");
        assert_eq!(ProviderKind::DeepSeek.default_model(), "deepseek-chat");
        assert_eq!(ProviderKind::OpenAI.default_model(), "gpt-3.5-turbo");
        assert_eq!(ProviderKind::Glm.env_key(), "GLM_API_KEY");
    }
}
