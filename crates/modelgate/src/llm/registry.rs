//! Provider factory: maps a provider identifier to a chat adapter.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::error::LLMError;
use super::gemini::GeminiProvider;
use super::openai::OpenAICompatibleProvider;
use super::provider::{ChatProvider, ProviderKind, provider_config};
use crate::http::{HttpClient, RequestOptions};

/// Builds chat providers that share one HTTP client and request settings.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    http: HttpClient,
    options: RequestOptions,
    base_urls: HashMap<ProviderKind, String>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new(http: HttpClient, options: RequestOptions) -> Self {
        Self {
            http,
            options,
            base_urls: HashMap::new(),
        }
    }

    /// Point a provider at a different endpoint (proxies, self-hosted gateways, tests).
    #[must_use]
    pub fn with_base_url(mut self, kind: ProviderKind, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(kind, base_url.into());
        self
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn base_url(&self, kind: ProviderKind) -> &str {
        self.base_urls
            .get(&kind)
            .map_or_else(|| kind.default_endpoint(), String::as_str)
    }

    /// Create the adapter for a provider identifier.
    ///
    /// Unknown identifiers fail here rather than at call time.
    pub fn create(
        &self,
        provider: &str,
        api_key: &str,
    ) -> Result<Arc<dyn ChatProvider>, LLMError> {
        let kind: ProviderKind = provider.parse()?;
        Ok(self.create_kind(kind, api_key))
    }

    pub fn create_kind(&self, kind: ProviderKind, api_key: &str) -> Arc<dyn ChatProvider> {
        let base_url = self.base_urls.get(&kind).map(String::as_str);
        debug!(
            provider = %kind,
            base_url = base_url.unwrap_or("default"),
            "Creating chat provider"
        );

        match provider_config(kind) {
            Some(config) => Arc::new(OpenAICompatibleProvider::from_config(
                self.http.clone(),
                api_key.to_string(),
                config,
                base_url,
                self.options.clone(),
            )),
            None => Arc::new(GeminiProvider::new(
                self.http.clone(),
                api_key.to_string(),
                base_url,
                self.options.clone(),
            )),
        }
    }
}
