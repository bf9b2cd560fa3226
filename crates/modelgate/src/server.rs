use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;

use crate::config::{Config, ConfigError, Credentials};
use crate::handlers;
use crate::http::HttpClient;
use crate::llm::{ProviderKind, ProviderRegistry};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: Arc<Credentials>,
    pub providers: ProviderRegistry,
}

impl AppState {
    /// Wire the outbound HTTP client and provider registry from configuration.
    pub fn new(config: Config, credentials: Credentials) -> Result<Self, ConfigError> {
        let http = HttpClient::new(reqwest::Client::new(), config.http.retry_policy());
        let mut providers = ProviderRegistry::new(http, config.http.request_options());
        for (kind, base_url) in config.base_url_overrides()? {
            providers = providers.with_base_url(kind, base_url);
        }

        Ok(Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            providers,
        })
    }

    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        self.credentials.get(kind)
    }
}

pub fn build_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let max_body_bytes = state.config.server.max_body_bytes;

    let api = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/chat/config", get(handlers::chat_config))
        .route("/generate-image", post(handlers::generate_image))
        .route("/analyze-image", post(handlers::analyze_image))
        .route("/download-image", post(handlers::download_image))
        .layer(DefaultBodyLimit::max(max_body_bytes));

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .nest("/api", api)
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}
