//! Liveness and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;

use crate::server::AppState;

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Ready once at least one provider API key is configured.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.credentials.configured().next().is_some() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "no provider credentials")
    }
}
