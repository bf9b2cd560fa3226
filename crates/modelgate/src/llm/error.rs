//! LLM error types.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when calling a chat or image provider.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Transport failure, timeout, or non-success upstream status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The provider answered but the expected text was missing.
    #[error("{provider} returned an empty message")]
    EmptyMessage { provider: String },

    /// No adapter exists for the requested provider identifier.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The image provider returned no results.
    #[error("no image produced")]
    NoImage,
}
