//! Resilient JSON HTTP client used for every outbound provider call.

mod client;
mod error;

pub use client::{BytesResponse, HttpClient, HttpResponse, RequestOptions, RetryPolicy};
pub use error::HttpError;
