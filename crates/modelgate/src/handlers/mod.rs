//! HTTP request handlers.

mod chat;
mod error;
mod health;
mod images;

pub use chat::{chat, chat_config};
pub use error::ApiError;
pub use health::{livez, readyz};
pub use images::{analyze_image, download_image, generate_image};
