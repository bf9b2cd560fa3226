//! Modelgate - one HTTP API in front of several chat and image-generation providers.

pub mod config;
pub mod handlers;
pub mod http;
pub mod llm;
pub mod response;
pub mod server;
