//! Vertex AI Gemini streaming client module.
//!
//! `types` defines the inbound request/response schema and the upstream wire
//! shapes; `client` performs the streaming `streamGenerateContent` call and
//! reassembles the response.

mod client;
pub mod types;

pub use client::{endpoint_url, GeminiClient};
pub use types::{
    GenerationConfig, SafetySettings, SafetyThreshold, TextGenerationRequest,
    TextGenerationResponse,
};
