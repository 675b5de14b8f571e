//! gemini-relay - Streaming text-generation relay for Vertex AI Gemini
//!
//! This library provides the core functionality for the relay service:
//! configuration, credential handling, the streaming Gemini client, and
//! the HTTP prediction endpoint.

pub mod auth;
pub mod config;
pub mod error;
pub mod gemini;
pub mod server;

pub use config::Settings;
pub use error::{Error, Result};
