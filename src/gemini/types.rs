//! Request and response schema for the prediction endpoint, plus the
//! upstream Vertex AI wire types.
//!
//! Inbound fields use snake_case; the upstream API expects camelCase, so the
//! shared structs rename on serialization only.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How aggressively the upstream model filters a category of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyThreshold {
    BlockNone,
    BlockLowAndAbove,
    #[default]
    BlockMediumAndAbove,
    BlockOnlyHigh,
}

/// Per-category safety thresholds. Pure value object embedded in the
/// request; every field defaults to `BLOCK_MEDIUM_AND_ABOVE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetySettings {
    pub sexually_explicit: SafetyThreshold,
    pub hate_speech: SafetyThreshold,
    pub harassment: SafetyThreshold,
    pub dangerous_content: SafetyThreshold,
}

impl SafetySettings {
    /// Map to the upstream category/threshold pairs.
    ///
    /// Order is fixed: sexually-explicit, hate-speech, harassment,
    /// dangerous-content.
    pub fn to_upstream(&self) -> Vec<SafetySetting> {
        vec![
            SafetySetting {
                category: HarmCategory::SexuallyExplicit,
                threshold: self.sexually_explicit,
            },
            SafetySetting {
                category: HarmCategory::HateSpeech,
                threshold: self.hate_speech,
            },
            SafetySetting {
                category: HarmCategory::Harassment,
                threshold: self.harassment,
            },
            SafetySetting {
                category: HarmCategory::DangerousContent,
                threshold: self.dangerous_content,
            },
        ]
    }
}

/// Sampling parameters for one generation call.
///
/// Deserializes from snake_case request fields and serializes with the
/// upstream's camelCase names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f64,
    #[serde(rename(serialize = "maxOutputTokens"))]
    pub max_output_tokens: u32,
    #[serde(rename(serialize = "topK"))]
    pub top_k: u32,
    #[serde(rename(serialize = "topP"))]
    pub top_p: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            max_output_tokens: 8192,
            top_k: 32,
            top_p: 1.0,
        }
    }
}

impl GenerationConfig {
    /// Range-check every field. Runs before any network call.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(invalid(
                "generation_config.temperature",
                "must be within 0.0..=1.0",
            ));
        }
        if self.max_output_tokens > 8192 {
            return Err(invalid(
                "generation_config.max_output_tokens",
                "must be within 0..=8192",
            ));
        }
        if self.top_k > 40 {
            return Err(invalid("generation_config.top_k", "must be within 0..=40"));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(invalid("generation_config.top_p", "must be within 0.0..=1.0"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> Error {
    Error::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Inbound prediction request. Immutable once validated.
#[derive(Debug, Clone, Deserialize)]
pub struct TextGenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub generation_config: GenerationConfig,
    #[serde(default)]
    pub safety_settings: SafetySettings,
}

impl TextGenerationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.prompt.is_empty() {
            return Err(invalid("prompt", "must not be empty"));
        }
        self.generation_config.validate()
    }
}

/// Prediction result returned to the caller.
///
/// Character counts are logical characters, not bytes; Gemini is priced per
/// 1k characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenerationResponse {
    pub text: String,
    pub input_chars: usize,
    pub output_chars: usize,
}

// ── Upstream wire types ──

/// Upstream harm category identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

/// One category/threshold pair in the upstream request.
#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: SafetyThreshold,
}

/// One conversation turn in the upstream request.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

/// Body of the `streamGenerateContent` POST.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerateContentRequest {
    /// Build the single-turn upstream body from a validated request.
    pub fn from_request(request: &TextGenerationRequest) -> Self {
        Self {
            contents: vec![Content {
                role: "USER".to_string(),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: request.generation_config.clone(),
            safety_settings: request.safety_settings.to_upstream(),
        }
    }
}

/// One element of the streamed upstream response array.
///
/// Missing keys are a deserialization error; explicitly empty `candidates`
/// or `parts` arrays are accepted and contribute no text.
#[derive(Debug, Deserialize)]
pub struct CandidateChunk {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: String,
}
