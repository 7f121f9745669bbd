//! Generator trait — the abstraction over text-generation backends.
//!
//! A Generator takes a fully assembled prompt string and returns generated
//! text. Tokenization, sampling, and decoding are the backend's business;
//! the assistant only deals in strings.
//!
//! Implementations: OpenAI-compatible remote endpoints, local GGUF models
//! via Candle.

use crate::error::GeneratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling options for a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Maximum number of new tokens to generate.
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Temperature (0.0 = deterministic, 1.0 = creative).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Whether to sample (true) or decode greedily (false).
    #[serde(default = "default_true")]
    pub sample: bool,

    /// Number of beams. The assistant always requests 1; kept so the wire
    /// format matches backends that accept it.
    #[serde(default = "default_beams")]
    pub beams: u32,
}

fn default_max_new_tokens() -> u32 {
    150
}
fn default_temperature() -> f32 {
    0.7
}
fn default_true() -> bool {
    true
}
fn default_beams() -> u32 {
    1
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            sample: true,
            beams: default_beams(),
        }
    }
}

impl GenerateOptions {
    /// Options with a different token budget, other settings unchanged.
    /// The document-analysis path uses this for its longer replies.
    pub fn with_max_new_tokens(mut self, max: u32) -> Self {
        self.max_new_tokens = max;
        self
    }
}

/// The core Generator trait.
///
/// Every backend (remote API, local model) implements this. The ChatService
/// calls `generate()` without knowing which backend is in use.
///
/// Backends should return only newly generated text. A backend that echoes
/// the prompt verbatim as a prefix of its output is also supported — reply
/// extraction strips the echo — but that mode is fragile and discouraged.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this backend (e.g., "openai", "local").
    fn name(&self) -> &str;

    /// Generate a continuation of `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<String, GeneratorError>;

    /// Health check — is the backend reachable?
    async fn health_check(&self) -> std::result::Result<bool, GeneratorError> {
        Ok(true)
    }
}
