//! OpenAI-compatible remote backend.
//!
//! Works with OpenAI, Ollama, vLLM, llama.cpp server, and any endpoint
//! exposing the `/v1/completions` surface. The assistant assembles a full
//! prompt string itself, so the legacy completions endpoint is the right
//! fit: one prompt in, one continuation out.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use huurwijzer_core::{GenerateOptions, Generator, GeneratorError};

/// A generation backend speaking the OpenAI completions protocol.
pub struct OpenAiCompatGenerator {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatGenerator {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// OpenAI convenience constructor.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key, model)
    }

    /// Ollama convenience constructor. Ollama doesn't need a real key.
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama",
            model,
        )
    }
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<String, GeneratorError> {
        let url = format!("{}/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": options.max_new_tokens,
            "temperature": if options.sample { options.temperature } else { 0.0 },
            "stream": false,
        });

        debug!(backend = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout(e.to_string())
                } else {
                    GeneratorError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(GeneratorError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(GeneratorError::ModelNotFound(self.model.clone()));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(GeneratorError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| GeneratorError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GeneratorError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        Ok(choice.text)
    }

    async fn health_check(&self) -> std::result::Result<bool, GeneratorError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- Completions API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_constructor() {
        let generator = OpenAiCompatGenerator::openai("sk-test", "gpt-4o-mini");
        assert_eq!(generator.name(), "openai");
        assert!(generator.base_url.contains("api.openai.com"));
    }

    #[test]
    fn ollama_constructor_defaults() {
        let generator = OpenAiCompatGenerator::ollama(None, "qwen2:1.5b");
        assert_eq!(generator.name(), "ollama");
        assert!(generator.base_url.contains("localhost:11434"));
    }

    #[test]
    fn trailing_slash_stripped_from_base_url() {
        let generator = OpenAiCompatGenerator::new("custom", "http://host/v1/", "", "m");
        assert_eq!(generator.base_url, "http://host/v1");
    }

    #[test]
    fn parse_completion_response() {
        let data = r#"{"choices":[{"text":" Hi there!","index":0,"finish_reason":"stop"}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].text, " Hi there!");
    }

    #[test]
    fn parse_empty_choices() {
        let data = r#"{"choices":[]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
