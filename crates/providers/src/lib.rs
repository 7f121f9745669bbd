//! Generation backend implementations for huurwijzer.
//!
//! All backends implement the `huurwijzer_core::Generator` trait.
//! `build_from_config` selects the right backend from configuration.

#[cfg(feature = "local")]
pub mod local;
pub mod openai_compat;

#[cfg(feature = "local")]
pub use local::LocalGenerator;
pub use openai_compat::OpenAiCompatGenerator;

use std::sync::Arc;

use huurwijzer_config::AppConfig;
use huurwijzer_core::{Generator, GeneratorError};

/// Build the configured generation backend.
///
/// `backend` selects the implementation:
/// - `"local"` — Candle GGUF inference (needs the `local` build feature)
/// - `"openai"` / `"ollama"` — well-known OpenAI-compatible endpoints
/// - anything starting with `http` — a custom OpenAI-compatible base URL
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Generator>, GeneratorError> {
    let api_key = config.api_key.clone().unwrap_or_default();

    match config.backend.as_str() {
        "local" => build_local(&config.model),
        "openai" => Ok(Arc::new(OpenAiCompatGenerator::openai(
            api_key,
            &config.model,
        ))),
        "ollama" => Ok(Arc::new(OpenAiCompatGenerator::ollama(
            config.api_url.as_deref(),
            &config.model,
        ))),
        custom if custom.starts_with("http") => Ok(Arc::new(OpenAiCompatGenerator::new(
            "custom",
            custom,
            api_key,
            &config.model,
        ))),
        other => {
            if let Some(url) = &config.api_url {
                return Ok(Arc::new(OpenAiCompatGenerator::new(
                    other,
                    url,
                    api_key,
                    &config.model,
                )));
            }
            Err(GeneratorError::NotConfigured(format!(
                "Unknown backend '{other}'. Use 'local', 'openai', 'ollama', a base URL, \
                 or set api_url."
            )))
        }
    }
}

#[cfg(feature = "local")]
fn build_local(model: &str) -> Result<Arc<dyn Generator>, GeneratorError> {
    Ok(Arc::new(local::LocalGenerator::new(model)))
}

#[cfg(not(feature = "local"))]
fn build_local(_model: &str) -> Result<Arc<dyn Generator>, GeneratorError> {
    Err(GeneratorError::NotConfigured(
        "This binary was built without the 'local' feature. Rebuild with \
         --features local, or configure a remote backend."
            .into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_backend_from_config() {
        let config = AppConfig {
            backend: "openai".into(),
            api_key: Some("sk-test".into()),
            model: "gpt-4o-mini".into(),
            ..AppConfig::default()
        };
        let generator = build_from_config(&config).unwrap();
        assert_eq!(generator.name(), "openai");
    }

    #[test]
    fn custom_url_backend_from_config() {
        let config = AppConfig {
            backend: "http://localhost:8080/v1".into(),
            ..AppConfig::default()
        };
        let generator = build_from_config(&config).unwrap();
        assert_eq!(generator.name(), "custom");
    }

    #[test]
    fn named_backend_needs_api_url() {
        let config = AppConfig {
            backend: "my-inference-box".into(),
            api_url: None,
            ..AppConfig::default()
        };
        assert!(build_from_config(&config).is_err());
    }

    #[test]
    fn named_backend_with_api_url() {
        let config = AppConfig {
            backend: "my-inference-box".into(),
            api_url: Some("http://10.0.0.5:8000/v1".into()),
            ..AppConfig::default()
        };
        let generator = build_from_config(&config).unwrap();
        assert_eq!(generator.name(), "my-inference-box");
    }

    #[cfg(not(feature = "local"))]
    #[test]
    fn local_backend_without_feature_is_not_configured() {
        let config = AppConfig::default(); // backend = "local"
        let err = build_from_config(&config).err().unwrap();
        assert!(matches!(err, GeneratorError::NotConfigured(_)));
    }
}
