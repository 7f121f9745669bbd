//! Local inference backend — runs a GGUF-quantized model on the host CPU.
//!
//! Uses [Candle](https://github.com/huggingface/candle) so the assistant can
//! answer with zero internet and zero API keys. The assistant hands this
//! backend a fully assembled prompt string and expects only the newly
//! generated text back; no chat template is applied.

use async_trait::async_trait;
use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama as qlm;
use hf_hub::api::sync::Api;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use huurwijzer_core::{GenerateOptions, Generator, GeneratorError};

/// Model presets — friendly aliases resolved to HuggingFace repos + filenames.
struct ModelPreset {
    repo: &'static str,
    gguf_file: &'static str,
    tokenizer_repo: &'static str,
}

fn resolve_preset(alias: &str) -> Option<ModelPreset> {
    let alias_lower = alias.to_lowercase();
    match alias_lower.as_str() {
        "tinyllama" | "tiny-llama" | "tinyllama-1.1b" => Some(ModelPreset {
            repo: "TheBloke/TinyLlama-1.1B-Chat-v1.0-GGUF",
            gguf_file: "tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf",
            tokenizer_repo: "TinyLlama/TinyLlama-1.1B-Chat-v1.0",
        }),
        "qwen:0.5b" | "qwen-0.5b" | "qwen2-0.5b" => Some(ModelPreset {
            repo: "Qwen/Qwen2-0.5B-Instruct-GGUF",
            gguf_file: "qwen2-0_5b-instruct-q4_k_m.gguf",
            tokenizer_repo: "Qwen/Qwen2-0.5B-Instruct",
        }),
        "qwen:1.5b" | "qwen-1.5b" | "qwen2-1.5b" => Some(ModelPreset {
            repo: "Qwen/Qwen2-1.5B-Instruct-GGUF",
            gguf_file: "qwen2-1_5b-instruct-q4_k_m.gguf",
            tokenizer_repo: "Qwen/Qwen2-1.5B-Instruct",
        }),
        "phi2" | "phi-2" => Some(ModelPreset {
            repo: "TheBloke/phi-2-GGUF",
            gguf_file: "phi-2.Q4_K_M.gguf",
            tokenizer_repo: "microsoft/phi-2",
        }),
        _ => None,
    }
}

/// A backend that runs GGUF-quantized models locally via Candle.
///
/// The model sits behind a Mutex because Candle CPU inference is
/// single-threaded; concurrent requests serialize here.
pub struct LocalGenerator {
    inner: Arc<Mutex<Option<LocalModelState>>>,
    model_name: String,
}

struct LocalModelState {
    model: qlm::ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    eos_token_id: u32,
}

impl LocalGenerator {
    /// Create a new local backend.
    ///
    /// `model_name` is either a preset alias (`"qwen:1.5b"`, `"tinyllama"`,
    /// `"phi2"`) or a path to a local GGUF file. The model loads lazily on
    /// first request.
    pub fn new(model_name: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
            model_name: model_name.to_string(),
        }
    }

    /// Eagerly load the model (downloads if needed, then loads into memory).
    pub fn load(model_name: &str) -> Result<Self, GeneratorError> {
        let state = LocalModelState::load(model_name)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Some(state))),
            model_name: model_name.to_string(),
        })
    }

    async fn ensure_loaded(&self) -> Result<(), GeneratorError> {
        let state = self.inner.lock().await;
        if state.is_some() {
            return Ok(());
        }
        drop(state);

        info!(model = %self.model_name, "Loading local model on first request...");
        let name = self.model_name.clone();
        let loaded = tokio::task::spawn_blocking(move || LocalModelState::load(&name))
            .await
            .map_err(|e| GeneratorError::ApiError {
                status_code: 500,
                message: format!("Model loading task failed: {e}"),
            })??;

        let mut state = self.inner.lock().await;
        *state = Some(loaded);
        Ok(())
    }
}

impl LocalModelState {
    fn load(model_name: &str) -> Result<Self, GeneratorError> {
        let device = Device::Cpu;

        if Path::new(model_name).exists() && model_name.ends_with(".gguf") {
            return Self::load_from_path(Path::new(model_name), &device);
        }

        let preset = resolve_preset(model_name).ok_or_else(|| {
            GeneratorError::ModelNotFound(format!(
                "Unknown local model '{model_name}'. Available presets: tinyllama, phi2, \
                 qwen:0.5b, qwen:1.5b. Or provide a path to a .gguf file."
            ))
        })?;

        info!(
            model = model_name,
            repo = preset.repo,
            file = preset.gguf_file,
            "Downloading/loading local model"
        );

        // HF Hub caches downloads automatically
        let api = Api::new().map_err(|e| {
            GeneratorError::Network(format!("Failed to initialize HuggingFace Hub API: {e}"))
        })?;

        let repo = api.model(preset.repo.to_string());
        let model_path = repo.get(preset.gguf_file).map_err(|e| {
            GeneratorError::Network(format!(
                "Failed to download model '{}' from '{}': {e}",
                preset.gguf_file, preset.repo
            ))
        })?;

        let tokenizer_repo = api.model(preset.tokenizer_repo.to_string());
        let tokenizer_path = tokenizer_repo.get("tokenizer.json").map_err(|e| {
            GeneratorError::Network(format!(
                "Failed to download tokenizer from '{}': {e}",
                preset.tokenizer_repo
            ))
        })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            GeneratorError::NotConfigured(format!("Failed to load tokenizer: {e}"))
        })?;

        Self::finish_load(&model_path, tokenizer, &device)
    }

    fn load_from_path(path: &Path, device: &Device) -> Result<Self, GeneratorError> {
        info!(path = %path.display(), "Loading local GGUF model");

        let tokenizer_path = path.with_file_name("tokenizer.json");
        let tokenizer = if tokenizer_path.exists() {
            Tokenizer::from_file(&tokenizer_path).map_err(|e| {
                GeneratorError::NotConfigured(format!("Failed to load tokenizer: {e}"))
            })?
        } else {
            warn!("No tokenizer.json next to GGUF file, downloading Qwen2 tokenizer as fallback");
            let api = Api::new().map_err(|e| {
                GeneratorError::Network(format!("HuggingFace Hub API error: {e}"))
            })?;
            let repo = api.model("Qwen/Qwen2-1.5B-Instruct".to_string());
            let tok_path = repo.get("tokenizer.json").map_err(|e| {
                GeneratorError::Network(format!("Failed to download fallback tokenizer: {e}"))
            })?;
            Tokenizer::from_file(&tok_path).map_err(|e| {
                GeneratorError::NotConfigured(format!("Failed to load tokenizer: {e}"))
            })?
        };

        Self::finish_load(path, tokenizer, device)
    }

    fn finish_load(
        model_path: &Path,
        tokenizer: Tokenizer,
        device: &Device,
    ) -> Result<Self, GeneratorError> {
        let mut file = std::fs::File::open(model_path).map_err(|e| {
            GeneratorError::NotConfigured(format!("Failed to open model file: {e}"))
        })?;

        let gguf = gguf_file::Content::read(&mut file).map_err(|e| {
            GeneratorError::NotConfigured(format!("Failed to parse GGUF file: {e}"))
        })?;

        let model = qlm::ModelWeights::from_gguf(gguf, &mut file, device).map_err(|e| {
            GeneratorError::NotConfigured(format!("Failed to load model weights: {e}"))
        })?;

        let eos_token_id = tokenizer
            .token_to_id("</s>")
            .or_else(|| tokenizer.token_to_id("<|endoftext|>"))
            .or_else(|| tokenizer.token_to_id("<|im_end|>"))
            .unwrap_or(2); // common EOS id fallback

        info!(eos_token_id, "Local model loaded successfully");

        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
            eos_token_id,
        })
    }

    /// Run inference: tokenize → generate tokens → decode the new ones.
    fn generate(&mut self, prompt: &str, options: &GenerateOptions) -> Result<String, GeneratorError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| GeneratorError::ApiError {
                status_code: 500,
                message: format!("Tokenization failed: {e}"),
            })?;

        let prompt_tokens = encoding.get_ids();
        debug!(
            prompt_tokens = prompt_tokens.len(),
            max_new_tokens = options.max_new_tokens,
            temperature = options.temperature,
            "Starting local generation"
        );

        let mut input = Tensor::new(prompt_tokens, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(map_candle_err)?;

        let mut logits_processor = if !options.sample || options.temperature <= 0.0 {
            LogitsProcessor::new(42, None, None)
        } else {
            LogitsProcessor::new(42, Some(options.temperature as f64), None)
        };

        let prompt_len = prompt_tokens.len();
        let mut generated: Vec<u32> = Vec::new();

        for step in 0..options.max_new_tokens {
            let logits = self
                .model
                .forward(&input, index_pos(step, prompt_len, generated.len()))
                .map_err(map_candle_err)?;

            let logits = logits.squeeze(0).map_err(map_candle_err)?;
            let last = logits.dim(0).map_err(map_candle_err)? - 1;
            let logits = logits.get(last).map_err(map_candle_err)?;

            let next_token = logits_processor.sample(&logits).map_err(map_candle_err)?;
            if next_token == self.eos_token_id {
                break;
            }
            generated.push(next_token);

            input = Tensor::new(&[next_token][..], &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(map_candle_err)?;
        }

        let output = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| GeneratorError::ApiError {
                status_code: 500,
                message: format!("Detokenization failed: {e}"),
            })?;

        debug!(
            completion_tokens = generated.len(),
            output_len = output.len(),
            "Generation complete"
        );

        Ok(output)
    }
}

/// Sequence position of the first token in the current forward pass.
///
/// The first pass feeds the whole prompt at position 0; every later pass
/// feeds the single token just sampled, whose position continues the
/// sequence after the prompt and the previously generated tokens.
fn index_pos(step: u32, prompt_len: usize, generated_len: usize) -> usize {
    if step == 0 {
        0
    } else {
        prompt_len + generated_len - 1
    }
}

fn map_candle_err(e: candle_core::Error) -> GeneratorError {
    GeneratorError::ApiError {
        status_code: 500,
        message: format!("Candle inference error: {e}"),
    }
}

#[async_trait]
impl Generator for LocalGenerator {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<String, GeneratorError> {
        self.ensure_loaded().await?;

        let inner = self.inner.clone();
        let prompt = prompt.to_string();
        let options = options.clone();

        // Candle is CPU-bound; run on a blocking thread
        let output = tokio::task::spawn_blocking(move || {
            let mut guard = inner.blocking_lock();
            match guard.as_mut() {
                Some(state) => state.generate(&prompt, &options),
                None => Err(GeneratorError::NotConfigured(
                    "Local model not loaded".into(),
                )),
            }
        })
        .await
        .map_err(|e| GeneratorError::ApiError {
            status_code: 500,
            message: format!("Inference task panicked: {e}"),
        })??;

        // Strip any trailing special tokens the decoder left in
        Ok(output
            .trim()
            .trim_end_matches("</s>")
            .trim_end_matches("<|im_end|>")
            .trim_end_matches("<|endoftext|>")
            .trim()
            .to_string())
    }

    async fn health_check(&self) -> std::result::Result<bool, GeneratorError> {
        // No network needed once the model is on disk
        Ok(true)
    }
}

/// Known preset aliases, for CLI help output.
pub fn preset_aliases() -> Vec<&'static str> {
    vec!["tinyllama", "phi2", "qwen:0.5b", "qwen:1.5b"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_preset_aliases() {
        assert!(resolve_preset("tinyllama").is_some());
        assert!(resolve_preset("TinyLlama").is_some());
        assert!(resolve_preset("qwen:1.5b").is_some());
        assert!(resolve_preset("phi2").is_some());
        assert!(resolve_preset("nonexistent").is_none());
    }

    #[test]
    fn generation_positions_continue_after_prompt() {
        let prompt_len = 12;
        // full prompt goes in at position 0
        assert_eq!(index_pos(0, prompt_len, 0), 0);
        // each sampled token is fed at the next sequence position
        assert_eq!(index_pos(1, prompt_len, 1), 12);
        assert_eq!(index_pos(2, prompt_len, 2), 13);
        assert_eq!(index_pos(3, prompt_len, 3), 14);
    }

    #[test]
    fn default_model_alias_resolves() {
        let config = huurwijzer_config::AppConfig::default();
        assert!(resolve_preset(&config.model).is_some());
    }

    #[tokio::test]
    async fn unknown_alias_fails_without_download() {
        let generator = LocalGenerator::new("no-such-model");
        let err = generator
            .generate("hi", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::ModelNotFound(_)));
    }
}
