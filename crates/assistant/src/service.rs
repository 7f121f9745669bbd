//! The chat service.
//!
//! Owns the process-wide conversation and orchestrates each exchange:
//! append the incoming turn, assemble the prompt, call the generation
//! backend, persist and return the reply. A single async mutex makes the
//! whole exchange atomic, so concurrent requests serialize instead of
//! interleaving their turns.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use huurwijzer_config::AppConfig;
use huurwijzer_core::{Conversation, Error, GenerateOptions, Generator, Turn};

use crate::assembler::{PromptAssembler, truncate_chars};
use crate::{document, prompt};

/// The turn persisted to history in place of the raw contract text.
const CONTRACT_MARKER: &str = "[Contract uploaded] Please analyze this contract.";

/// The analysis request rendered around the (truncated) contract excerpt.
const ANALYSIS_REQUEST_TEMPLATE: &str = "I have uploaded a rental contract. Review the following \
excerpt and summarize the key terms (rent, deposit, duration, notice period) and flag any unusual \
clauses or potential red flags for an expat tenant:\n\n";

/// Chat orchestration over a generation backend.
pub struct ChatService {
    generator: Arc<dyn Generator>,
    system_prompt: String,
    assembler: PromptAssembler,
    chat_options: GenerateOptions,
    analysis_options: GenerateOptions,
    contract_max_chars: usize,
    conversation: Mutex<Conversation>,
}

impl ChatService {
    pub fn new(generator: Arc<dyn Generator>, system_prompt: impl Into<String>) -> Self {
        Self {
            generator,
            system_prompt: system_prompt.into(),
            assembler: PromptAssembler::new(),
            chat_options: GenerateOptions::default(),
            analysis_options: GenerateOptions::default().with_max_new_tokens(400),
            contract_max_chars: 2000,
            conversation: Mutex::new(Conversation::new()),
        }
    }

    /// Build a service from configuration, rendering the system prompt from
    /// the configured domain data.
    pub fn from_config(config: &AppConfig, generator: Arc<dyn Generator>) -> Result<Self, Error> {
        let system_prompt = prompt::render_system_prompt(&config.domain)?;
        let base = GenerateOptions {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            ..GenerateOptions::default()
        };
        Ok(Self {
            generator,
            system_prompt,
            assembler: PromptAssembler::new().with_max_history_chars(config.max_history_chars),
            analysis_options: base.clone().with_max_new_tokens(config.analysis_max_new_tokens),
            chat_options: base,
            contract_max_chars: config.contract_max_chars,
            conversation: Mutex::new(Conversation::new()),
        })
    }

    pub fn with_contract_max_chars(mut self, max: usize) -> Self {
        self.contract_max_chars = max;
        self
    }

    /// Handle one chat message: persist the user turn, generate, persist
    /// and return the reply.
    ///
    /// On generation failure the user turn is rolled back, so the history
    /// only ever holds completed exchanges.
    pub async fn handle_message(&self, text: &str) -> Result<String, Error> {
        let mut conversation = self.conversation.lock().await;
        conversation.push(Turn::user(text));

        let prompt = self
            .assembler
            .build(&self.system_prompt, &conversation, None, usize::MAX);
        debug!(prompt_chars = prompt.chars().count(), "assembled chat prompt");

        let output = match self.generator.generate(&prompt, &self.chat_options).await {
            Ok(output) => output,
            Err(e) => {
                conversation.pop();
                warn!(backend = self.generator.name(), error = %e, "generation failed");
                return Err(e.into());
            }
        };

        let reply = self.assembler.extract_reply(&prompt, &output);
        conversation.push(Turn::assistant(reply.clone()));
        info!(
            turns = conversation.len(),
            reply_chars = reply.chars().count(),
            "chat exchange complete"
        );
        Ok(reply)
    }

    /// Handle an uploaded contract: extract its text, persist a short
    /// marker turn, and generate an analysis with a larger token budget.
    ///
    /// The raw contract text never enters the history; only the truncated
    /// excerpt flows into the prompt for this one exchange.
    pub async fn handle_document(&self, filename: &str, bytes: &[u8]) -> Result<String, Error> {
        let text = document::extract_text(filename, bytes)?;
        let excerpt = truncate_chars(&text, self.contract_max_chars);
        let request = format!("{ANALYSIS_REQUEST_TEMPLATE}{excerpt}");
        info!(
            filename,
            extracted_chars = text.chars().count(),
            excerpt_chars = excerpt.chars().count(),
            "contract text extracted"
        );

        let mut conversation = self.conversation.lock().await;
        conversation.push(Turn::user(CONTRACT_MARKER));

        let max_chars = request.chars().count();
        let prompt =
            self.assembler
                .build(&self.system_prompt, &conversation, Some(&request), max_chars);

        let output = match self.generator.generate(&prompt, &self.analysis_options).await {
            Ok(output) => output,
            Err(e) => {
                conversation.pop();
                warn!(backend = self.generator.name(), error = %e, "analysis failed");
                return Err(e.into());
            }
        };

        let analysis = self.assembler.extract_reply(&prompt, &output);
        conversation.push(Turn::assistant(analysis.clone()));
        Ok(analysis)
    }

    /// Clear the conversation. Idempotent.
    pub async fn reset(&self) {
        self.conversation.lock().await.reset();
        info!("conversation reset");
    }

    /// Snapshot of the conversation turns, in order.
    pub async fn snapshot(&self) -> Vec<Turn> {
        self.conversation.lock().await.turns().to_vec()
    }

    pub async fn turn_count(&self) -> usize {
        self.conversation.lock().await.len()
    }
}
