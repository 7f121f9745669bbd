//! Deterministic prompt assembly.
//!
//! Joins a system prompt, the conversation so far, and optional extra user
//! content into the flat text a completion backend consumes. Pure string
//! work, no I/O.

use huurwijzer_core::{Conversation, Role};

/// Builds generation prompts from conversation state.
///
/// When `max_history_chars` is set, oldest turns are dropped in pairs until
/// the rendered history fits. `None` keeps the full history.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    max_history_chars: Option<usize>,
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_history_chars(mut self, limit: Option<usize>) -> Self {
        self.max_history_chars = limit;
        self
    }

    /// Assemble a full generation prompt.
    ///
    /// Layout:
    ///
    /// ```text
    /// System: {system_prompt}
    ///
    /// User: ...
    /// Assistant: ...
    /// User: {extra, truncated to max_chars characters}
    /// Assistant:
    /// ```
    ///
    /// `extra` becomes a final user line; it is clipped to at most
    /// `max_chars` characters before rendering. The prompt always ends with
    /// a bare `Assistant:` line the backend is expected to continue.
    pub fn build(
        &self,
        system_prompt: &str,
        history: &Conversation,
        extra: Option<&str>,
        max_chars: usize,
    ) -> String {
        let mut lines: Vec<String> = self
            .bounded_turns(history)
            .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
            .collect();

        if let Some(extra) = extra {
            let clipped = truncate_chars(extra, max_chars);
            lines.push(format!("{}: {}", Role::User.label(), clipped));
        }

        lines.push(format!("{}:", Role::Assistant.label()));

        format!("System: {system_prompt}\n\n{}", lines.join("\n"))
    }

    /// Recover the assistant reply from a backend that may echo the prompt.
    ///
    /// If the output starts with the prompt verbatim, the reply is whatever
    /// follows it. Backends that return only new text pass through as-is.
    pub fn extract_reply(&self, prompt: &str, output: &str) -> String {
        match output.strip_prefix(prompt) {
            Some(suffix) => suffix.trim().to_string(),
            None => output.trim().to_string(),
        }
    }

    fn bounded_turns<'a>(
        &self,
        history: &'a Conversation,
    ) -> impl Iterator<Item = &'a huurwijzer_core::Turn> {
        let turns = history.turns();
        let skip = match self.max_history_chars {
            None => 0,
            Some(limit) => {
                let mut skip = 0;
                while skip < turns.len() && rendered_len(&turns[skip..]) > limit {
                    // drop a full user/assistant pair so the history never
                    // starts mid-exchange
                    skip = (skip + 2).min(turns.len());
                }
                skip
            }
        };
        turns[skip..].iter()
    }
}

fn rendered_len(turns: &[huurwijzer_core::Turn]) -> usize {
    turns
        .iter()
        .map(|t| t.role.label().chars().count() + 2 + t.content.chars().count() + 1)
        .sum()
}

/// Clip `s` to at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
