//! Turn and Conversation domain types.
//!
//! These are the core value objects that flow through the system:
//! user sends text → ChatService appends a turn → PromptAssembler renders
//! the history → the backend generates a reply → another turn is appended.

use serde::{Deserialize, Serialize};

/// The role of a speaker in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    /// The label used when rendering a turn into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single turn in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered sequence of turns with shared context.
///
/// Storage is deliberately dumb: append-only growth until an explicit
/// [`reset`](Conversation::reset), no capacity bound, no alternation
/// enforcement. Bounding the prompt is the assembler's job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Always succeeds; insertion order is conversation order.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Read-only view of the turns, in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Remove and return the most recent turn. Used to roll back an
    /// appended turn when generation fails mid-exchange.
    pub fn pop(&mut self) -> Option<Turn> {
        self.turns.pop()
    }

    /// Clear all turns. Idempotent: resetting an empty conversation is a no-op.
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Hello, assistant!");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Hello, assistant!");
    }

    #[test]
    fn role_labels() {
        assert_eq!(Role::User.label(), "User");
        assert_eq!(Role::Assistant.label(), "Assistant");
    }

    #[test]
    fn conversation_preserves_insertion_order() {
        let mut conv = Conversation::new();
        conv.push(Turn::user("first"));
        conv.push(Turn::assistant("second"));
        conv.push(Turn::user("third"));

        let contents: Vec<&str> = conv.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut conv = Conversation::new();
        conv.push(Turn::user("message"));

        conv.reset();
        assert!(conv.is_empty());

        // Resetting again is a no-op success
        conv.reset();
        assert!(conv.is_empty());
        assert_eq!(conv.len(), 0);
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = Turn::assistant("A reply");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"assistant\""));
        let deserialized: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, turn);
    }
}
