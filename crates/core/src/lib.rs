//! # Huurwijzer Core
//!
//! Domain types, traits, and error definitions for the huurwijzer rental
//! assistant. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The generation backend is defined as a trait here; implementations live
//! in the providers crate. This enables:
//! - Swapping backends (local model, remote API) via configuration
//! - Easy testing with stub generators
//! - Clean dependency graph (all crates depend inward on core)

pub mod conversation;
pub mod error;
pub mod generator;

// Re-export key types at crate root for ergonomics
pub use conversation::{Conversation, Role, Turn};
pub use error::{DocumentError, Error, GeneratorError, PromptError, Result};
pub use generator::{GenerateOptions, Generator};
