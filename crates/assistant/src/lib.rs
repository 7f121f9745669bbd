//! The assistant core: system prompt rendering, bounded prompt assembly,
//! contract text extraction, and the chat service that ties them to a
//! generation backend.

pub mod assembler;
pub mod document;
pub mod prompt;
pub mod service;

pub use assembler::PromptAssembler;
pub use prompt::render_system_prompt;
pub use service::ChatService;
