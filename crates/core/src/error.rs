//! Error types for the huurwijzer domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all huurwijzer operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Generation backend errors ---
    #[error("Generation failed: {0}")]
    Generator(#[from] GeneratorError),

    // --- Document extraction errors ---
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    // --- System prompt rendering errors ---
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Generation timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from the contract-upload extraction path.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported file type: {0} (expected .pdf or .txt)")]
    UnsupportedFileType(String),

    #[error("Text file is not valid UTF-8: {0}")]
    Decode(String),

    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),
}

impl DocumentError {
    /// Stable machine-readable code for the wire error response.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::UnsupportedFileType(_) => "unsupported_file_type",
            DocumentError::Decode(_) => "decode_error",
            DocumentError::Extraction(_) => "extraction_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Missing substitution key in system prompt template: {0}")]
    MissingKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_error_displays_correctly() {
        let err = Error::Generator(GeneratorError::ApiError {
            status_code: 503,
            message: "model overloaded".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn document_error_kinds() {
        assert_eq!(
            DocumentError::UnsupportedFileType("contract.docx".into()).kind(),
            "unsupported_file_type"
        );
        assert_eq!(
            DocumentError::Decode("invalid byte at 12".into()).kind(),
            "decode_error"
        );
        assert_eq!(
            DocumentError::Extraction("no pages".into()).kind(),
            "extraction_error"
        );
    }

    #[test]
    fn unsupported_file_type_names_the_file() {
        let err = DocumentError::UnsupportedFileType("contract.docx".into());
        assert!(err.to_string().contains("contract.docx"));
        assert!(err.to_string().contains(".pdf or .txt"));
    }
}
