//! Docent Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the Docent system:
//! - Document chunks and retrieval results
//! - Chat message types and the chat-model trait
//! - Common error types
//! - Text chunking
//! - Configuration management

pub mod chunker;
pub mod config;

pub use chunker::split;
pub use config::{
    AppConfig, ChatProvider, ConfigError, LlmConfig, RetrievalConfig, ServerConfig, StoreBackend,
    StoreConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Docent operations
#[derive(Error, Debug)]
pub enum DocentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No index found at {path}; run ingestion first")]
    IndexNotFound { path: String },

    #[error("Dimension mismatch ({context}): expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    #[error("Embedding service error ({status}): {message}")]
    EmbeddingService { status: String, message: String },

    #[error("Chat service error ({status}): {message}")]
    ChatService { status: String, message: String },

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DocentError>;

// ============================================================================
// Document Chunks
// ============================================================================

/// Metadata attached to every chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Identifier of the source document (file name)
    pub source: String,
}

/// A bounded segment of a source document
///
/// Chunks are produced by [`chunker::split`] in document order and are
/// immutable once created. Consecutive chunks of the same document overlap
/// by the configured number of characters so context survives boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content
    pub text: String,

    /// Source metadata
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: ChunkMetadata {
                source: source.into(),
            },
        }
    }
}

/// A retrieved chunk paired with its similarity score
///
/// Higher scores are more similar. Retrieval results are ordered
/// most-similar first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

// ============================================================================
// Chat Messages
// ============================================================================

/// Role of a chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
}

/// A role-tagged message sent to a chat model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a human message
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for chat-model providers
///
/// Implementations abstract over vendor request/response shapes; callers
/// depend only on the role/text contract. Upstream failures surface as
/// [`DocentError::ChatService`]; no automatic retry.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Generate a completion for an ordered sequence of messages
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Generate a streaming completion
    ///
    /// The concatenation of the yielded fragments equals the non-streaming
    /// answer for the same input.
    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<futures::stream::BoxStream<'static, Result<String>>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_constructor() {
        let chunk = Chunk::new("some text", "faq.txt");
        assert_eq!(chunk.text, "some text");
        assert_eq!(chunk.metadata.source, "faq.txt");
    }

    #[test]
    fn test_chat_message_roles() {
        let sys = ChatMessage::system("be helpful");
        let human = ChatMessage::human("hello");

        assert_eq!(sys.role, Role::System);
        assert_eq!(human.role, Role::Human);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::Human).unwrap(), "\"human\"");
    }

    #[test]
    fn test_index_not_found_message_is_actionable() {
        let err = DocentError::IndexNotFound {
            path: "docent_index".to_string(),
        };
        assert!(err.to_string().contains("run ingestion first"));
    }

    #[test]
    fn test_dimension_mismatch_reports_record() {
        let err = DocentError::DimensionMismatch {
            expected: 768,
            actual: 769,
            context: "record 4".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("768"));
        assert!(msg.contains("769"));
        assert!(msg.contains("record 4"));
    }
}
