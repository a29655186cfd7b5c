//! Docent Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Vector store configuration
    pub store: StoreConfig,

    /// Embedding / chat model configuration
    pub llm: LlmConfig,

    /// Retrieval pipeline configuration
    pub retrieval: RetrievalConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server
        if let Ok(host) = std::env::var("DOCENT_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("DOCENT_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DOCENT_PORT".to_string(),
                value: port,
            })?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Vector store
        if let Ok(backend) = std::env::var("VECTOR_BACKEND") {
            config.store.backend = backend.parse()?;
        }
        if let Ok(path) = std::env::var("INDEX_PATH") {
            config.store.index_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.store.qdrant_url = url;
        }
        if let Ok(name) = std::env::var("COLLECTION_NAME") {
            config.store.collection = name;
        }

        // LLM
        if let Ok(provider) = std::env::var("CHAT_PROVIDER") {
            config.llm.provider = provider.parse()?;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.llm.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            config.llm.groq_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(secs) = std::env::var("LLM_TIMEOUT_SECS") {
            config.llm.timeout_secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LLM_TIMEOUT_SECS".to_string(),
                value: secs,
            })?;
        }

        // Retrieval
        if let Ok(dir) = std::env::var("DATA_DIR") {
            config.retrieval.data_dir = PathBuf::from(dir);
        }
        if let Ok(size) = std::env::var("CHUNK_SIZE") {
            config.retrieval.chunk_size = size.parse().map_err(|_| ConfigError::InvalidValue {
                key: "CHUNK_SIZE".to_string(),
                value: size,
            })?;
        }
        if let Ok(overlap) = std::env::var("CHUNK_OVERLAP") {
            config.retrieval.chunk_overlap =
                overlap.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "CHUNK_OVERLAP".to_string(),
                    value: overlap,
                })?;
        }
        if let Ok(k) = std::env::var("TOP_K") {
            config.retrieval.top_k = k.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TOP_K".to_string(),
                value: k,
            })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        config.retrieval.validate()?;

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        config.retrieval.validate()?;
        Ok(config)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS (empty permits any origin)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec![],
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which store variant to use
    pub backend: StoreBackend,

    /// Directory holding the serialized local index
    pub index_path: PathBuf,

    /// Qdrant gRPC URL (remote variant)
    pub qdrant_url: String,

    /// Collection name identifying the logical document set
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Local,
            index_path: PathBuf::from("docent_index"),
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "docent_docs".to_string(),
        }
    }
}

/// Supported vector store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Local,
    Qdrant,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "qdrant" => Ok(Self::Qdrant),
            _ => Err(ConfigError::InvalidValue {
                key: "VECTOR_BACKEND".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Embedding / chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat-model provider to use
    pub provider: ChatProvider,

    /// Gemini API key (embeddings and Gemini chat)
    pub gemini_api_key: Option<String>,

    /// Groq API key (Groq chat)
    pub groq_api_key: Option<String>,

    /// Chat model name
    pub chat_model: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds for all upstream calls
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ChatProvider::Gemini,
            gemini_api_key: None,
            groq_api_key: None,
            chat_model: "gemini-2.0-flash".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            max_tokens: 2048,
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

/// Supported chat-model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    #[default]
    Gemini,
    Groq,
}

impl std::str::FromStr for ChatProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "groq" => Ok(Self::Groq),
            _ => Err(ConfigError::InvalidValue {
                key: "CHAT_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Retrieval pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Directory holding the `.txt` documents to ingest
    pub data_dir: PathBuf,

    /// Chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    pub top_k: usize,
}

impl RetrievalConfig {
    /// Validate chunking and retrieval parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "CHUNK_OVERLAP".to_string(),
                value: format!(
                    "overlap {} must be smaller than chunk size {}",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TOP_K".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            chunk_size: 800,
            chunk_overlap: 100,
            top_k: 3,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl From<ConfigError> for crate::DocentError {
    fn from(err: ConfigError) -> Self {
        crate::DocentError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.retrieval.chunk_size, 800);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.store.backend, StoreBackend::Local);
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("local".parse::<StoreBackend>().unwrap(), StoreBackend::Local);
        assert_eq!(
            "qdrant".parse::<StoreBackend>().unwrap(),
            StoreBackend::Qdrant
        );
        assert!("hnsw".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_chat_provider_parse() {
        assert_eq!("gemini".parse::<ChatProvider>().unwrap(), ChatProvider::Gemini);
        assert_eq!("groq".parse::<ChatProvider>().unwrap(), ChatProvider::Groq);
        assert!("openai".parse::<ChatProvider>().is_err());
    }

    #[test]
    fn test_retrieval_validation() {
        let mut retrieval = RetrievalConfig::default();
        assert!(retrieval.validate().is_ok());

        retrieval.chunk_overlap = retrieval.chunk_size;
        assert!(retrieval.validate().is_err());

        let mut retrieval = RetrievalConfig::default();
        retrieval.top_k = 0;
        assert!(retrieval.validate().is_err());
    }
}
