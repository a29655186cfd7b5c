//! Embedding client for generating vector representations
//!
//! Wraps the Gemini embedding API. Document texts are embedded through the
//! batch endpoint (one HTTP call per batch rather than one per chunk);
//! queries go through the single-text endpoint with the retrieval-query
//! task type.

use std::time::Duration;

use async_trait::async_trait;
use docent_core::{DocentError, LlmConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The Gemini API rejects batches above this size.
const MAX_BATCH: usize = 100;

// ============================================================================
// Embedding Trait
// ============================================================================

/// Trait for embedding generation
///
/// Output sequence length and order exactly match the input sequence; every
/// vector has the provider's fixed dimension. Upstream failures surface as
/// [`DocentError::EmbeddingService`] — never a silent zero vector.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a batch of document texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a query (query-time task type)
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Fixed embedding dimension
    fn dimension(&self) -> usize;
}

// ============================================================================
// Gemini Embedding Client
// ============================================================================

/// Gemini embedding API client
pub struct GeminiEmbedding {
    client: Client,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: ContentParts,
    task_type: String,
}

#[derive(Debug, Serialize)]
struct ContentParts {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedding {
    /// Create a new Gemini embedding client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "text-embedding-004" => 768,
            "embedding-001" => 768,
            "gemini-embedding-001" => 3072,
            _ => 768, // Default
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .gemini_api_key
            .as_ref()
            .ok_or_else(|| DocentError::Config("Gemini API key required".to_string()))?;

        Ok(Self::new(
            api_key.clone(),
            config.embedding_model.clone(),
            config.timeout_secs,
        ))
    }

    fn request_for(&self, text: &str, task_type: &str) -> EmbedContentRequest {
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: ContentParts {
                parts: vec![TextPart {
                    text: text.to_string(),
                }],
            },
            task_type: task_type.to_string(),
        }
    }

    /// Embed up to [`MAX_BATCH`] texts in one API call
    async fn embed_one_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| self.request_for(t, "RETRIEVAL_DOCUMENT"))
                .collect(),
        };

        let response = self
            .client
            .post(format!(
                "{GEMINI_API_BASE}/models/{}:batchEmbedContents",
                self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::EmbeddingService {
                status: "transport".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DocentError::EmbeddingService {
                status: status.to_string(),
                message,
            });
        }

        let result: BatchEmbedResponse =
            response
                .json()
                .await
                .map_err(|e| DocentError::EmbeddingService {
                    status: "invalid response".to_string(),
                    message: e.to_string(),
                })?;

        if result.embeddings.len() != texts.len() {
            return Err(DocentError::EmbeddingService {
                status: "invalid response".to_string(),
                message: format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    result.embeddings.len()
                ),
            });
        }

        Ok(result.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingClient for GeminiEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            embeddings.extend(self.embed_one_batch(batch).await?);
        }

        for vector in &embeddings {
            if vector.len() != self.dimension {
                return Err(DocentError::EmbeddingService {
                    status: "invalid response".to_string(),
                    message: format!(
                        "model returned dimension {}, expected {}",
                        vector.len(),
                        self.dimension
                    ),
                });
            }
        }

        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let request = self.request_for(text, "RETRIEVAL_QUERY");

        let response = self
            .client
            .post(format!(
                "{GEMINI_API_BASE}/models/{}:embedContent",
                self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::EmbeddingService {
                status: "transport".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DocentError::EmbeddingService {
                status: status.to_string(),
                message,
            });
        }

        let result: EmbedContentResponse =
            response
                .json()
                .await
                .map_err(|e| DocentError::EmbeddingService {
                    status: "invalid response".to_string(),
                    message: e.to_string(),
                })?;

        Ok(result.embedding.values)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config
pub fn create_embedding_client(config: &LlmConfig) -> Result<Box<dyn EmbeddingClient>> {
    Ok(Box::new(GeminiEmbedding::from_config(config)?))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_dimension() {
        let client = GeminiEmbedding::new("test-key", "text-embedding-004", 60);
        assert_eq!(client.dimension(), 768);

        let client = GeminiEmbedding::new("test-key", "gemini-embedding-001", 60);
        assert_eq!(client.dimension(), 3072);
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let config = LlmConfig::default();
        assert!(GeminiEmbedding::from_config(&config).is_err());
    }

    #[test]
    fn test_batch_request_shape() {
        let client = GeminiEmbedding::new("test-key", "text-embedding-004", 60);
        let request = client.request_for("hello", "RETRIEVAL_DOCUMENT");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "models/text-embedding-004");
        assert_eq!(json["taskType"], "RETRIEVAL_DOCUMENT");
        assert_eq!(json["content"]["parts"][0]["text"], "hello");
    }
}
