//! Docent RAG - Retrieval-Augmented Generation pipeline
//!
//! This crate implements the two request pipelines of the system:
//! - ingestion: read `.txt` documents, chunk, embed in batches, bulk-write
//!   to the vector store
//! - chat: embed the question, retrieve the most similar chunks, assemble a
//!   grounded prompt, and dispatch to the chat model
//!
//! Both pipelines run against dependency-injected clients constructed once
//! at startup by [`build_components`].

use std::path::Path;
use std::sync::Arc;

use docent_core::{
    chunker, AppConfig, ChatClient, ChatMessage, Chunk, DocentError, Result, StoreBackend,
};
use docent_vector::{
    create_embedding_client, EmbeddedChunk, EmbeddingClient, LocalIndex, QdrantStore, VectorStore,
};
use futures::stream::BoxStream;

pub mod llm;

pub use llm::{create_chat_client, GeminiChat, GroqChat};

// ============================================================================
// Prompt assembly
// ============================================================================

const PERSONA: &str =
    "You are Docent, the organisation's support assistant. Answer the user's question using \
     only the documentation excerpts provided below.";

const FALLBACK_DIRECTIVE: &str =
    "If the answer is not in the context, politely suggest the user to 'Contact Support for \
     more information' in a professional way. Do not invent an answer.";

/// Build the grounding system instruction: fixed persona, the literal
/// retrieved context, and the fallback directive. The directive is a
/// behavioural contract enforced by instruction; the orchestrator cannot
/// verify the model obeyed it.
fn build_system_prompt(context: &str) -> String {
    format!("{PERSONA}\nUse the following context to answer:\n---\n{context}\n---\n{FALLBACK_DIRECTIVE}")
}

// ============================================================================
// Ingestion pipeline
// ============================================================================

/// Ingestion pipeline: documents in, indexed records out
pub struct Ingestor {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Ingestor {
    /// Create a new ingestor
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Ingest every `.txt` file under `dir`; returns the chunk count written.
    ///
    /// Appends only: ingesting the same directory twice stores every record
    /// twice. There is no dedup or update-in-place.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Err(DocentError::NotFound(format!(
                "data directory {} not found",
                dir.display()
            )));
        }

        let mut files: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        files.sort();

        let mut chunks: Vec<Chunk> = Vec::new();
        for path in &files {
            let text = std::fs::read_to_string(path)?;
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file_chunks =
                chunker::split(&text, &source, self.chunk_size, self.chunk_overlap)?;
            tracing::debug!(source = %source, chunks = file_chunks.len(), "document chunked");
            chunks.extend(file_chunks);
        }

        tracing::info!(
            files = files.len(),
            chunks = chunks.len(),
            "embedding ingested documents"
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let records: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk::new(chunk, vector))
            .collect();

        let written = self.store.add_records(&records).await?;
        self.store.persist().await?;

        tracing::info!(records = written, store = self.store.name(), "ingestion complete");
        Ok(written)
    }
}

// ============================================================================
// Retrieval orchestrator
// ============================================================================

/// Retrieval orchestrator: answers questions grounded in retrieved chunks
pub struct Assistant {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatClient>,
    top_k: usize,
}

impl Assistant {
    /// Create a new assistant
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatClient>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            chat,
            top_k,
        }
    }

    /// Retrieve context for `question` and build the message pair to send.
    async fn prepare_messages(&self, question: &str) -> Result<Vec<ChatMessage>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DocentError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let query_vector = self.embedder.embed_query(question).await?;
        let results = self.store.search(&query_vector, self.top_k).await?;
        tracing::debug!(
            retrieved = results.len(),
            store = self.store.name(),
            "context retrieved"
        );

        let context = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(vec![
            ChatMessage::system(build_system_prompt(&context)),
            ChatMessage::human(question),
        ])
    }

    /// Answer a question grounded in the indexed documents
    pub async fn answer(&self, question: &str) -> Result<String> {
        let messages = self.prepare_messages(question).await?;

        let answer = self.chat.complete(&messages).await?;
        tracing::info!(
            provider = self.chat.name(),
            answer_chars = answer.len(),
            "chat response received"
        );
        Ok(answer)
    }

    /// Streaming variant of [`Assistant::answer`]
    ///
    /// Yields text fragments whose concatenation equals the non-streaming
    /// answer for the same input.
    pub async fn answer_stream(
        &self,
        question: &str,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let messages = self.prepare_messages(question).await?;
        self.chat.complete_stream(&messages).await
    }
}

// ============================================================================
// Startup wiring
// ============================================================================

/// The pipeline handles shared by the API server and the CLI
pub struct RagHandles {
    pub ingestor: Arc<Ingestor>,
    pub assistant: Arc<Assistant>,
}

/// Construct the embedding client, vector store, and chat client from
/// config and wire the two pipelines.
///
/// For the remote backend this performs the startup heartbeat: an
/// unreachable store is logged and the process continues, so later requests
/// fail gracefully instead of the whole service being unusable.
pub async fn build_components(config: &AppConfig) -> Result<RagHandles> {
    let embedder: Arc<dyn EmbeddingClient> = Arc::from(create_embedding_client(&config.llm)?);

    let store: Arc<dyn VectorStore> = match config.store.backend {
        StoreBackend::Local => Arc::new(LocalIndex::attach(
            &config.store.index_path,
            &config.store.collection,
            embedder.dimension(),
        )?),
        StoreBackend::Qdrant => {
            let store = QdrantStore::connect(
                &config.store.qdrant_url,
                &config.store.collection,
                embedder.dimension(),
            )?;
            match store.heartbeat().await {
                Ok(()) => {
                    tracing::info!(url = %config.store.qdrant_url, "vector store reachable");
                    store.ensure_collection().await?;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "vector store unreachable at startup; continuing");
                }
            }
            Arc::new(store)
        }
    };

    let chat: Arc<dyn ChatClient> = Arc::from(create_chat_client(&config.llm)?);

    let ingestor = Arc::new(Ingestor::new(
        embedder.clone(),
        store.clone(),
        config.retrieval.chunk_size,
        config.retrieval.chunk_overlap,
    ));
    let assistant = Arc::new(Assistant::new(
        embedder,
        store,
        chat,
        config.retrieval.top_k,
    ));

    Ok(RagHandles {
        ingestor,
        assistant,
    })
}

// ============================================================================
// Tests
// ============================================================================
