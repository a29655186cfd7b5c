//! API Integration Tests
//!
//! Exercises the HTTP surface against an in-process router wired with stub
//! model clients and a real local index in a temp directory. No network.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use docent_api::{create_router, AppState};
use docent_core::{AppConfig, ChatClient, ChatMessage, Result as DocentResult};
use docent_rag::{Assistant, Ingestor, RagHandles};
use docent_vector::{EmbeddingClient, LocalIndex};
use futures::stream::BoxStream;
use serde_json::{json, Value};
use tower::ServiceExt;

struct StubEmbedding;

#[async_trait]
impl EmbeddingClient for StubEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> DocentResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let mut v = vec![0.0; 3];
                v[i % 3] = 1.0;
                v
            })
            .collect())
    }

    async fn embed_query(&self, _text: &str) -> DocentResult<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn dimension(&self) -> usize {
        3
    }
}

struct StubChat;

#[async_trait]
impl ChatClient for StubChat {
    async fn complete(&self, _messages: &[ChatMessage]) -> DocentResult<String> {
        Ok("a grounded answer".to_string())
    }

    async fn complete_stream(
        &self,
        _messages: &[ChatMessage],
    ) -> DocentResult<BoxStream<'static, DocentResult<String>>> {
        Ok(Box::pin(futures::stream::iter(vec![
            Ok("a grounded".to_string()),
            Ok(" answer".to_string()),
        ])))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Build a router over stub clients with index and data dir under `root`
fn test_app(root: &Path) -> Router {
    let mut config = AppConfig::default();
    config.retrieval.data_dir = root.join("data");
    config.retrieval.chunk_size = 500;
    config.retrieval.chunk_overlap = 100;
    config.store.index_path = root.join("index");

    let embedder: Arc<dyn EmbeddingClient> = Arc::new(StubEmbedding);
    let store = Arc::new(
        LocalIndex::attach(&config.store.index_path, &config.store.collection, 3).unwrap(),
    );
    let chat: Arc<dyn ChatClient> = Arc::new(StubChat);

    let rag = RagHandles {
        ingestor: Arc::new(Ingestor::new(
            embedder.clone(),
            store.clone(),
            config.retrieval.chunk_size,
            config.retrieval.chunk_overlap,
        )),
        assistant: Arc::new(Assistant::new(
            embedder,
            store,
            chat,
            config.retrieval.top_k,
        )),
    };

    create_router(Arc::new(AppState::new(config, rag)))
}

fn json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(json_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_before_ingestion_is_actionable_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(json_request(
            "POST",
            "/chat",
            Some(json!({"userQuestion": "where is my order?"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("run ingestion first"));
}

#[tokio::test]
async fn test_chat_empty_question_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(json_request(
            "POST",
            "/chat",
            Some(json!({"userQuestion": "   "})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert!(json["error"].is_string());
}

// =============================================================================
// Ingestion
// =============================================================================

#[tokio::test]
async fn test_ingest_missing_data_dir_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(json_request("POST", "/ingest", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_ingest_then_chat_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    // 1000 chars with size 500 / overlap 100 -> exactly 3 chunks
    std::fs::write(data.join("faq.txt"), "q".repeat(1000)).unwrap();

    let app = test_app(dir.path());

    let response = app
        .clone()
        .oneshot(json_request("POST", "/ingest", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("3 chunks"), "got: {message}");

    let response = app
        .oneshot(json_request(
            "POST",
            "/chat",
            Some(json!({"userQuestion": "what does the FAQ say?"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["answer"], "a grounded answer");
}

#[tokio::test]
async fn test_reingestion_is_accepted_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("faq.txt"), "q".repeat(1000)).unwrap();

    let app = test_app(dir.path());

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/ingest", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
