//! Chat handlers

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User's question
    #[serde(rename = "userQuestion")]
    pub user_question: String,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Generated answer
    pub answer: String,
}

/// Handle chat requests
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let answer = state.rag.assistant.answer(&req.user_question).await?;

    Ok((StatusCode::OK, Json(ChatResponse { answer })))
}

/// Handle streaming chat requests
///
/// Emits the answer as SSE text fragments; retrieval and prompt assembly
/// failures are reported before the stream starts, stream-time failures as
/// `error` events.
pub async fn chat_stream_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state.increment_requests();

    let fragments = state
        .rag
        .assistant
        .answer_stream(&req.user_question)
        .await?;

    let stream = fragments.map(|fragment| {
        Ok(match fragment {
            Ok(text) => Event::default().data(text),
            Err(e) => Event::default().event("error").data(e.to_string()),
        })
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
