//! Ingestion handler

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Ingestion response body
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: String,
}

/// Handle ingestion requests
///
/// Reads every `.txt` file from the configured data directory, chunks and
/// embeds them, and writes the records to the vector store. Takes no body.
pub async fn ingest_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let data_dir = &state.config.retrieval.data_dir;
    tracing::info!(dir = %data_dir.display(), "ingestion requested");

    let count = state.rag.ingestor.ingest_dir(data_dir).await?;

    Ok((
        StatusCode::OK,
        Json(IngestResponse {
            message: format!("Successfully ingested {count} chunks"),
        }),
    ))
}
