//! API error handling
//!
//! Maps the core error taxonomy onto HTTP status classes. Every failure
//! yields a structured `{"error": ...}` body; a missing index is a
//! user-actionable 400, never a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docent_core::DocentError;
use serde::Serialize;

/// Wire shape of every failure response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Application error wrapper carrying the failed pipeline error
#[derive(Debug)]
pub struct AppError(pub DocentError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DocentError::InvalidInput(_) | DocentError::Config(_) => StatusCode::BAD_REQUEST,
            // "Run ingestion first" is a caller problem, not a server fault.
            DocentError::IndexNotFound { .. } => StatusCode::BAD_REQUEST,
            DocentError::NotFound(_) => StatusCode::NOT_FOUND,
            DocentError::EmbeddingService { .. } | DocentError::ChatService { .. } => {
                StatusCode::BAD_GATEWAY
            }
            DocentError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DocentError::DimensionMismatch { .. }
            | DocentError::Store(_)
            | DocentError::Io(_)
            | DocentError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<DocentError> for AppError {
    fn from(err: DocentError) -> Self {
        AppError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(err: DocentError) -> StatusCode {
        AppError(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(DocentError::InvalidInput("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(DocentError::IndexNotFound {
                path: "idx".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(DocentError::NotFound("data".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(DocentError::ChatService {
                status: "500".into(),
                message: "boom".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(DocentError::StoreUnavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(DocentError::Store("corrupt".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
