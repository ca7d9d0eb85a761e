use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::{ErrorResponse, MessageResponse};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<bson::error::Error> for StoreError {
    fn from(err: bson::error::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Errors surfaced by the HTTP handlers.
///
/// `Upsert` carries store failures from the shelf upsert handlers, which report
/// them under an `error` key rather than `message`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    Store(StoreError),
    Upsert(StoreError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ApiError::*;
        match self {
            NotFound(s) => write!(f, "NotFound: {}", s),
            Store(_) => write!(f, "StoreError"),
            Upsert(_) => write!(f, "UpsertError"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ApiError::*;
        match self {
            Store(e) | Upsert(e) => Some(e),
            NotFound(_) => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::Store(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(MessageResponse::new(msg))).into_response()
            }
            ApiError::Store(e) => {
                tracing::error!(error = %crate::unpack_error(&e), "store call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(MessageResponse::new("Internal Server Error")),
                )
                    .into_response()
            }
            ApiError::Upsert(e) => {
                tracing::error!(error = %crate::unpack_error(&e), "shelf upsert failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal Server Error")),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_maps_to_404_message() {
        let response = ApiError::NotFound("Book not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "message": "Book not found" }));
    }

    #[tokio::test]
    async fn store_failures_report_message() {
        let response = ApiError::Store(StoreError::Backend("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Internal Server Error" })
        );
    }

    #[tokio::test]
    async fn upsert_failures_report_error() {
        let response = ApiError::Upsert(StoreError::Backend("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Internal Server Error" })
        );
    }

    #[test]
    fn display_names_the_variant_only() {
        let err = ApiError::Store(StoreError::InvalidDocument("missing _id".into()));
        assert_eq!(err.to_string(), "StoreError");
        assert_eq!(
            crate::unpack_error(&err),
            "StoreError: Invalid document: missing _id"
        );
    }
}
