//! HTTP-facing error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hooktap_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Failure to turn an inbound call into a record.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The body could not be read (transport error or over the size limit).
    #[error("failed to read request body: {0}")]
    BodyUnreadable(String),
    /// The multipart envelope could not be parsed.
    #[error("malformed multipart body: {0}")]
    Malformed(String),
}

/// Error returned from route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client sent something unusable.
    #[error("{0}")]
    BadRequest(String),
    /// Multipart envelope could not be parsed.
    #[error("{0}")]
    MalformedInput(String),
    /// Resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Unexpected server-side failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::MalformedInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::MalformedInput(_) => "MALFORMED_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::BodyUnreadable(_) => Self::BadRequest(err.to_string()),
            IngestError::Malformed(_) => Self::MalformedInput(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BlobNotFound { .. } => Self::NotFound("File not found".into()),
            StoreError::InvalidFilename(_) => Self::BadRequest("Filename required".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_renders_json() {
        let resp = ApiError::NotFound("File not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let v = body_json(resp).await;
        assert_eq!(v["error"]["code"], "NOT_FOUND");
        assert_eq!(v["error"]["message"], "File not found");
    }

    #[test]
    fn ingest_errors_map_to_400() {
        let bad: ApiError = IngestError::BodyUnreadable("length limit exceeded".into()).into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.code(), "BAD_REQUEST");

        let malformed: ApiError = IngestError::Malformed("no boundary".into()).into();
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(malformed.code(), "MALFORMED_INPUT");
        assert!(malformed.to_string().contains("no boundary"));
    }

    #[test]
    fn store_errors_map() {
        let nf: ApiError = StoreError::BlobNotFound {
            filename: "x.pdf".into(),
        }
        .into();
        assert_eq!(nf.status(), StatusCode::NOT_FOUND);

        let empty: ApiError = StoreError::InvalidFilename(String::new()).into();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_is_500() {
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
