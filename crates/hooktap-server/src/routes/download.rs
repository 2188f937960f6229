//! `GET /download/{*filename}`: serve a stored attachment.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::HeaderValue;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use hooktap_core::content_type;
use tracing::debug;

use crate::errors::ApiError;
use crate::server::AppState;

/// Serve `filename` as an attachment.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.blobs.get(&filename)?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        filename.replace('"', "\\\"")
    ))
    .map_err(|_| ApiError::BadRequest("Filename cannot be sent as a header".into()))?;
    let length = bytes.len();

    let mut response = Body::from(bytes).into_response();
    let headers = response.headers_mut();
    let _ = headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type::for_filename(&filename)),
    );
    let _ = headers.insert(CONTENT_DISPOSITION, disposition);
    let _ = headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    debug!(%filename, size = length, "serving attachment");
    Ok(response)
}

/// `GET /download/` with nothing after the prefix.
pub async fn missing_filename() -> ApiError {
    ApiError::BadRequest("Filename required".into())
}

#[cfg(test)]
mod tests {
    use crate::server::tests::{body_json, test_server};
    use axum::body::Body;
    use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
    use axum::http::{Request, StatusCode};
    use bytes::Bytes;
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn serves_stored_bytes_with_headers() {
        let server = test_server();
        let _ = server
            .blobs()
            .put("report.pdf", Bytes::from_static(b"%PDF-data"))
            .unwrap();

        let resp = server.router().oneshot(get("/download/report.pdf")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            resp.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(resp.headers()[CONTENT_LENGTH], "9");
        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"%PDF-data");
    }

    #[tokio::test]
    async fn unknown_extension_is_octet_stream() {
        let server = test_server();
        let _ = server.blobs().put("blob.bin", Bytes::from_static(b"x")).unwrap();
        let resp = server.router().oneshot(get("/download/blob.bin")).await.unwrap();
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/octet-stream");
    }

    #[tokio::test]
    async fn nested_names_are_one_key() {
        let server = test_server();
        let _ = server.blobs().put("a/b.txt", Bytes::from_static(b"hi")).unwrap();
        let resp = server.router().oneshot(get("/download/a/b.txt")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let server = test_server();
        let resp = server.router().oneshot(get("/download/missing.pdf")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let v = body_json(resp).await;
        assert_eq!(v["error"]["message"], "File not found");
    }

    #[tokio::test]
    async fn empty_name_is_400() {
        let server = test_server();
        let resp = server.router().oneshot(get("/download/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["error"]["message"], "Filename required");
    }
}
