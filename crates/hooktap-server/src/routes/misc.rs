//! Liveness, status page, health, and metrics endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse};

use crate::health::{self, HealthCounters, HealthResponse};
use crate::server::AppState;

const VIEWER_PAGE: &str = include_str!("../../assets/viewer.html");

/// GET /
pub async fn root() -> &'static str {
    "hooktap is running. POST to /webhook, watch at /ui."
}

/// GET /test
pub async fn test() -> &'static str {
    "hooktap test endpoint OK"
}

/// GET /ping
pub async fn ping() -> &'static str {
    "PONG"
}

/// GET /ui
pub async fn ui() -> Html<&'static str> {
    Html(VIEWER_PAGE)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let counters = HealthCounters {
        viewers: state.hub.viewer_count(),
        records: state.ledger.len(),
        blobs: state.blobs.len(),
        blob_bytes: state.blobs.total_bytes(),
    };
    Json(health::health_check(state.start_time, counters))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use crate::server::tests::{body_json, test_server};
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Request, StatusCode};
    use bytes::Bytes;
    use hooktap_core::CanonicalRecord;
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn liveness_routes_are_plain_text() {
        let server = test_server();
        for uri in ["/", "/test", "/ping"] {
            let resp = server.router().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let ct = resp.headers()[CONTENT_TYPE].to_str().unwrap().to_owned();
            assert!(ct.starts_with("text/plain"), "{uri}: {ct}");
            assert!(!body_text(resp).await.is_empty());
        }
    }

    #[tokio::test]
    async fn ui_serves_viewer_page() {
        let server = test_server();
        let resp = server.router().oneshot(get("/ui")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_text(resp).await;
        assert!(text.contains("<html"));
        assert!(text.contains("/ws"));
    }

    #[tokio::test]
    async fn health_reports_live_counters() {
        let server = test_server();
        let _ = server.ledger().append(CanonicalRecord::new("POST", "/webhook"));
        let _ = server.blobs().put("a.txt", Bytes::from_static(b"abc")).unwrap();

        let v = body_json(server.router().oneshot(get("/health")).await.unwrap()).await;
        assert_eq!(v["status"], "ok");
        assert_eq!(v["records"], 1);
        assert_eq!(v["blobs"], 1);
        assert_eq!(v["blobBytes"], 3);
        assert_eq!(v["viewers"], 0);
    }

    #[tokio::test]
    async fn metrics_is_prometheus_text() {
        let server = test_server();
        let resp = server.router().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain; version=0.0.4");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = test_server();
        let resp = server.router().oneshot(get("/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
