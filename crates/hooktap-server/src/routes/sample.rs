//! `ANY /webhook/thoughtspot`: capture the call, then answer the way a
//! scheduled-report delivery endpoint would.
//!
//! The response is a fixed `multipart/mixed` document: a JSON metadata part
//! describing the report, followed by a base64-encoded sample PDF.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::http::header::{CONTENT_TYPE, SERVER};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Months, SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::errors::ApiError;
use crate::ingest;
use crate::routes::webhook::commit;
use crate::server::AppState;

/// Boundary of the multipart response.
pub const SAMPLE_BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

const SIGNATURE_HEADER: &str = "x-webhook-signature";
const SAMPLE_SIGNATURE: &str = "sha256=abc123def456ghi789jkl012mno345pqr678stu901vwx234yz";
const SAMPLE_SERVER: &str = "COMS-Webhook/1.0";

const SAMPLE_PDF: &str = "%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595.44 841.92] >>
endobj
xref
0 4
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
trailer
<< /Size 4 /Root 1 0 R >>
startxref
192
%%EOF";

/// Handler for every method on `/webhook/thoughtspot`.
pub async fn thoughtspot(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    let record = ingest::normalize_raw(req, state.config.max_body_bytes).await?;
    let _ = commit(&state, record, "thoughtspot");

    let body = render_report(Utc::now()).map_err(|e| ApiError::Internal(e.to_string()))?;
    let content_type = HeaderValue::from_str(&format!("multipart/mixed; boundary=\"{SAMPLE_BOUNDARY}\""))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let headers = [
        (CONTENT_TYPE, content_type),
        (SERVER, HeaderValue::from_static(SAMPLE_SERVER)),
    ];
    let signature = [(SIGNATURE_HEADER, SAMPLE_SIGNATURE)];
    Ok((headers, signature, body).into_response())
}

/// Attachment name advertised for a delivery at `now`.
pub fn report_filename(now: DateTime<Utc>) -> String {
    format!("Monthly_Sales_Dashboard_{}.pdf", now.format("%Y-%m"))
}

/// Report metadata carried in the first part.
pub fn report_metadata(now: DateTime<Utc>) -> Value {
    let next_run = now.checked_add_months(Months::new(1)).unwrap_or(now);
    json!({
        "data": {
            "users": [{
                "displayName": "John Doe",
                "email": "john.doe@thoughtspot.com",
                "userId": "user-12345",
            }],
            "schemaVersion": "v1",
            "schemaType": "SCHEDULED_REPORT",
            "notificationType": "DELIVERY",
            "scheduledReportWebhookNotification": {
                "reportId": "report-67890",
                "reportName": "Monthly Sales Dashboard",
                "scheduleInfo": {
                    "scheduleId": "schedule-abc123",
                    "scheduleString": "monthly on 1st day at 9:00 AM",
                    "nextRunTime": next_run.to_rfc3339_opts(SecondsFormat::Secs, true),
                    "timezone": "America/New_York",
                },
                "deliveryInfo": {
                    "deliveryId": "delivery-xyz789",
                    "deliveryTime": now.to_rfc3339_opts(SecondsFormat::Secs, true),
                    "deliveryStatus": "SUCCESS",
                    "recipientCount": 5,
                },
                "reportMetadata": {
                    "pinboardId": "22a8f618-0b4f-4401-92db-ba029ee13486",
                    "pinboardName": "Sales Performance Dashboard",
                    "reportUrl": "http://thoughtspot.company.com/?utm_source=scheduled_report&utm_medium=webhook/#/pinboard/22a8f618-0b4f-4401-92db-ba029ee13486",
                },
                "attachments": [{
                    "attachmentId": "att-001",
                    "fileName": report_filename(now),
                    "fileSize": 2_048_576,
                    "contentType": "application/pdf",
                    "disposition": "attachment",
                    "checksum": "sha256:abc123def456ghi789jkl012mno345pqr678stu901vwx234yz",
                    "partNumber": 2,
                }],
            },
        }
    })
}

/// Full multipart body for a delivery at `now`.
pub fn render_report(now: DateTime<Utc>) -> serde_json::Result<String> {
    let metadata = serde_json::to_string_pretty(&report_metadata(now))?;
    let pdf = STANDARD.encode(SAMPLE_PDF);
    let filename = report_filename(now);

    Ok(format!(
        "--{b}\r\n\
         Content-Type: application/json\r\n\
         Content-Disposition: inline\r\n\
         \r\n\
         {metadata}\r\n\
         --{b}\r\n\
         Content-Type: application/pdf\r\n\
         Content-Disposition: attachment; filename=\"{filename}\"\r\n\
         Content-Transfer-Encoding: base64\r\n\
         \r\n\
         {pdf}\r\n\
         --{b}--\r\n",
        b = SAMPLE_BOUNDARY,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::tests::test_server;
    use axum::body::Body;
    use axum::http::StatusCode;
    use chrono::TimeZone;
    use hooktap_core::RecordBody;
    use tower::ServiceExt;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap()
    }

    #[test]
    fn filename_uses_year_and_month() {
        assert_eq!(report_filename(fixed_now()), "Monthly_Sales_Dashboard_2025-01.pdf");
    }

    #[test]
    fn next_run_is_a_month_later() {
        let meta = report_metadata(fixed_now());
        let info = &meta["data"]["scheduledReportWebhookNotification"]["scheduleInfo"];
        assert_eq!(info["nextRunTime"], "2025-02-28T09:00:00Z");
        assert_eq!(info["timezone"], "America/New_York");
    }

    #[test]
    fn body_has_two_parts_and_decodable_pdf() {
        let body = render_report(fixed_now()).unwrap();
        assert!(body.starts_with(&format!("--{SAMPLE_BOUNDARY}\r\n")));
        assert!(body.ends_with(&format!("--{SAMPLE_BOUNDARY}--\r\n")));
        assert_eq!(body.matches(&format!("--{SAMPLE_BOUNDARY}\r\n")).count(), 2);
        assert!(body.contains("filename=\"Monthly_Sales_Dashboard_2025-01.pdf\""));

        let pdf_part = body
            .split("Content-Transfer-Encoding: base64\r\n\r\n")
            .nth(1)
            .unwrap();
        let encoded = pdf_part.split("\r\n").next().unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert!(decoded.starts_with(b"%PDF-1.4"));
        assert!(decoded.ends_with(b"%%EOF"));
    }

    #[tokio::test]
    async fn route_records_and_responds_multipart() {
        let server = test_server();
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/webhook/thoughtspot")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"ping":1}"#))
            .unwrap();
        let resp = server.router().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(ct.starts_with("multipart/mixed; boundary="));
        assert_eq!(resp.headers()[SERVER], SAMPLE_SERVER);
        assert_eq!(resp.headers()[SIGNATURE_HEADER], SAMPLE_SIGNATURE);

        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("\"schemaType\": \"SCHEDULED_REPORT\""));

        let records = server.ledger().snapshot().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "/webhook/thoughtspot");
        assert_eq!(records[0].body, RecordBody::Json(serde_json::json!({"ping": 1})));
    }

    #[tokio::test]
    async fn multipart_call_is_recorded_raw() {
        let server = test_server();
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/webhook/thoughtspot")
            .header("content-type", "multipart/form-data; boundary=x")
            .body(Body::from("--x--\r\n"))
            .unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let records = server.ledger().snapshot().records();
        assert_eq!(records[0].body, RecordBody::Text("--x--\r\n".into()));
        assert!(records[0].files.is_empty());
    }
}
