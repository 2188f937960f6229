//! Content-type lookup for served attachments.

/// Fallback for unknown or missing extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Map a filename to the content type used when serving it back.
///
/// Only the extension is consulted, case-insensitively. The table is fixed;
/// anything not listed is served as generic binary.
pub fn for_filename(filename: &str) -> &'static str {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => OCTET_STREAM,
    }
}

/// Whether a request `Content-Type` header announces a multipart form.
pub fn is_multipart_form(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
}
