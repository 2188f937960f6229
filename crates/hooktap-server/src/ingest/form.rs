//! Accumulates the parts of a `multipart/form-data` body.
//!
//! Scalar fields become a JSON object; file parts are admitted under a
//! one-content-type-per-call rule. The first file part seen fixes the type,
//! and any later file whose declared type differs is skipped unread.

use hooktap_core::FileMeta;
use hooktap_core::MultiMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Prefix of the placeholder value recorded for each file field.
pub const FILE_MARKER_PREFIX: &str = "FILE_UPLOADED_";

/// Why an attachment was left out of the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Declared type differs from the call's first file.
    ContentTypeMismatch,
    /// The part's bytes could not be read.
    ReadFailed,
    /// The filename cannot be used as a storage key.
    InvalidFilename,
}

impl SkipReason {
    /// Wire and metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentTypeMismatch => "content_type_mismatch",
            Self::ReadFailed => "read_failed",
            Self::InvalidFilename => "invalid_filename",
        }
    }
}

/// An attachment that did not make it into the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    /// Client-supplied filename.
    pub filename: String,
    /// Declared content type.
    pub content_type: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Parsed form contents.
#[derive(Debug, Default)]
pub struct FormAccumulator {
    values: MultiMap,
    file_fields: Vec<String>,
    locked_type: Option<String>,
    files: Vec<FileMeta>,
    skipped: Vec<SkippedFile>,
    damaged: bool,
}

/// Result of [`FormAccumulator::finish`].
#[derive(Debug)]
pub struct FormOutcome {
    /// Scalar fields plus a marker per file field.
    pub body: Value,
    /// Accepted attachments.
    pub files: Vec<FileMeta>,
    /// Rejected attachments.
    pub skipped: Vec<SkippedFile>,
}

impl FormAccumulator {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scalar field value.
    pub fn push_value(&mut self, name: &str, value: String) {
        self.values.append(name, value);
    }

    /// Decide whether a file part with `content_type` may be stored.
    ///
    /// Also records `field` as a file field for the body markers.
    pub fn admit(&mut self, field: &str, content_type: &str) -> bool {
        if !self.file_fields.iter().any(|f| f == field) {
            self.file_fields.push(field.to_owned());
        }
        match &self.locked_type {
            None => {
                self.locked_type = Some(content_type.to_owned());
                true
            }
            Some(locked) => locked == content_type,
        }
    }

    /// Content type fixed by the first file part, if any.
    pub fn locked_type(&self) -> Option<&str> {
        self.locked_type.as_deref()
    }

    /// Record a stored attachment.
    pub fn accept(&mut self, meta: FileMeta) {
        self.files.push(meta);
    }

    /// Record a skipped attachment.
    pub fn skip(&mut self, filename: &str, content_type: &str, reason: SkipReason) {
        self.skipped.push(SkippedFile {
            filename: filename.to_owned(),
            content_type: content_type.to_owned(),
            reason,
        });
    }

    /// Note that a part failed mid-read, so the envelope may not resynchronize.
    pub fn mark_damaged(&mut self) {
        self.damaged = true;
    }

    /// Whether a part failed mid-read.
    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    /// Build the record body and attachment lists.
    ///
    /// A field with one value maps to a string, several values to an array in
    /// arrival order. Each file field maps to `FILE_UPLOADED_<field>`, taking
    /// precedence over a scalar of the same name.
    pub fn finish(self) -> FormOutcome {
        let mut body = Map::new();
        for (name, values) in self.values.iter() {
            let value = match values {
                [single] => Value::String(single.clone()),
                many => Value::Array(many.iter().cloned().map(Value::String).collect()),
            };
            let _ = body.insert(name.to_owned(), value);
        }
        for field in self.file_fields {
            let marker = format!("{FILE_MARKER_PREFIX}{field}");
            let _ = body.insert(field, Value::String(marker));
        }

        FormOutcome {
            body: Value::Object(body),
            files: self.files,
            skipped: self.skipped,
        }
    }
}
