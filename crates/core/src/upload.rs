//! Uploaded SWMS document validation and scanner capability traits.
//!
//! Static checks (size, extension, content type) are pure. Virus scanning and
//! OCR are external collaborators behind [`FileScanner`] and [`DocumentOcr`];
//! the bundled [`NoopScanner`] and [`NoopOcr`] perform no work.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: i64 = 10 * 1024 * 1024;

/// Accepted extensions and the content types each may carry.
const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("pdf", &["application/pdf"]),
    ("doc", &["application/msword"]),
    (
        "docx",
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
    ),
    ("jpg", &["image/jpeg"]),
    ("jpeg", &["image/jpeg"]),
    ("png", &["image/png"]),
];

// ---------------------------------------------------------------------------
// Static validation
// ---------------------------------------------------------------------------

/// Metadata describing an upload before it is accepted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadDescriptor {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
}

/// Return every problem with `upload`; an empty list means it passes.
pub fn validate_upload(upload: &UploadDescriptor) -> Vec<String> {
    let mut errors = Vec::new();

    if upload.size_bytes <= 0 {
        errors.push("File is empty".to_string());
    } else if upload.size_bytes > MAX_UPLOAD_BYTES {
        errors.push(format!(
            "File exceeds maximum size of {MAX_UPLOAD_BYTES} bytes (got {})",
            upload.size_bytes
        ));
    }

    let extension = Path::new(upload.file_name.trim())
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let content_type = upload.content_type.trim().to_ascii_lowercase();

    match extension {
        None => errors.push("File name has no extension".to_string()),
        Some(ext) => match ALLOWED_TYPES.iter().find(|(allowed, _)| *allowed == ext) {
            None => errors.push(format!("File type '.{ext}' is not accepted")),
            Some((_, content_types)) => {
                if !content_types.contains(&content_type.as_str()) {
                    errors.push(format!(
                        "Content type '{content_type}' does not match '.{ext}'"
                    ));
                }
            }
        },
    }

    errors
}

// ---------------------------------------------------------------------------
// Scanner capabilities
// ---------------------------------------------------------------------------

/// Result of a virus scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub clean: bool,
    /// `false` when no scanner actually inspected the file.
    pub scanned: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub threats: Vec<String>,
}

/// Fields extracted from a document by OCR.
pub type ExtractedFields = BTreeMap<String, String>;

#[async_trait]
pub trait FileScanner: Send + Sync {
    async fn scan(&self, file_ref: &str) -> Result<ScanOutcome, CoreError>;
}

#[async_trait]
pub trait DocumentOcr: Send + Sync {
    async fn ocr(&self, file_ref: &str) -> Result<ExtractedFields, CoreError>;
}

/// Scanner used when no scanning service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScanner;

#[async_trait]
impl FileScanner for NoopScanner {
    async fn scan(&self, _file_ref: &str) -> Result<ScanOutcome, CoreError> {
        Ok(ScanOutcome {
            clean: true,
            scanned: false,
            threats: Vec::new(),
        })
    }
}

/// OCR used when no OCR service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOcr;

#[async_trait]
impl DocumentOcr for NoopOcr {
    async fn ocr(&self, _file_ref: &str) -> Result<ExtractedFields, CoreError> {
        Ok(ExtractedFields::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
