use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("pdftotext did not finish within {0:?}")]
    PdftotextTimeout(Duration),

    #[error("failed to load category rules from {path}: {reason}")]
    CategoryRulesLoad { path: PathBuf, reason: String },

    #[error("invalid category rules: {0}")]
    CategoryRulesInvalid(String),

    #[error("invalid vision payload: {0}")]
    InvalidVisionPayload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TallyError {
    /// True when the document itself could not be turned into text.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            TallyError::PdfLoad(_)
                | TallyError::Extraction(_)
                | TallyError::PdftotextNotFound
                | TallyError::PdftotextFailed { .. }
                | TallyError::PdftotextTimeout(_)
        )
    }
}
