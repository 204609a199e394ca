pub mod pdftotext;
pub mod text_layer;

use serde::{Deserialize, Serialize};

use crate::error::TallyError;

/// Text extracted from a single page, with line breaks approximating the
/// visual rows of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub page_number: usize,
    pub text: String,
}

impl PageContent {
    pub fn new(page_number: usize, text: impl Into<String>) -> Self {
        PageContent {
            page_number,
            text: text.into(),
        }
    }

    pub fn from_lines<S: AsRef<str>>(page_number: usize, lines: &[S]) -> Self {
        let text = lines.iter().map(|l| l.as_ref()).collect::<Vec<_>>().join("\n");
        PageContent { page_number, text }
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, TallyError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
