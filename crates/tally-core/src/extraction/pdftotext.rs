use std::fs::File;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::TallyError;
use crate::extraction::{PageContent, PdfExtractor};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` to preserve whitespace alignment of tables.
/// An optional timeout bounds the subprocess only.
#[derive(Debug, Clone)]
pub struct PdftotextExtractor {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        PdftotextExtractor::new()
    }
}

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor {
            program: PathBuf::from("pdftotext"),
            timeout: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        PdftotextExtractor {
            timeout: Some(timeout),
            ..PdftotextExtractor::new()
        }
    }

    /// Run a specific pdftotext binary instead of the one on `PATH`.
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, TallyError> {
        let dir = tempfile::tempdir().map_err(|e| TallyError::Extraction(e.to_string()))?;
        let input = dir.path().join("statement.pdf");
        let output = dir.path().join("statement.txt");
        let stderr_path = dir.path().join("stderr.txt");
        std::fs::write(&input, pdf_bytes).map_err(|e| TallyError::Extraction(e.to_string()))?;

        // Text and diagnostics both go to files, so a noisy run never
        // blocks on a full pipe.
        let stderr_file = File::create(&stderr_path)?;
        let mut child = Command::new(&self.program)
            .arg("-layout")
            .arg(&input)
            .arg(&output)
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file))
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TallyError::PdftotextNotFound
                } else {
                    TallyError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        let status = wait_with_timeout(&mut child, self.timeout)?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            let stderr = std::fs::read(&stderr_path)
                .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
                .unwrap_or_default();
            return Err(TallyError::PdftotextFailed { code, stderr });
        }

        let bytes = std::fs::read(&output)?;
        let text = String::from_utf8_lossy(&bytes);
        let pages = split_pages(&text);
        debug!(pages = pages.len(), "pdftotext produced text");
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<ExitStatus, TallyError> {
    let Some(timeout) = timeout else {
        return Ok(child.wait()?);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(TallyError::PdftotextTimeout(timeout));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Split pdftotext output into pages (form feed `\x0c` separates pages).
fn split_pages(text: &str) -> Vec<PageContent> {
    text.split('\x0c')
        .enumerate()
        .map(|(i, page_text)| PageContent::new(i + 1, page_text))
        .filter(|p| !p.is_blank() || p.page_number == 1)
        .collect()
}
