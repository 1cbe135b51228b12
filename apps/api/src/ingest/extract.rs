//! Text extractor — PDF bytes to plain text, plus the pluggable raw-text
//! audit sink.

use lopdf::Document;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::errors::AppError;

/// Converts PDF bytes to plain text, concatenating every page's text in page
/// order. A page whose extraction errors or yields nothing contributes an
/// empty segment; only a byte stream that cannot be opened as a PDF at all
/// fails the document.
pub fn extract_text(pdf_bytes: &[u8]) -> Result<String, AppError> {
    let document =
        Document::load_mem(pdf_bytes).map_err(|e| AppError::CorruptDocument(e.to_string()))?;

    let mut text = String::new();
    for (page_no, _page_id) in document.get_pages() {
        match document.extract_text(&[page_no]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                warn!("Page {page_no} yielded no text ({e}), continuing");
            }
        }
    }
    Ok(text)
}

/// Destination for raw extracted CV text. Observability only: sink failures
/// are logged and swallowed, never surfaced to the ingestion caller.
pub trait RawTextSink: Send + Sync {
    fn record(&self, source: &str, text: &str);
}

/// Default sink: logs a summary line, keeps no copy of the text.
pub struct TracingSink;

impl RawTextSink for TracingSink {
    fn record(&self, source: &str, text: &str) {
        info!("Extracted {} chars of raw text from {source}", text.len());
    }
}

/// Append-only file sink, enabled via `AUDIT_LOG_PATH`. Reproduces the
/// raw-text record-keeping file as an explicit opt-in. The text is
/// privacy-sensitive; retention is the operator's responsibility.
pub struct FileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, source: &str, text: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "----- NEW CV ({source}) -----")?;
        writeln!(file, "{text}")?;
        writeln!(file)?;
        Ok(())
    }
}

impl RawTextSink for FileSink {
    fn record(&self, source: &str, text: &str) {
        if let Err(e) = self.append(source, text) {
            warn!("Audit sink write failed for {source}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rejects_non_pdf_bytes() {
        let err = extract_text(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, AppError::CorruptDocument(_)));
    }

    #[test]
    fn test_extract_rejects_empty_bytes() {
        let err = extract_text(b"").unwrap_err();
        assert!(matches!(err, AppError::CorruptDocument(_)));
    }

    #[test]
    fn test_file_sink_appends_entries() {
        let dir = std::env::temp_dir().join("cv-api-sink-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("audit-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let sink = FileSink::new(&path);
        sink.record("a.pdf", "first");
        sink.record("b.pdf", "second");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("a.pdf"));
        assert!(contents.contains("first"));
        assert!(contents.contains("second"));
        std::fs::remove_file(&path).unwrap();
    }
}
