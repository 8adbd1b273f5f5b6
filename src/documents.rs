//! Text extraction from attached documents.
//!
//! PDFs go through `pdf-extract`; everything else is read as UTF-8 text.
//! A file that cannot be read contributes a placeholder instead of failing
//! the whole analysis.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Text substituted for a document whose content could not be extracted.
pub const UNREADABLE_PLACEHOLDER: &str =
    "[ไม่สามารถอ่านเนื้อหาไฟล์ได้ - รูปแบบไฟล์อาจไม่รองรับหรือไฟล์เสียหาย]";

/// Errors from document extraction.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Cannot read {path}: {reason}")]
    FileUnreadable { path: PathBuf, reason: String },
}

impl DocumentError {
    fn unreadable(path: &Path, reason: impl ToString) -> Self {
        Self::FileUnreadable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Source of plain text for one document.
pub trait DocumentSource {
    fn extract_text(&self, path: &Path) -> Result<String, DocumentError>;
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentSource;

impl FsDocumentSource {
    fn is_pdf(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }
}

impl DocumentSource for FsDocumentSource {
    fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
        if Self::is_pdf(path) {
            let bytes = fs::read(path).map_err(|e| DocumentError::unreadable(path, e))?;
            let text = pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| DocumentError::unreadable(path, e))?;
            // Scanned PDFs have pages but no text layer.
            if text.trim().is_empty() {
                return Err(DocumentError::unreadable(path, "PDF contains no extractable text"));
            }
            return Ok(text);
        }

        let bytes = fs::read(path).map_err(|e| DocumentError::unreadable(path, e))?;
        String::from_utf8(bytes).map_err(|_| DocumentError::unreadable(path, "not valid UTF-8 text"))
    }
}

/// Display name used in the framing header.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Frame one document's text for the analysis prompt.
pub fn frame_document(name: &str, text: &str) -> String {
    format!("\n=== ไฟล์: {} ===\n{}\n", name, text)
}

/// Extract and frame every document, in order.
///
/// Unreadable documents are logged and replaced by [`UNREADABLE_PLACEHOLDER`].
pub fn collect_document_texts(source: &dyn DocumentSource, paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|path| {
            let name = display_name(path);
            match source.extract_text(path) {
                Ok(text) => {
                    debug!("Extracted {} chars from {}", text.chars().count(), name);
                    frame_document(&name, &text)
                }
                Err(e) => {
                    warn!("{}", e);
                    frame_document(&name, UNREADABLE_PLACEHOLDER)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn reads_text_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "ชุมชนริมน้ำ 5 หมู่บ้าน").unwrap();

        let text = FsDocumentSource.extract_text(&path).unwrap();
        assert_eq!(text, "ชุมชนริมน้ำ 5 หมู่บ้าน");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = FsDocumentSource
            .extract_text(Path::new("/nonexistent/eia.txt"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::FileUnreadable { .. }));
    }

    #[test]
    fn binary_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.bin");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x81]).unwrap();

        assert!(FsDocumentSource.extract_text(&path).is_err());
    }

    #[test]
    fn corrupt_pdf_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.PDF");
        fs::write(&path, b"not really a pdf").unwrap();

        assert!(FsDocumentSource.extract_text(&path).is_err());
    }

    #[test]
    fn unreadable_files_become_placeholders() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("a.txt");
        fs::write(&good, "first").unwrap();
        let missing = dir.path().join("b.txt");
        let also_good = dir.path().join("c.md");
        fs::write(&also_good, "third").unwrap();

        let texts = collect_document_texts(&FsDocumentSource, &[good, missing, also_good]);

        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0], "\n=== ไฟล์: a.txt ===\nfirst\n");
        assert_eq!(
            texts[1],
            format!("\n=== ไฟล์: b.txt ===\n{}\n", UNREADABLE_PLACEHOLDER)
        );
        assert!(texts[2].contains("third"));
    }
}
