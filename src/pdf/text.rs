use std::path::{Path, PathBuf};

use crate::error::{ProfilError, Result};

/// PDF input collaborator: flat page text and a page count, nothing more.
/// Layout always comes from the DOCX template, so PDF input is for reading
/// content only.
pub struct PdfSource {
    path: PathBuf,
}

impl PdfSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn extract_text(&self) -> Result<String> {
        let text = pdf_extract::extract_text(&self.path)
            .map_err(|e| ProfilError::DocumentUnreadable(format!("pdf text: {e}")))?;
        Ok(text.trim().to_string())
    }

    pub fn page_count(&self) -> Result<usize> {
        let doc = lopdf::Document::load(&self.path)
            .map_err(|e| ProfilError::DocumentUnreadable(format!("pdf load: {e}")))?;
        Ok(doc.get_pages().len())
    }
}
