use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for profilgen operations.
pub type Result<T> = std::result::Result<T, ProfilError>;

/// Caller-visible error kinds. Best-effort style metadata (fonts, colors,
/// margins) never produces one of these; it degrades to empty values.
#[derive(Debug, Error)]
pub enum ProfilError {
    /// The input document container could not be decoded at all.
    #[error("document unreadable: {0}")]
    DocumentUnreadable(String),

    /// The referenced layout template does not exist.
    #[error("template not found: {0} (upload a DOCX template first)")]
    TemplateMissing(PathBuf),

    /// The extraction collaborator's response did not deserialize into a
    /// profile.
    #[error("extraction response is not a valid profile: {0}")]
    ExtractionParseFailure(String),

    /// No DOCX-to-PDF converter is present on this machine.
    #[error("no PDF converter found (install LibreOffice: https://www.libreoffice.org/download/)")]
    ConverterUnavailable,

    /// Input file is neither DOCX nor PDF.
    #[error("unsupported input format: {0} (expected .docx or .pdf)")]
    UnsupportedInputFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An external collaborator (chat backend, office suite) failed after
    /// being reached.
    #[error("collaborator error: {0}")]
    Collaborator(String),
}
