//! profilgen — turns unstructured candidate profiles (DOCX/PDF/raw text)
//! into structured data and renders them back into a recruiter-supplied
//! DOCX layout template, with optional PDF export.
//!
//! The deterministic core is `docx::reader` + `analyze` (document structure
//! extraction) and `render::context` (profile-to-template-context mapping).
//! The AI extraction/tailoring calls, template substitution and PDF export
//! are thin collaborator seams around that core.

pub mod ai;
pub mod analyze;
pub mod config;
pub mod docx;
pub mod error;
pub mod model;
pub mod pdf;
pub mod progress;
pub mod render;
pub mod storage;
