pub mod context;
pub mod docx;
