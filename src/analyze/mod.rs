pub mod structure;
pub mod styles;
