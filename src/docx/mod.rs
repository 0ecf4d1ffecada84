pub mod package;
pub mod reader;
pub mod xml;
