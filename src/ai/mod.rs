pub mod backend;
pub mod prompts;
pub mod tailoring;
