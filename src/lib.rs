pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod render;
pub mod report;
pub mod server;

pub use error::{Error, Result};
