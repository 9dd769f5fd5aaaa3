// Public modules
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod processor;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
