pub mod config;
pub mod error;
pub mod identity;
pub mod task;

// Re-export common error type
pub use error::TodoError;
