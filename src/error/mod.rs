//! Error Handling Module
//!
//! - Core error types (`AssistantError`, `ErrorCategory`)
//! - User-facing error helpers and summaries
//! - Type conversions from common error types

mod conversions;
pub mod helpers;
pub mod types;

pub use helpers::*;
pub use types::*;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AssistantError>;
