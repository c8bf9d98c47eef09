//! Executors
//!
//! Single-attempt HTTP execution of provider payloads plus the mapping from
//! HTTP failures to provider errors.

pub mod chat;
pub mod errors;

pub use chat::{HttpProviderClient, ProviderClient};
pub use errors::{classify_http_error, classify_transport_error};
