//! Utility modules supporting provider clients.
//!
//! - [`HttpClient`]: lazily-built HTTP client handle, one per provider

mod http;

pub use http::{HttpClient, HttpResponse, DEFAULT_USER_AGENT};
