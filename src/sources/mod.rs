//! Metadata provider clients with a trait-based architecture.
//!
//! This module defines the [`MetadataSource`] trait that every provider client
//! implements. Each lookup yields zero or one [`Candidate`]: an empty answer or
//! a payload that doesn't have the expected shape is `Ok(None)`, and only
//! transport-level failures surface as [`SourceError::Transport`].
//!
//! # Feature Flags
//!
//! Individual providers can be disabled at compile time using Cargo features:
//!
//! - `arxiv` - Enable the arXiv client (default: enabled)
//! - `dblp` - Enable the DBLP client (default: enabled)
//! - `crossref` - Enable the CrossRef client (default: enabled)
//!
//! # Endpoints
//!
//! Each client's base URL comes from the `[providers]` configuration section,
//! so the clients can be pointed at a mirror or a local mock server.

#[cfg(feature = "source-arxiv")]
mod arxiv;
#[cfg(feature = "source-crossref")]
mod crossref;
#[cfg(feature = "source-dblp")]
mod dblp;
pub mod mock;
mod registry;

#[cfg(feature = "source-arxiv")]
pub use arxiv::ArxivSource;
#[cfg(feature = "source-crossref")]
pub use crossref::CrossRefSource;
#[cfg(feature = "source-dblp")]
pub use dblp::DblpSource;
pub use mock::MockSource;
pub use registry::{SourceCapabilities, SourceRegistry};

use async_trait::async_trait;

use crate::models::{Candidate, Provider};
use crate::utils::HttpResponse;

/// The MetadataSource trait defines the interface for all provider clients.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `MetadataSource`
/// 2. Implement `provider` and `capabilities`
/// 3. Override the lookups the provider supports; the rest default to
///    [`SourceError::NotImplemented`]
/// 4. Add the client to `SourceRegistry::from_config()` or register it dynamically
#[async_trait]
pub trait MetadataSource: Send + Sync + std::fmt::Debug {
    /// The provider tag attached to every candidate this client produces
    fn provider(&self) -> Provider;

    /// Unique identifier for this source (e.g. "arxiv", "dblp")
    fn id(&self) -> &str {
        self.provider().id()
    }

    /// Human-readable name of this source
    fn name(&self) -> &str {
        self.provider().name()
    }

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::TITLE_SEARCH
    }

    /// Whether this source supports lookup by free-text title
    fn supports_title_search(&self) -> bool {
        self.capabilities()
            .contains(SourceCapabilities::TITLE_SEARCH)
    }

    /// Whether this source supports lookup by arXiv identifier
    fn supports_arxiv_lookup(&self) -> bool {
        self.capabilities()
            .contains(SourceCapabilities::ARXIV_ID_LOOKUP)
    }

    /// Whether this source supports lookup by DOI
    fn supports_doi_lookup(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::DOI_LOOKUP)
    }

    /// Return the provider's top hit for a title, if any
    async fn search_by_title(&self, _title: &str) -> Result<Option<Candidate>, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Look up a paper by arXiv identifier
    async fn get_by_arxiv_id(&self, _arxiv_id: &str) -> Result<Option<Candidate>, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Look up a paper by DOI
    async fn get_by_doi(&self, _doi: &str) -> Result<Option<Candidate>, SourceError> {
        Err(SourceError::NotImplemented)
    }
}

/// Errors that can occur when querying a provider
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested lookup is not offered by this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// Connection failure, timeout, or a non-2xx response with an unusable body
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

/// Reject blank lookup keys before any request is made
pub(crate) fn require_non_blank<'a>(what: &str, value: &'a str) -> Result<&'a str, SourceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SourceError::InvalidRequest(format!("Empty {}", what)));
    }
    Ok(value)
}

/// Decode a provider response body
///
/// A 2xx body that fails to decode is no result. A non-2xx body that decodes
/// (an error document) is also no result. A non-2xx body that cannot be
/// decoded at all is a transport error.
pub(crate) fn decode_response<T, E, F>(
    provider: Provider,
    response: &HttpResponse,
    decode: F,
) -> Result<Option<T>, SourceError>
where
    E: std::fmt::Display,
    F: FnOnce(&str) -> Result<T, E>,
{
    match (response.is_success(), decode(&response.body)) {
        (true, Ok(value)) => Ok(Some(value)),
        (true, Err(e)) => {
            tracing::debug!("{}: unexpected response payload: {}", provider, e);
            Ok(None)
        }
        (false, Ok(_)) => {
            tracing::debug!("{}: request returned status {}", provider, response.status);
            Ok(None)
        }
        (false, Err(_)) => Err(SourceError::Transport(format!(
            "{} returned status {}",
            provider, response.status
        ))),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
