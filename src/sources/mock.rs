//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::{Candidate, Provider};
use crate::sources::{MetadataSource, SourceCapabilities, SourceError};

/// What a mock lookup answers with
#[derive(Debug, Clone)]
pub enum MockResponse {
    Found(Candidate),
    Empty,
    /// Fail with a transport error carrying this message
    Fail(String),
}

impl MockResponse {
    fn to_result(&self) -> Result<Option<Candidate>, SourceError> {
        match self {
            MockResponse::Found(candidate) => Ok(Some(candidate.clone())),
            MockResponse::Empty => Ok(None),
            MockResponse::Fail(message) => Err(SourceError::Transport(message.clone())),
        }
    }
}

/// A mock source for testing that returns predefined responses.
///
/// Every lookup the capabilities allow answers [`MockResponse::Empty`] until
/// configured otherwise. Each call is recorded as `"<kind>:<query>"`.
#[derive(Debug)]
pub struct MockSource {
    provider: Provider,
    capabilities: SourceCapabilities,
    title_response: Mutex<MockResponse>,
    arxiv_response: Mutex<MockResponse>,
    doi_response: Mutex<MockResponse>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a mock that only supports title search
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            capabilities: SourceCapabilities::TITLE_SEARCH,
            title_response: Mutex::new(MockResponse::Empty),
            arxiv_response: Mutex::new(MockResponse::Empty),
            doi_response: Mutex::new(MockResponse::Empty),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_capabilities(mut self, capabilities: SourceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the title search response to return.
    pub fn set_title_response(&self, response: MockResponse) {
        *self.title_response.lock().unwrap() = response;
    }

    /// Set the arXiv id lookup response to return.
    pub fn set_arxiv_response(&self, response: MockResponse) {
        *self.arxiv_response.lock().unwrap() = response;
    }

    /// Set the DOI lookup response to return.
    pub fn set_doi_response(&self, response: MockResponse) {
        *self.doi_response.lock().unwrap() = response;
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(
        &self,
        capability: SourceCapabilities,
        kind: &str,
        query: &str,
        response: &Mutex<MockResponse>,
    ) -> Result<Option<Candidate>, SourceError> {
        if !self.capabilities.contains(capability) {
            return Err(SourceError::NotImplemented);
        }
        self.calls.lock().unwrap().push(format!("{}:{}", kind, query));
        let response = response.lock().unwrap();
        response.to_result()
    }
}

#[async_trait]
impl MetadataSource for MockSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn capabilities(&self) -> SourceCapabilities {
        self.capabilities
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<Candidate>, SourceError> {
        self.answer(
            SourceCapabilities::TITLE_SEARCH,
            "title",
            title,
            &self.title_response,
        )
    }

    async fn get_by_arxiv_id(&self, arxiv_id: &str) -> Result<Option<Candidate>, SourceError> {
        self.answer(
            SourceCapabilities::ARXIV_ID_LOOKUP,
            "arxiv",
            arxiv_id,
            &self.arxiv_response,
        )
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Option<Candidate>, SourceError> {
        self.answer(
            SourceCapabilities::DOI_LOOKUP,
            "doi",
            doi,
            &self.doi_response,
        )
    }
}
