//! arXiv provider client.
//!
//! Queries the arXiv export API and reads the first `<entry>` of the returned
//! Atom feed.

use async_trait::async_trait;
use chrono::Datelike;
use feed_rs::parser;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::models::{Candidate, CandidateBuilder, Provider};
use crate::sources::{
    collapse_whitespace, decode_response, require_non_blank, MetadataSource, SourceCapabilities,
    SourceError,
};
use crate::utils::HttpClient;

const ATOM_ACCEPT: &str = "application/atom+xml";

// New-style identifier: YYMM.NNNNN, version suffix excluded
static ARXIV_ID: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+\.\d+").ok());

/// arXiv provider client
///
/// Supports:
/// - Lookup by arXiv identifier (`id_list`)
/// - Title search (`search_query=ti:...`, top hit only)
#[derive(Debug)]
pub struct ArxivSource {
    base_url: String,
    http: HttpClient,
}

impl ArxivSource {
    /// Create a client against the default endpoint
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.providers.arxiv_url.clone(),
            http: HttpClient::from_config(&config.http),
        }
    }

    /// Extract a bare arXiv identifier from an entry id
    ///
    /// `http://arxiv.org/abs/2401.00001v2` becomes `2401.00001`. Old-style
    /// identifiers without a dotted number yield `None`.
    pub fn extract_id(entry_id: &str) -> Option<String> {
        ARXIV_ID.as_ref()?.find(entry_id).map(|m| m.as_str().to_string())
    }

    /// Map the first feed entry to a candidate
    ///
    /// `arxiv_id` is the identifier that was looked up, if any; otherwise the
    /// identifier is read from the entry itself.
    fn parse_feed(feed: &feed_rs::model::Feed, arxiv_id: Option<&str>) -> Option<Candidate> {
        let entry = feed.entries.first()?;

        let title = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default();

        let authors = entry
            .authors
            .iter()
            .map(|a| collapse_whitespace(&a.name))
            .collect();

        let year = entry.published.map(|d| format!("{:04}", d.year()));

        let arxiv_id = match arxiv_id {
            Some(id) => Some(id.to_string()),
            None => Self::extract_id(&entry.id),
        };

        CandidateBuilder::new(Provider::Arxiv, title)
            .authors(authors)
            .year(year)
            .arxiv_id(arxiv_id)
            .build()
    }

    async fn query(
        &self,
        params: &[(&str, &str)],
        arxiv_id: Option<&str>,
    ) -> Result<Option<Candidate>, SourceError> {
        let response = self.http.get(&self.base_url, params, ATOM_ACCEPT).await?;

        let feed = decode_response(Provider::Arxiv, &response, |body| {
            parser::parse(body.as_bytes())
        })?;

        let candidate = feed.and_then(|feed| Self::parse_feed(&feed, arxiv_id));
        tracing::debug!(
            "arXiv: {}",
            candidate
                .as_ref()
                .map(|c| c.title.as_str())
                .unwrap_or("no result")
        );
        Ok(candidate)
    }
}

impl Default for ArxivSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataSource for ArxivSource {
    fn provider(&self) -> Provider {
        Provider::Arxiv
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::TITLE_SEARCH | SourceCapabilities::ARXIV_ID_LOOKUP
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<Candidate>, SourceError> {
        let title = require_non_blank("title", title)?;
        let search_query = format!("ti:{}", title);

        tracing::debug!("arXiv: searching title {:?}", title);
        self.query(
            &[("search_query", search_query.as_str()), ("max_results", "1")],
            None,
        )
        .await
    }

    async fn get_by_arxiv_id(&self, arxiv_id: &str) -> Result<Option<Candidate>, SourceError> {
        let arxiv_id = require_non_blank("arXiv ID", arxiv_id)?;

        tracing::debug!("arXiv: looking up id {}", arxiv_id);
        self.query(&[("id_list", arxiv_id)], Some(arxiv_id)).await
    }
}
