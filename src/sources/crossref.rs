//! CrossRef provider client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{Candidate, CandidateBuilder, Provider};
use crate::sources::{
    collapse_whitespace, decode_response, require_non_blank, MetadataSource, SourceCapabilities,
    SourceError,
};
use crate::utils::HttpClient;

/// CrossRef provider client
///
/// Supports DOI lookup (`/works/{doi}`) and title search (`query.title`, top
/// hit only).
#[derive(Debug)]
pub struct CrossRefSource {
    base_url: String,
    http: HttpClient,
}

impl CrossRefSource {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.providers.crossref_url.trim_end_matches('/').to_string(),
            http: HttpClient::from_config(&config.http),
        }
    }

    /// URL of a single work, with each DOI path segment percent-encoded
    fn work_url(&self, doi: &str) -> String {
        let encoded = doi
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.base_url, encoded)
    }

    /// Map a CrossRef work item to a candidate
    fn parse_work(work: CrossRefWork) -> Option<Candidate> {
        let year = work.year();

        let title = work
            .title
            .first()
            .map(|t| collapse_whitespace(t))
            .unwrap_or_default();

        let authors = work
            .author
            .into_iter()
            .map(|a| {
                format!(
                    "{} {}",
                    a.given.unwrap_or_default(),
                    a.family.unwrap_or_default()
                )
            })
            .collect();

        CandidateBuilder::new(Provider::CrossRef, title)
            .authors(authors)
            .year(year)
            .doi(work.doi)
            .journal(work.container_title.into_iter().next())
            .volume(work.volume)
            .pages(work.page)
            .publisher(work.publisher)
            .build()
    }
}

impl Default for CrossRefSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataSource for CrossRefSource {
    fn provider(&self) -> Provider {
        Provider::CrossRef
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::TITLE_SEARCH | SourceCapabilities::DOI_LOOKUP
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<Candidate>, SourceError> {
        let title = require_non_blank("title", title)?;

        tracing::debug!("CrossRef: searching title {:?}", title);
        let response = self
            .http
            .get(
                &self.base_url,
                &[("query.title", title), ("rows", "1")],
                "application/json",
            )
            .await?;

        let parsed = decode_response(Provider::CrossRef, &response, |body| {
            serde_json::from_str::<CrossRefEnvelope<CrossRefItems>>(body)
        })?;

        let candidate = parsed
            .and_then(|envelope| envelope.message)
            .and_then(|message| message.items.into_iter().next())
            .and_then(Self::parse_work);
        tracing::debug!(
            "CrossRef: {}",
            candidate
                .as_ref()
                .map(|c| c.title.as_str())
                .unwrap_or("no result")
        );
        Ok(candidate)
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Option<Candidate>, SourceError> {
        let doi = require_non_blank("DOI", doi)?;

        tracing::debug!("CrossRef: looking up DOI {}", doi);
        let response = self
            .http
            .get(&self.work_url(doi), &[], "application/json")
            .await?;

        // Unknown DOIs answer 404 with a plain-text body
        if response.status == StatusCode::NOT_FOUND {
            tracing::debug!("CrossRef: DOI {} not found", doi);
            return Ok(None);
        }

        let parsed = decode_response(Provider::CrossRef, &response, |body| {
            serde_json::from_str::<CrossRefEnvelope<CrossRefWork>>(body)
        })?;

        let candidate = parsed
            .filter(|envelope| envelope.status.as_deref() == Some("ok"))
            .and_then(|envelope| envelope.message)
            .and_then(Self::parse_work);
        tracing::debug!(
            "CrossRef: {}",
            candidate
                .as_ref()
                .map(|c| c.title.as_str())
                .unwrap_or("no result")
        );
        Ok(candidate)
    }
}

// CrossRef API response structures

#[derive(Debug, Deserialize)]
struct CrossRefEnvelope<T> {
    status: Option<String>,
    message: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CrossRefItems {
    #[serde(default)]
    items: Vec<CrossRefWork>,
}

#[derive(Debug, Deserialize)]
struct CrossRefWork {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CrossRefAuthor>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    volume: Option<String>,
    page: Option<String>,
    publisher: Option<String>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "published-print")]
    published_print: Option<CrossRefDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CrossRefDate>,
    created: Option<CrossRefDate>,
}

impl CrossRefWork {
    /// Year from the first date that carries one: print, then online, then
    /// record creation
    fn year(&self) -> Option<String> {
        [&self.published_print, &self.published_online, &self.created]
            .into_iter()
            .flatten()
            .find_map(CrossRefDate::year)
            .map(|y| y.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CrossRefAuthor {
    given: Option<String>,
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossRefDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrossRefDate {
    fn year(&self) -> Option<i64> {
        self.date_parts.first()?.first().copied().flatten()
    }
}
