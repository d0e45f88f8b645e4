//! DBLP provider client.
//!
//! Uses the DBLP publication search API (JSON format) for computer science
//! bibliography.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{Candidate, CandidateBuilder, Provider};
use crate::sources::{
    collapse_whitespace, decode_response, require_non_blank, MetadataSource, SourceCapabilities,
    SourceError,
};
use crate::utils::HttpClient;

/// DBLP provider client
///
/// Title search only; DBLP has no identifier lookup that maps onto a record.
#[derive(Debug)]
pub struct DblpSource {
    base_url: String,
    http: HttpClient,
}

impl DblpSource {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.providers.dblp_url.clone(),
            http: HttpClient::from_config(&config.http),
        }
    }

    /// Map the first hit of a search response to a candidate
    fn parse_response(response: DblpResponse) -> Option<Candidate> {
        let info = response
            .result?
            .hits?
            .hit
            .into_iter()
            .next()?
            .info?;

        let title = collapse_whitespace(info.title.as_deref().unwrap_or_default());

        let authors = info
            .authors
            .map(|a| {
                a.author
                    .into_vec()
                    .into_iter()
                    .map(DblpAuthor::into_name)
                    .collect()
            })
            .unwrap_or_default();

        let venue = info.venue.and_then(|v| v.into_vec().into_iter().next());

        CandidateBuilder::new(Provider::Dblp, title)
            .authors(authors)
            .year(info.year.map(Scalar::into_string))
            .venue(venue)
            .doi(info.doi)
            .build()
    }
}

impl Default for DblpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataSource for DblpSource {
    fn provider(&self) -> Provider {
        Provider::Dblp
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::TITLE_SEARCH
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<Candidate>, SourceError> {
        let title = require_non_blank("title", title)?;

        tracing::debug!("DBLP: searching title {:?}", title);
        let response = self
            .http
            .get(
                &self.base_url,
                &[("q", title), ("format", "json"), ("h", "1")],
                "application/json",
            )
            .await?;

        let parsed = decode_response(Provider::Dblp, &response, |body| {
            serde_json::from_str::<DblpResponse>(body)
        })?;

        let candidate = parsed.and_then(Self::parse_response);
        tracing::debug!(
            "DBLP: {}",
            candidate
                .as_ref()
                .map(|c| c.title.as_str())
                .unwrap_or("no result")
        );
        Ok(candidate)
    }
}

// DBLP API response structures

#[derive(Debug, Deserialize)]
struct DblpResponse {
    result: Option<DblpResult>,
}

#[derive(Debug, Deserialize)]
struct DblpResult {
    hits: Option<DblpHits>,
}

#[derive(Debug, Deserialize)]
struct DblpHits {
    #[serde(default)]
    hit: Vec<DblpHit>,
}

#[derive(Debug, Deserialize)]
struct DblpHit {
    info: Option<DblpInfo>,
}

#[derive(Debug, Deserialize)]
struct DblpInfo {
    title: Option<String>,
    authors: Option<DblpAuthors>,
    year: Option<Scalar>,
    venue: Option<OneOrMany<String>>,
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DblpAuthors {
    author: OneOrMany<DblpAuthor>,
}

/// A DBLP author is usually `{"@pid": ..., "text": "Name"}`, occasionally a bare string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DblpAuthor {
    Named { text: String },
    Bare(String),
}

impl DblpAuthor {
    fn into_name(self) -> String {
        match self {
            DblpAuthor::Named { text } => text,
            DblpAuthor::Bare(name) => name,
        }
    }
}

/// DBLP collapses single-element lists to the element itself
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(i64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn parse(json: &str) -> Option<Candidate> {
        DblpSource::parse_response(serde_json::from_str(json).unwrap())
    }

    fn source_for(server: &mockito::ServerGuard) -> DblpSource {
        let mut config = Config::default();
        config.providers.dblp_url = format!("{}/search/publ/api", server.url());
        DblpSource::from_config(&config)
    }

    #[test]
    fn test_parse_author_list() {
        let candidate = parse(
            r#"{"result":{"hits":{"@total":"1","hit":[{"info":{
                "authors":{"author":[{"@pid":"1","text":"Ashish Vaswani"},{"@pid":"2","text":"Noam Shazeer"}]},
                "title":"Attention is All you Need.",
                "venue":"NIPS",
                "year":"2017",
                "doi":"10.5555/3295222.3295349"
            }}]}}}"#,
        )
        .unwrap();

        assert_eq!(candidate.title, "Attention is All you Need.");
        assert_eq!(
            candidate.authors,
            Some(vec!["Ashish Vaswani".to_string(), "Noam Shazeer".to_string()])
        );
        assert_eq!(candidate.year.as_deref(), Some("2017"));
        assert_eq!(candidate.venue.as_deref(), Some("NIPS"));
        assert_eq!(candidate.doi.as_deref(), Some("10.5555/3295222.3295349"));
        assert_eq!(candidate.confidence, 0.85);
    }

    #[test]
    fn test_parse_single_author_object() {
        let candidate = parse(
            r#"{"result":{"hits":{"hit":[{"info":{
                "authors":{"author":{"@pid":"1","text":"Solo Author"}},
                "title":"A Lonely Paper",
                "year":"2020"
            }}]}}}"#,
        )
        .unwrap();

        assert_eq!(candidate.authors, Some(vec!["Solo Author".to_string()]));
    }

    #[test]
    fn test_parse_bare_string_authors_and_venue_list() {
        let candidate = parse(
            r#"{"result":{"hits":{"hit":[{"info":{
                "authors":{"author":["First Author","Second Author"]},
                "title":"Mixed Shapes",
                "venue":["CoRR","arXiv"],
                "year":2021
            }}]}}}"#,
        )
        .unwrap();

        assert_eq!(candidate.authors.as_ref().map(Vec::len), Some(2));
        assert_eq!(candidate.venue.as_deref(), Some("CoRR"));
        assert_eq!(candidate.year.as_deref(), Some("2021"));
    }

    #[test]
    fn test_parse_no_hits() {
        assert!(parse(r#"{"result":{"hits":{"@total":"0","hit":[]}}}"#).is_none());
        assert!(parse(r#"{"result":{"hits":{"@total":"0"}}}"#).is_none());
        assert!(parse(r#"{"result":{}}"#).is_none());
        assert!(parse(r#"{}"#).is_none());
    }

    #[test]
    fn test_parse_hit_without_title() {
        assert!(parse(r#"{"result":{"hits":{"hit":[{"info":{"year":"2020"}}]}}}"#).is_none());
    }

    #[tokio::test]
    async fn test_search_by_title() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "A Lonely Paper".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("h".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"result":{"hits":{"hit":[{"info":{
                    "authors":{"author":{"text":"Solo Author"}},
                    "title":"A Lonely Paper",
                    "year":"2020"
                }}]}}}"#,
            )
            .create_async()
            .await;

        let source = source_for(&server);
        let candidate = source.search_by_title("A Lonely Paper").await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(candidate.source, Provider::Dblp);
        assert_eq!(candidate.authors, Some(vec!["Solo Author".to_string()]));
    }

    #[tokio::test]
    async fn test_search_empty_hits_is_no_result() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result":{"hits":{"@total":"0","hit":[]}}}"#)
            .create_async()
            .await;

        let source = source_for(&server);
        assert!(source.search_by_title("Nothing Here").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_unexpected_shape_is_no_result() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result":{"hits":{"hit":{"info":"not an object"}}}}"#)
            .create_async()
            .await;

        let source = source_for(&server);
        assert!(source.search_by_title("Odd").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_server_error_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("<html>Internal Server Error</html>")
            .create_async()
            .await;

        let source = source_for(&server);
        let result = source.search_by_title("Anything").await;
        assert!(matches!(result, Err(SourceError::Transport(_))));
    }
}
