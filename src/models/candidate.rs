//! Candidate model: one provider's guess at a record's metadata.

/// The metadata provider a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Arxiv,
    Dblp,
    CrossRef,
}

impl Provider {
    /// Returns the display name of the provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Arxiv => "arXiv",
            Provider::Dblp => "DBLP",
            Provider::CrossRef => "CrossRef",
        }
    }

    /// Returns the provider identifier
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Arxiv => "arxiv",
            Provider::Dblp => "dblp",
            Provider::CrossRef => "crossref",
        }
    }

    /// Fixed trust weight for every candidate this provider returns
    pub fn confidence(&self) -> f64 {
        match self {
            Provider::Arxiv => 0.9,
            Provider::Dblp => 0.85,
            Provider::CrossRef => 0.8,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Metadata proposed by a single provider for a single query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub authors: Option<Vec<String>>,
    pub year: Option<String>,
    pub venue: Option<String>,
    pub doi: Option<String>,
    pub arxiv_id: Option<String>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub pages: Option<String>,
    pub publisher: Option<String>,

    /// Provider that produced this candidate
    pub source: Provider,

    /// Always `source.confidence()`
    pub confidence: f64,
}

impl Candidate {
    /// Create a candidate carrying only a title
    pub fn new(source: Provider, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: None,
            year: None,
            venue: None,
            doi: None,
            arxiv_id: None,
            journal: None,
            volume: None,
            pages: None,
            publisher: None,
            source,
            confidence: source.confidence(),
        }
    }

    /// A candidate without a title cannot be used
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Builder for constructing Candidate objects from provider payloads
///
/// Setters take `Option`s because provider fields are optional; empty strings
/// are normalised to `None`.
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    candidate: Candidate,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CandidateBuilder {
    pub fn new(source: Provider, title: impl Into<String>) -> Self {
        Self {
            candidate: Candidate::new(source, title),
        }
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        let authors: Vec<String> = authors
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        self.candidate.authors = (!authors.is_empty()).then_some(authors);
        self
    }

    pub fn year(mut self, year: Option<String>) -> Self {
        self.candidate.year = non_empty(year);
        self
    }

    pub fn venue(mut self, venue: Option<String>) -> Self {
        self.candidate.venue = non_empty(venue);
        self
    }

    pub fn doi(mut self, doi: Option<String>) -> Self {
        self.candidate.doi = non_empty(doi);
        self
    }

    pub fn arxiv_id(mut self, arxiv_id: Option<String>) -> Self {
        self.candidate.arxiv_id = non_empty(arxiv_id);
        self
    }

    pub fn journal(mut self, journal: Option<String>) -> Self {
        self.candidate.journal = non_empty(journal);
        self
    }

    pub fn volume(mut self, volume: Option<String>) -> Self {
        self.candidate.volume = non_empty(volume);
        self
    }

    pub fn pages(mut self, pages: Option<String>) -> Self {
        self.candidate.pages = non_empty(pages);
        self
    }

    pub fn publisher(mut self, publisher: Option<String>) -> Self {
        self.candidate.publisher = non_empty(publisher);
        self
    }

    /// Build the candidate, or `None` if it has no usable title
    pub fn build(self) -> Option<Candidate> {
        self.candidate.is_usable().then_some(self.candidate)
    }
}
