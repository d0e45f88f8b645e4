//! Record model representing one bibliography entry.

use indexmap::IndexMap;

/// Entry kind given to records built from scratch
pub const DEFAULT_ENTRY_TYPE: &str = "article";

/// Unrecognised `field = value` pairs, kept in the order they were read
pub type RawFields = IndexMap<String, String>;

/// A normalized bibliography entry
///
/// Records are produced by the BibTeX adapter or built directly for ad-hoc
/// enrichment. Merging never mutates a record in place; it yields a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Entry kind (article, inproceedings, misc, ...)
    pub entry_type: String,

    /// Citation key, unique within a collection
    pub cite_key: String,

    /// Title
    pub title: String,

    /// Author display names, in order
    pub authors: Option<Vec<String>>,

    /// Four-digit year
    pub year: Option<String>,

    /// Venue as reported by a provider (not written back to BibTeX)
    pub venue: Option<String>,

    /// Digital Object Identifier
    pub doi: Option<String>,

    /// arXiv identifier
    pub arxiv_id: Option<String>,

    pub url: Option<String>,

    pub r#abstract: Option<String>,

    pub booktitle: Option<String>,

    pub journal: Option<String>,

    pub volume: Option<String>,

    pub pages: Option<String>,

    pub publisher: Option<String>,

    /// Fields with no dedicated slot above
    pub raw_fields: RawFields,
}

impl Record {
    /// Create a record with the required fields only
    pub fn new(
        entry_type: impl Into<String>,
        cite_key: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            entry_type: entry_type.into(),
            cite_key: cite_key.into(),
            title: title.into(),
            authors: None,
            year: None,
            venue: None,
            doi: None,
            arxiv_id: None,
            url: None,
            r#abstract: None,
            booktitle: None,
            journal: None,
            volume: None,
            pages: None,
            publisher: None,
            raw_fields: RawFields::new(),
        }
    }

    /// Author names joined the way BibTeX stores them
    pub fn author_string(&self) -> Option<String> {
        self.authors
            .as_ref()
            .filter(|a| !a.is_empty())
            .map(|a| a.join(" and "))
    }
}

/// Builder for constructing Record objects
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Create a new builder with required fields
    pub fn new(
        entry_type: impl Into<String>,
        cite_key: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            record: Record::new(entry_type, cite_key, title),
        }
    }

    /// Set authors
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let authors: Vec<String> = authors.into_iter().map(Into::into).collect();
        self.record.authors = (!authors.is_empty()).then_some(authors);
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.record.year = Some(year.into());
        self
    }

    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.record.venue = Some(venue.into());
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.record.doi = Some(doi.into());
        self
    }

    pub fn arxiv_id(mut self, arxiv_id: impl Into<String>) -> Self {
        self.record.arxiv_id = Some(arxiv_id.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.record.url = Some(url.into());
        self
    }

    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.record.r#abstract = Some(abstract_text.into());
        self
    }

    pub fn booktitle(mut self, booktitle: impl Into<String>) -> Self {
        self.record.booktitle = Some(booktitle.into());
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.record.journal = Some(journal.into());
        self
    }

    pub fn volume(mut self, volume: impl Into<String>) -> Self {
        self.record.volume = Some(volume.into());
        self
    }

    pub fn pages(mut self, pages: impl Into<String>) -> Self {
        self.record.pages = Some(pages.into());
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.record.publisher = Some(publisher.into());
        self
    }

    /// Add an unrecognised field, keeping insertion order
    pub fn raw_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.raw_fields.insert(name.into(), value.into());
        self
    }

    /// Build the Record
    pub fn build(self) -> Record {
        self.record
    }
}
