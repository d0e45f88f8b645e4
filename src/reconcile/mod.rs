//! Reconciliation engine.
//!
//! Queries the applicable providers for a record, picks the most trusted
//! candidate and merges it back. [`Reconciler::enrich_entry`] and
//! [`Reconciler::enrich_collection`] are the two orchestration entry points
//! used by the CLI and the MCP tools.
//!
//! # Query order
//!
//! 1. arXiv identifier lookup, if an arXiv id is given
//! 2. DOI lookup, if a DOI is given
//! 3. Title search against every title-capable provider, if a title is given
//!
//! All attempted lookups run concurrently; candidates are collected in the
//! order above regardless of which request finished first.

mod merge;

use futures_util::future::{join_all, BoxFuture};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bibtex::{self, BibError};
use crate::config::{Config, FailurePolicy};
use crate::models::{Candidate, Record};
use crate::sources::{MetadataSource, SourceCapabilities, SourceError, SourceRegistry};

pub use merge::{build_from_candidate, merge_into_record, select_best};

/// Errors surfaced by the orchestration entry points
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error(transparent)]
    Bib(#[from] BibError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Identifiers available for one lookup
///
/// Blank values are treated as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupKeys<'a> {
    pub title: Option<&'a str>,
    pub arxiv_id: Option<&'a str>,
    pub doi: Option<&'a str>,
}

impl<'a> LookupKeys<'a> {
    pub fn new(title: Option<&'a str>, arxiv_id: Option<&'a str>, doi: Option<&'a str>) -> Self {
        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        Self {
            title: present(title),
            arxiv_id: present(arxiv_id),
            doi: present(doi),
        }
    }

    /// Keys taken from an existing record
    pub fn from_record(record: &'a Record) -> Self {
        Self::new(
            Some(record.title.as_str()),
            record.arxiv_id.as_deref(),
            record.doi.as_deref(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.arxiv_id.is_none() && self.doi.is_none()
    }
}

/// Outcome of enriching a stored collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub enriched: usize,
    pub total: usize,
    pub path: PathBuf,
}

impl fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Enriched {}/{} entries in {}",
            self.enriched,
            self.total,
            self.path.display()
        )
    }
}

type Attempt<'a> = (
    &'a Arc<dyn MetadataSource>,
    &'static str,
    BoxFuture<'a, Result<Option<Candidate>, SourceError>>,
);

/// Queries providers and merges their answers into records
#[derive(Debug, Clone)]
pub struct Reconciler {
    registry: SourceRegistry,
    policy: FailurePolicy,
}

impl Reconciler {
    pub fn new(registry: SourceRegistry, policy: FailurePolicy) -> Self {
        Self { registry, policy }
    }

    /// Build a reconciler with every compiled-in provider
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SourceRegistry::from_config(config),
            config.providers.failure_policy,
        )
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Query every applicable provider and collect their candidates
    ///
    /// Candidates come back in query order, not confidence order. Under
    /// [`FailurePolicy::Isolate`] a failing provider is logged and skipped;
    /// under [`FailurePolicy::Propagate`] the first failure in query order is
    /// returned.
    pub async fn gather_candidates(
        &self,
        keys: LookupKeys<'_>,
    ) -> Result<Vec<Candidate>, SourceError> {
        let mut attempts: Vec<Attempt<'_>> = Vec::new();

        if let Some(arxiv_id) = keys.arxiv_id {
            for source in self
                .registry
                .with_capability(SourceCapabilities::ARXIV_ID_LOOKUP)
            {
                attempts.push((source, "arXiv id", source.get_by_arxiv_id(arxiv_id)));
            }
        }

        if let Some(doi) = keys.doi {
            for source in self.registry.with_capability(SourceCapabilities::DOI_LOOKUP) {
                attempts.push((source, "DOI", source.get_by_doi(doi)));
            }
        }

        if let Some(title) = keys.title {
            for source in self
                .registry
                .with_capability(SourceCapabilities::TITLE_SEARCH)
            {
                attempts.push((source, "title", source.search_by_title(title)));
            }
        }

        let (labels, futures): (Vec<_>, Vec<_>) = attempts
            .into_iter()
            .map(|(source, kind, future)| ((source, kind), future))
            .unzip();

        let results = join_all(futures).await;

        let mut candidates = Vec::new();
        for ((source, kind), result) in labels.into_iter().zip(results) {
            match result {
                Ok(Some(candidate)) => {
                    tracing::debug!(
                        "{} {} lookup matched {:?}",
                        source.name(),
                        kind,
                        candidate.title
                    );
                    candidates.push(candidate);
                }
                Ok(None) => {
                    tracing::debug!("{} {} lookup found nothing", source.name(), kind);
                }
                Err(e) => match self.policy {
                    FailurePolicy::Isolate => {
                        tracing::warn!("{} {} lookup failed: {}", source.name(), kind, e);
                    }
                    FailurePolicy::Propagate => return Err(e),
                },
            }
        }

        Ok(candidates)
    }

    /// Enrich an ad-hoc entry and render it as BibTeX
    ///
    /// Returns `"No metadata found for {cite_key}"` when no provider matched.
    pub async fn enrich_entry(
        &self,
        cite_key: &str,
        keys: LookupKeys<'_>,
    ) -> Result<String, EnrichError> {
        let candidates = self.gather_candidates(keys).await?;

        match select_best(&candidates) {
            Some(best) => {
                tracing::info!("Enriched {} from {}", cite_key, best.source);
                let record = build_from_candidate(cite_key, best);
                Ok(bibtex::render_entry(&record))
            }
            None => Ok(format!("No metadata found for {}", cite_key)),
        }
    }

    /// Enrich one record, returning the merged record if any provider matched
    pub async fn enrich_record(&self, record: &Record) -> Result<Option<Record>, SourceError> {
        let keys = LookupKeys::from_record(record);
        if keys.is_empty() {
            tracing::debug!("{}: nothing to look up", record.cite_key);
            return Ok(None);
        }

        let candidates = self.gather_candidates(keys).await?;
        Ok(select_best(&candidates).map(|best| {
            tracing::debug!("{}: using {} candidate", record.cite_key, best.source);
            merge_into_record(record, best)
        }))
    }

    /// Enrich every record of a `.bib` file and rewrite it in place
    ///
    /// Records are processed one after another; the file is written once,
    /// after the last record. Unmatched records are written back unchanged.
    pub async fn enrich_collection(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<CollectionSummary, EnrichError> {
        let path = path.as_ref();
        let records = bibtex::load(path)?;
        let total = records.len();
        tracing::info!("Enriching {} entries from {}", total, path.display());

        let mut enriched = 0;
        let mut updated = Vec::with_capacity(total);
        for (index, record) in records.into_iter().enumerate() {
            match self.enrich_record(&record).await? {
                Some(merged) => {
                    enriched += 1;
                    updated.push(merged);
                }
                None => {
                    tracing::info!("{}: no metadata found", record.cite_key);
                    updated.push(record);
                }
            }
            tracing::debug!("Processed {}/{}", index + 1, total);
        }

        bibtex::store(&updated, path)?;

        let summary = CollectionSummary {
            enriched,
            total,
            path: path.to_path_buf(),
        };
        tracing::info!("{}", summary);
        Ok(summary)
    }
}
