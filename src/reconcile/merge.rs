//! Candidate selection and merging.

use crate::models::{Candidate, Record, DEFAULT_ENTRY_TYPE};

/// Pick the candidate with the highest confidence
///
/// Ties keep the earliest candidate. An empty slice yields `None`.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best: Option<&Candidate>, c| match best {
        Some(b) if b.confidence >= c.confidence => Some(b),
        _ => Some(c),
    })
}

/// Overlay a candidate onto an existing record
///
/// Each field the candidate carries with a non-empty value replaces the
/// record's value; everything else, including URL, abstract, booktitle and
/// raw fields, comes from the record unchanged.
pub fn merge_into_record(record: &Record, candidate: &Candidate) -> Record {
    fn pick(theirs: &Option<String>, ours: &Option<String>) -> Option<String> {
        theirs
            .as_ref()
            .filter(|v| !v.is_empty())
            .or(ours.as_ref())
            .cloned()
    }

    let title = if candidate.title.is_empty() {
        record.title.clone()
    } else {
        candidate.title.clone()
    };

    let authors = candidate
        .authors
        .as_ref()
        .filter(|a| !a.is_empty())
        .or(record.authors.as_ref())
        .cloned();

    Record {
        title,
        authors,
        year: pick(&candidate.year, &record.year),
        venue: pick(&candidate.venue, &record.venue),
        doi: pick(&candidate.doi, &record.doi),
        arxiv_id: pick(&candidate.arxiv_id, &record.arxiv_id),
        journal: pick(&candidate.journal, &record.journal),
        volume: pick(&candidate.volume, &record.volume),
        pages: pick(&candidate.pages, &record.pages),
        publisher: pick(&candidate.publisher, &record.publisher),
        ..record.clone()
    }
}

/// Build a fresh record for an ad-hoc entry from a candidate
///
/// Venue and publisher are not carried over.
pub fn build_from_candidate(cite_key: &str, candidate: &Candidate) -> Record {
    Record {
        authors: candidate.authors.clone(),
        year: candidate.year.clone(),
        doi: candidate.doi.clone(),
        arxiv_id: candidate.arxiv_id.clone(),
        journal: candidate.journal.clone(),
        volume: candidate.volume.clone(),
        pages: candidate.pages.clone(),
        ..Record::new(DEFAULT_ENTRY_TYPE, cite_key, candidate.title.clone())
    }
}
