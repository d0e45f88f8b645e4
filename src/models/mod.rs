//! Core data models for bibliography records and provider candidates.

mod candidate;
mod record;

pub use candidate::{Candidate, CandidateBuilder, Provider};
pub use record::{RawFields, Record, RecordBuilder, DEFAULT_ENTRY_TYPE};
