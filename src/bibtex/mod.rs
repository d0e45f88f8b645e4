//! BibTeX format adapter.
//!
//! Converts between `.bib` text and [`Record`]s. Unrecognised fields survive a
//! read/write cycle through [`Record::raw_fields`].
//!
//! ```rust
//! use bib_enrich::bibtex;
//!
//! let records = bibtex::parse("@misc{a, title = {X}, eprint = {2401.00001}}");
//! assert_eq!(records[0].arxiv_id.as_deref(), Some("2401.00001"));
//!
//! let text = bibtex::serialize(&records);
//! assert!(text.contains("eprint = {2401.00001}"));
//! ```

mod parser;
mod writer;

use std::path::{Path, PathBuf};

use crate::models::Record;

pub use parser::parse;
pub use writer::{render_entry, serialize};

/// Written in place of a `{` with no partner so the value stays balanced
const STRAY_OPEN: &str = r"{\textbraceleft}";

/// Written in place of a `}` with no partner
const STRAY_CLOSE: &str = r"{\textbraceright}";

/// Errors from reading or writing `.bib` files
#[derive(Debug, thiserror::Error)]
pub enum BibError {
    /// The collection file does not exist
    #[error("BibTeX file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read and parse a `.bib` file
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Record>, BibError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BibError::NotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path)?;
    Ok(parse(&text))
}

/// Overwrite `path` with the serialized records
pub fn store(records: &[Record], path: impl AsRef<Path>) -> Result<(), BibError> {
    let path = path.as_ref();
    std::fs::write(path, serialize(records))?;
    tracing::debug!("Wrote {} entries to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bib");
        std::fs::write(
            &path,
            "@article{test2023,\n  title = {Test Paper},\n  author = {Test Author},\n  year = {2023},\n}\n",
        )
        .unwrap();

        let records = load(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cite_key, "test2023");
    }

    #[test]
    fn test_load_nonexistent() {
        let result = load("/nonexistent/path/file.bib");
        assert!(matches!(result, Err(BibError::NotFound(_))));
    }

    #[test]
    fn test_store_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output.bib");
        std::fs::write(&path, "@article{old, title = {Stale}}").unwrap();

        let records = vec![
            RecordBuilder::new("article", "paper1", "First Paper")
                .year("2023")
                .build(),
            RecordBuilder::new("article", "paper2", "Second Paper")
                .year("2024")
                .build(),
        ];
        store(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("@article{paper1,"));
        assert!(content.contains("@article{paper2,"));
        assert!(content.contains("Second Paper"));
        assert!(!content.contains("Stale"));
    }
}
