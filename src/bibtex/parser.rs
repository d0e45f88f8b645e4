//! BibTeX reader.
//!
//! Syntax is handled by `biblatex`'s raw parser, which keeps every entry's
//! fields in source order. This module resolves `@string` abbreviations and
//! maps the raw fields onto [`Record`] slots.

use biblatex::{RawBibliography, RawChunk};
use std::collections::HashMap;

use super::{STRAY_CLOSE, STRAY_OPEN};
use crate::models::{RawFields, Record};

/// Stand-in key for entries written without one; cleared after parsing
const KEYLESS_PLACEHOLDER: &str = "bib-enrich-keyless";

/// Month abbreviations every BibTeX style predefines
const MONTH_MACROS: &[(&str, &str)] = &[
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Parse BibTeX text into records.
///
/// Blank input yields an empty list. Entries missing a title or key still
/// parse, carrying empty strings for those fields. If the text as a whole does
/// not parse, each `@` block is read on its own and the malformed ones are
/// logged and skipped.
pub fn parse(text: &str) -> Vec<Record> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut reader = EntryReader::new();
    let records = match RawBibliography::parse(text) {
        Ok(bib) => reader.read(&bib),
        Err(e) => {
            tracing::warn!("BibTeX input has errors, reading entries one by one: {:?}", e);
            entry_blocks(text)
                .into_iter()
                .flat_map(|block| reader.read_block(block))
                .collect()
        }
    };

    tracing::debug!("Parsed {} BibTeX entries", records.len());
    records
}

/// Give a keyless entry (`@article{, ...}`) a placeholder key so it parses
fn fill_missing_key(block: &str) -> Option<String> {
    let open = block.find(['{', '('])?;
    if !block[open + 1..].trim_start().starts_with(',') {
        return None;
    }

    let mut patched = String::with_capacity(block.len() + KEYLESS_PLACEHOLDER.len());
    patched.push_str(&block[..=open]);
    patched.push_str(KEYLESS_PLACEHOLDER);
    patched.push_str(&block[open + 1..]);
    Some(patched)
}

/// Split text at every `@` that opens a line
fn entry_blocks(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = text
        .match_indices('@')
        .map(|(i, _)| i)
        .filter(|&i| {
            let before = text[..i].trim_end_matches([' ', '\t']);
            before.is_empty() || before.ends_with('\n')
        })
        .collect();

    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .filter(|block| !block.trim().is_empty())
        .collect()
}

/// Turns raw entries into records, remembering `@string` definitions
struct EntryReader {
    macros: HashMap<String, String>,
}

impl EntryReader {
    fn new() -> Self {
        let macros = MONTH_MACROS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self { macros }
    }

    fn read(&mut self, bib: &RawBibliography<'_>) -> Vec<Record> {
        for pair in &bib.abbreviations {
            let value = self.resolve(pair.value.v.iter().map(|chunk| &chunk.v));
            self.macros.insert(pair.key.v.to_ascii_lowercase(), value);
        }

        bib.entries
            .iter()
            .map(|entry| {
                let entry = &entry.v;
                let fields = entry
                    .fields
                    .iter()
                    .map(|pair| {
                        let value = self.resolve(pair.value.v.iter().map(|chunk| &chunk.v));
                        (pair.key.v.to_ascii_lowercase(), value)
                    })
                    .collect();

                into_record(entry.kind.v, entry.key.v, fields)
            })
            .collect()
    }

    /// Read a single `@` block, skipping it if it is malformed
    fn read_block(&mut self, block: &str) -> Vec<Record> {
        let error = match RawBibliography::parse(block) {
            Ok(bib) => return self.read(&bib),
            Err(e) => e,
        };

        if let Some(patched) = fill_missing_key(block) {
            if let Ok(bib) = RawBibliography::parse(&patched) {
                let mut records = self.read(&bib);
                for record in &mut records {
                    if record.cite_key == KEYLESS_PLACEHOLDER {
                        record.cite_key.clear();
                    }
                }
                return records;
            }
        }

        tracing::warn!("Skipping malformed BibTeX entry: {:?}", error);
        Vec::new()
    }

    /// Join a value's parts, expanding abbreviations; unknown names stay verbatim
    fn resolve<'a, 's: 'a>(&self, chunks: impl Iterator<Item = &'a RawChunk<'s>>) -> String {
        let mut value = String::new();
        for chunk in chunks {
            match chunk {
                RawChunk::Normal(text) => value.push_str(text),
                RawChunk::Abbreviation(name) => match self.macros.get(&name.to_ascii_lowercase()) {
                    Some(expansion) => value.push_str(expansion),
                    None => value.push_str(name),
                },
            }
        }

        value
            .replace(STRAY_OPEN, "{")
            .replace(STRAY_CLOSE, "}")
    }
}

fn into_record(kind: &str, key: &str, fields: Vec<(String, String)>) -> Record {
    let mut fields: RawFields = fields.into_iter().collect();

    let mut take = |name: &str| {
        fields
            .shift_remove(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let title = take("title").map(|t| collapse(&t)).unwrap_or_default();
    let authors = take("author").and_then(|a| split_authors(&collapse(&a)));
    let year = take("year");
    let doi = take("doi");
    let url = take("url");
    let abstract_text = take("abstract");
    let booktitle = take("booktitle");
    let journal = take("journal");
    let volume = take("volume");
    let pages = take("pages");
    let publisher = take("publisher");
    // eprint wins over arxiv when both are present
    let eprint = take("eprint");
    let arxiv = take("arxiv");
    let arxiv_id = eprint.or(arxiv);

    let entry_type = match kind.trim() {
        "" => "misc".to_string(),
        kind => kind.to_ascii_lowercase(),
    };

    Record {
        entry_type,
        cite_key: key.trim().to_string(),
        title,
        authors,
        year,
        venue: None,
        doi,
        arxiv_id,
        url,
        r#abstract: abstract_text,
        booktitle,
        journal,
        volume,
        pages,
        publisher,
        raw_fields: fields,
    }
}

/// Split a BibTeX author list on the literal " and " separator
fn split_authors(author_string: &str) -> Option<Vec<String>> {
    let authors: Vec<String> = author_string
        .split(" and ")
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    (!authors.is_empty()).then_some(authors)
}

/// Collapse runs of whitespace (including newlines) into single spaces
fn collapse(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_article() {
        let bib = r#"
        @article{smith2023paper,
            title = {A Simple Paper Title},
            author = {Smith, John and Doe, Jane},
            year = {2023},
            journal = {Nature},
        }
        "#;

        let records = parse(bib);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.entry_type, "article");
        assert_eq!(record.cite_key, "smith2023paper");
        assert_eq!(record.title, "A Simple Paper Title");
        assert_eq!(
            record.authors,
            Some(vec!["Smith, John".to_string(), "Doe, Jane".to_string()])
        );
        assert_eq!(record.year.as_deref(), Some("2023"));
        assert_eq!(record.journal.as_deref(), Some("Nature"));
        assert!(record.raw_fields.is_empty());
    }

    #[test]
    fn test_parse_inproceedings() {
        let bib = r#"
        @inproceedings{doe2024neurips,
            title = {Conference Paper Title},
            author = {Doe, Jane},
            booktitle = {NeurIPS 2024},
            year = {2024},
        }
        "#;

        let records = parse(bib);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_type, "inproceedings");
        assert_eq!(records[0].booktitle.as_deref(), Some("NeurIPS 2024"));
    }

    #[test]
    fn test_parse_eprint_is_arxiv_id() {
        let records = parse("@misc{a, title={X}, eprint={2401.00001}}");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].arxiv_id.as_deref(), Some("2401.00001"));
        assert!(!records[0].raw_fields.contains_key("eprint"));
        assert!(!records[0].raw_fields.contains_key("arxiv"));
    }

    #[test]
    fn test_parse_eprint_preferred_over_arxiv() {
        let records = parse("@misc{a, title={X}, arxiv={1111.1111}, eprint={2222.2222}}");
        assert_eq!(records[0].arxiv_id.as_deref(), Some("2222.2222"));
        assert!(records[0].raw_fields.is_empty());

        let records = parse("@misc{b, title={Y}, arxiv={1111.1111}}");
        assert_eq!(records[0].arxiv_id.as_deref(), Some("1111.1111"));
    }

    #[test]
    fn test_parse_keeps_unknown_fields_in_order() {
        let bib = r#"
        @misc{arxiv2024,
            title = {ArXiv Paper},
            author = {Researcher, A.},
            eprint = {2401.12345},
            archiveprefix = {arXiv},
            primaryclass = {cs.LG},
            keywords = {transformers},
            year = {2024},
        }
        "#;

        let records = parse(bib);
        let names: Vec<&str> = records[0].raw_fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["archiveprefix", "primaryclass", "keywords"]);
        assert_eq!(records[0].arxiv_id.as_deref(), Some("2401.12345"));
    }

    #[test]
    fn test_parse_multiple_entries_in_order() {
        let bib = r#"
        @article{paper1,
            title = {First Paper},
            year = {2023},
        }
        @article{paper2,
            title = {Second Paper},
            year = {2024},
        }
        @book{paper3, title = "Third {Paper}"}
        "#;

        let records = parse(bib);
        let keys: Vec<&str> = records.iter().map(|r| r.cite_key.as_str()).collect();
        assert_eq!(keys, vec!["paper1", "paper2", "paper3"]);
        assert_eq!(records[2].title, "Third {Paper}");
    }

    #[test]
    fn test_parse_blank_input() {
        assert!(parse("").is_empty());
        assert!(parse("   \n\t  ").is_empty());
    }

    #[test]
    fn test_parse_missing_title() {
        let records = parse("@article{k, year = {2020}}");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cite_key, "k");
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].year.as_deref(), Some("2020"));
    }

    #[test]
    fn test_parse_missing_key() {
        let bib = "@article{, year = {2020}}
@misc{after, title = {Next}}";
        let records = parse(bib);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cite_key, "");
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].year.as_deref(), Some("2020"));
        assert_eq!(records[1].cite_key, "after");
    }

    #[test]
    fn test_fill_missing_key() {
        assert_eq!(
            fill_missing_key("@misc{ , title = {T}}").as_deref(),
            Some("@misc{bib-enrich-keyless , title = {T}}")
        );
        assert_eq!(fill_missing_key("@misc{k, title = {T}}"), None);
    }

    #[test]
    fn test_parse_empty_author_is_absent() {
        let records = parse("@article{k, title = {T}, author = {}}");
        assert_eq!(records[0].authors, None);
    }

    #[test]
    fn test_parse_nested_braces_and_multiline() {
        let bib = "@article{k,\n  title = {The {LaTeX}\n    Companion},\n  author = {Smith, John and\n            Doe, Jane}\n}";
        let records = parse(bib);
        assert_eq!(records[0].title, "The {LaTeX} Companion");
        assert_eq!(
            records[0].authors,
            Some(vec!["Smith, John".to_string(), "Doe, Jane".to_string()])
        );
    }

    #[test]
    fn test_parse_keeps_line_breaks_in_other_fields() {
        let bib = "@article{k,\n  title = {T},\n  abstract = {First line.\n  Second line.},\n  note = {a\n\nb}\n}";
        let records = parse(bib);
        assert_eq!(
            records[0].r#abstract.as_deref(),
            Some("First line.\n  Second line.")
        );
        assert_eq!(
            records[0].raw_fields.get("note").map(String::as_str),
            Some("a\n\nb")
        );
    }

    #[test]
    fn test_parse_abbreviations_and_concatenation() {
        let bib = r#"
        @string{conf = "Proceedings of"}
        @comment{ignored {entirely}}
        @inproceedings{k,
            title = {T},
            booktitle = conf # " ICML",
            month = jan,
            year = 2021
        }
        "#;

        let records = parse(bib);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].booktitle.as_deref(), Some("Proceedings of ICML"));
        assert_eq!(records[0].year.as_deref(), Some("2021"));
        assert_eq!(
            records[0].raw_fields.get("month").map(String::as_str),
            Some("January")
        );
    }

    #[test]
    fn test_parse_lowercases_kind_and_field_names() {
        let records = parse("@Article{k, Title = {T}, DOI = {10.1/x}}");
        assert_eq!(records[0].entry_type, "article");
        assert_eq!(records[0].title, "T");
        assert_eq!(records[0].doi.as_deref(), Some("10.1/x"));
    }

    #[test]
    fn test_parse_skips_malformed_entry() {
        let bib = "@article{bad, title = }\n@article{good, title = {Fine}}";
        let records = parse(bib);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cite_key, "good");
    }

    #[test]
    fn test_parse_restores_stray_braces() {
        let records = parse(r"@misc{k, title = {Sets {\textbraceleft}x | x > 0 of reals}}");
        assert_eq!(records[0].title, "Sets {x | x > 0 of reals");
    }

    #[test]
    fn test_entry_blocks() {
        let text = "% header\n@article{a, title = {A}}\n  @misc{b, note = {x@y}}\n";
        let blocks = entry_blocks(text);
        assert_eq!(blocks.len(), 3);
        assert!(blocks[1].starts_with("@article{a"));
        assert!(blocks[2].trim_start().starts_with("@misc{b"));
        assert!(blocks[2].contains("x@y"));
    }
}
