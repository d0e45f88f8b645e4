//! BibTeX writer.

use super::{STRAY_CLOSE, STRAY_OPEN};
use crate::models::Record;

/// Field names the writer emits from dedicated [`Record`] slots
const WRITTEN_FIELDS: &[&str] = &[
    "title",
    "author",
    "year",
    "doi",
    "eprint",
    "url",
    "abstract",
    "booktitle",
    "journal",
    "volume",
    "pages",
    "publisher",
];

/// Render one record as a BibTeX entry (no trailing newline)
///
/// Field order: title, author, year, doi, eprint, url, abstract, booktitle,
/// journal, volume, pages, publisher, then raw fields in insertion order.
/// Empty optional fields are omitted.
pub fn render_entry(record: &Record) -> String {
    let mut fields: Vec<(&str, String)> = vec![("title", record.title.clone())];

    if let Some(authors) = record.author_string() {
        fields.push(("author", authors));
    }

    let optional = [
        ("year", &record.year),
        ("doi", &record.doi),
        ("eprint", &record.arxiv_id),
        ("url", &record.url),
        ("abstract", &record.r#abstract),
        ("booktitle", &record.booktitle),
        ("journal", &record.journal),
        ("volume", &record.volume),
        ("pages", &record.pages),
        ("publisher", &record.publisher),
    ];
    for (name, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            fields.push((name, value.to_string()));
        }
    }

    for (name, value) in &record.raw_fields {
        if WRITTEN_FIELDS.contains(&name.as_str()) {
            tracing::debug!(
                "Dropping raw field `{}` on {}: shadowed by a known field",
                name,
                record.cite_key
            );
            continue;
        }
        fields.push((name.as_str(), value.clone()));
    }

    let entry_type = if record.entry_type.is_empty() {
        "misc"
    } else {
        record.entry_type.as_str()
    };

    let body = fields
        .iter()
        .map(|(name, value)| format!("  {} = {{{}}}", name, balance_braces(value)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!("@{}{{{},\n{}\n}}", entry_type, record.cite_key, body)
}

/// Replace braces without a partner in `value` so the written field stays
/// balanced; the reader turns the stand-ins back into plain braces
fn balance_braces(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut open = Vec::new();
    let mut stray = Vec::new();
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' if !escaped => open.push(i),
            b'}' if !escaped => {
                if open.pop().is_none() {
                    stray.push(i);
                }
            }
            _ => {}
        }
        escaped = b == b'\\' && !escaped;
    }

    if stray.is_empty() && open.is_empty() {
        return value.to_string();
    }
    stray.extend(open);
    stray.sort_unstable();

    let mut out = String::with_capacity(value.len() + stray.len() * STRAY_CLOSE.len());
    let mut last = 0;
    for i in stray {
        out.push_str(&value[last..i]);
        out.push_str(if bytes[i] == b'{' { STRAY_OPEN } else { STRAY_CLOSE });
        last = i + 1;
    }
    out.push_str(&value[last..]);
    out
}

/// Render a whole collection, entries separated by a blank line
pub fn serialize(records: &[Record]) -> String {
    records
        .iter()
        .map(|r| format!("{}\n", render_entry(r)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::parse;
    use crate::models::RecordBuilder;

    #[test]
    fn test_render_article() {
        let record = RecordBuilder::new("article", "smith2023", "A Great Paper")
            .authors(["John Smith", "Jane Doe"])
            .year("2023")
            .journal("Nature")
            .volume("123")
            .pages("1-10")
            .doi("10.1234/nature.2023")
            .build();

        let bibtex = render_entry(&record);
        assert!(bibtex.starts_with("@article{smith2023,"));
        assert!(bibtex.contains("title = {A Great Paper}"));
        assert!(bibtex.contains("author = {John Smith and Jane Doe}"));
        assert!(bibtex.contains("year = {2023}"));
        assert!(bibtex.contains("doi = {10.1234/nature.2023}"));
        assert!(bibtex.ends_with('}'));
    }

    #[test]
    fn test_render_inproceedings() {
        let record = RecordBuilder::new("inproceedings", "doe2024", "Conference Paper")
            .authors(["Jane Doe"])
            .year("2024")
            .booktitle("ICML 2024")
            .build();

        let bibtex = render_entry(&record);
        assert!(bibtex.contains("@inproceedings{doe2024,"));
        assert!(bibtex.contains("booktitle = {ICML 2024}"));
    }

    #[test]
    fn test_render_field_order() {
        let record = RecordBuilder::new("misc", "k", "T")
            .raw_field("note", "first extra")
            .publisher("ACM")
            .url("http://example.com")
            .arxiv_id("2401.00001")
            .year("2024")
            .authors(["A"])
            .raw_field("keywords", "second extra")
            .build();

        let bibtex = render_entry(&record);
        let names: Vec<&str> = bibtex
            .lines()
            .skip(1)
            .filter_map(|l| l.trim().split(" = ").next())
            .filter(|n| *n != "}")
            .collect();
        assert_eq!(
            names,
            vec!["title", "author", "year", "eprint", "url", "publisher", "note", "keywords"]
        );
    }

    #[test]
    fn test_render_skips_empty_optional_fields() {
        let mut record = RecordBuilder::new("article", "k", "T").build();
        record.doi = Some(String::new());
        assert!(!render_entry(&record).contains("doi"));
    }

    #[test]
    fn test_serialize_round_trip() {
        let records = vec![
            RecordBuilder::new("article", "paper1", "First Paper")
                .authors(["John Smith", "Jane Doe"])
                .year("2023")
                .doi("10.1/x")
                .url("http://keep")
                .abstract_text("We study things.")
                .journal("Nature")
                .volume("7")
                .pages("1--10")
                .publisher("Springer")
                .raw_field("keywords", "a, b")
                .build(),
            RecordBuilder::new("inproceedings", "paper2", "Second {Paper}")
                .arxiv_id("2401.00001")
                .booktitle("NeurIPS")
                .build(),
        ];

        let text = serialize(&records);
        assert!(text.contains("@article{paper1,"));
        assert!(text.contains("@inproceedings{paper2,"));

        let parsed = parse(&text);
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_balance_braces() {
        assert_eq!(balance_braces("The {LaTeX} Companion"), "The {LaTeX} Companion");
        assert_eq!(balance_braces("a { b"), r"a {\textbraceleft} b");
        assert_eq!(balance_braces("a } b {c}"), r"a {\textbraceright} b {c}");
        assert_eq!(balance_braces(r"set \{x\}"), r"set \{x\}");
    }

    #[test]
    fn test_stray_braces_round_trip() {
        let records = vec![
            RecordBuilder::new("article", "k", "Sets {x | x > 0 of reals")
                .raw_field("note", "closing } first { then {ok}")
                .build(),
            RecordBuilder::new("misc", "next", "Other").build(),
        ];

        let text = serialize(&records);
        assert!(text.contains(r"title = {Sets {\textbraceleft}x | x > 0 of reals}"));

        let parsed = parse(&text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_multiline_raw_field_round_trip() {
        let records = vec![RecordBuilder::new("misc", "k", "T")
            .abstract_text("First line.\n  Second line.")
            .raw_field("note", "a\n\nb")
            .build()];

        assert_eq!(parse(&serialize(&records)), records);
    }
}
