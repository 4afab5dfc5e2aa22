//! BibTeX output.

use super::inline::escape_text;
use crate::model::CitationEntry;

/// Render the reference list as a BibTeX file.
///
/// Entries are `@misc` records in list order. The file always starts with a
/// comment header, so an empty list still yields a valid, non-empty file.
pub fn to_bibtex(citations: &[CitationEntry]) -> String {
    let mut out = String::from("% Bibliography generated by nbpaper\n");
    if citations.is_empty() {
        out.push_str("% No references were found in the notebook.\n");
        return out;
    }

    out.push_str(&format!("% {} reference(s)\n", citations.len()));
    for citation in citations {
        out.push('\n');
        out.push_str(&format!("@misc{{{},\n", citation.key));
        out.push_str(&format!("  key = {{{}}},\n", citation.key));
        let note = escape_text(&balance_braces(&citation.text));
        out.push_str(&format!("  note = {{{}}}\n", note));
        out.push_str("}\n");
    }
    out
}

/// Drop braces without a partner; BibTeX counts braces even when escaped.
fn balance_braces(text: &str) -> String {
    let mut unmatched = Vec::new();
    let mut open = Vec::new();
    for (i, c) in text.char_indices() {
        match c {
            '{' => open.push(i),
            '}' => {
                if open.pop().is_none() {
                    unmatched.push(i);
                }
            }
            _ => {}
        }
    }
    unmatched.extend(open);

    text.char_indices()
        .filter(|(i, _)| !unmatched.contains(i))
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bibliography_has_header() {
        let bib = to_bibtex(&[]);
        assert!(bib.starts_with('%'));
        assert!(!bib.contains('@'));
    }

    #[test]
    fn test_entries_in_order() {
        let entry = |key: &str, text: &str| CitationEntry {
            raw: text.into(),
            text: text.into(),
            key: key.into(),
            label: None,
            cell_index: 0,
        };
        let bib = to_bibtex(&[
            entry("Smith2020", "Smith, J. (2020). Sound & noise."),
            entry("ref2", "Untitled"),
        ]);

        let smith = bib.find("@misc{Smith2020,").unwrap();
        let second = bib.find("@misc{ref2,").unwrap();
        assert!(smith < second);
        assert!(bib.contains("  note = {Smith, J. (2020). Sound \\& noise.}\n"));
        assert!(bib.contains("  key = {ref2},\n"));
    }

    #[test]
    fn test_unmatched_braces_dropped() {
        assert_eq!(balance_braces("a } b {c} {d"), "a  b {c} d");
        let bib = to_bibtex(&[CitationEntry {
            raw: "Doe, J. (2019). Sets {A.".into(),
            text: "Doe, J. (2019). Sets {A.".into(),
            key: "Doe2019".into(),
            label: None,
            cell_index: 0,
        }]);
        assert!(bib.contains("  note = {Doe, J. (2019). Sets A.}\n"));
    }
}
