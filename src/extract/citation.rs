//! Reference list extraction.
//!
//! Every non-blank line after a `References` (or `Bibliography`) heading is
//! one entry, up to the next heading; the list may continue across cells.

use crate::error::Warning;
use crate::model::{CitationEntry, Cell, SectionKind};
use crate::text::{fold_ascii_letters, lines_with_ranges, normalize_whitespace, parse_heading};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static LIST_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[-*+]|\d+[.)])\s+").unwrap());

static LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\w+)\]\s*").unwrap());

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2})[a-z]?\b").unwrap());

/// First-author patterns, tried in order.
static SURNAME_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Smith, J. / Smith, John
        r"^(\p{Lu}[\p{L}'\-]+)\s*,",
        // J. Smith / J. A. Smith
        r"^(?:\p{Lu}\.\s*)+(\p{Lu}[\p{L}'\-]+)",
        // Smith J / Smith JA.
        r"^(\p{Lu}[\p{L}'\-]+)\s+\p{Lu}{1,3}\b",
        // Smith (2020) / Smith et al. / Smith and Doe
        r"^(\p{Lu}[\p{L}'\-]+)\s*(?:\(|et\s+al|and\b|&)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Output of [`extract_citations`].
#[derive(Debug, Clone, Default)]
pub struct CitationExtraction {
    /// Entries in list order
    pub citations: Vec<CitationEntry>,

    /// Recoverable problems
    pub warnings: Vec<Warning>,
}

/// Collect the reference list of a notebook.
pub fn extract_citations(cells: &[Cell]) -> CitationExtraction {
    let mut extraction = CitationExtraction::default();
    let mut keys = HashSet::new();
    let mut in_references = false;

    for cell in cells.iter().filter(|c| c.is_text()) {
        for (_, line) in lines_with_ranges(&cell.source) {
            if let Some((_, heading)) = parse_heading(line) {
                in_references = SectionKind::from_heading(heading) == SectionKind::References;
                continue;
            }
            if !in_references || line.trim().is_empty() {
                continue;
            }

            let ordinal = extraction.citations.len() + 1;
            let (entry, ambiguous) = parse_entry(line, ordinal, cell.index, &mut keys);
            if ambiguous {
                log::warn!(
                    "Reference '{}' could not be parsed, keyed as '{}'",
                    entry.raw,
                    entry.key
                );
                extraction.warnings.push(Warning::CitationParseAmbiguous {
                    line: entry.raw.clone(),
                    key: entry.key.clone(),
                });
            }
            extraction.citations.push(entry);
        }
    }

    log::debug!("Extracted {} reference(s)", extraction.citations.len());
    extraction
}

fn parse_entry(
    line: &str,
    ordinal: usize,
    cell_index: usize,
    keys: &mut HashSet<String>,
) -> (CitationEntry, bool) {
    let raw = normalize_whitespace(line);
    let mut text = LIST_MARKER_RE.replace(&raw, "").to_string();

    let label = LABEL_RE.captures(&text).map(|caps| caps[1].to_string());
    if label.is_some() {
        text = LABEL_RE.replace(&text, "").to_string();
    }

    let surname = first_author_surname(&text);
    let year = YEAR_RE.captures(&text).map(|caps| caps[1].to_string());
    let (base, ambiguous) = match (surname, year) {
        (Some(surname), Some(year)) => (format!("{}{}", surname, year), false),
        (Some(surname), None) => (surname, false),
        (None, _) => (format!("ref{}", ordinal), true),
    };
    let key = unique_key(base, keys);

    (
        CitationEntry {
            raw,
            text,
            key,
            label,
            cell_index,
        },
        ambiguous,
    )
}

/// The first author's surname folded to ASCII letters.
pub fn first_author_surname(text: &str) -> Option<String> {
    SURNAME_RES
        .iter()
        .filter_map(|re| re.captures(text))
        .map(|caps| fold_ascii_letters(&caps[1]))
        .find(|s| !s.is_empty())
}

fn unique_key(base: String, keys: &mut HashSet<String>) -> String {
    if keys.insert(base.clone()) {
        return base;
    }
    let mut n = 0usize;
    loop {
        let candidate = format!("{}{}", base, suffix(n));
        if keys.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// `a`, `b`, … `z`, `aa`, `ab`, …
fn suffix(mut n: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'a' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarningKind;

    #[test]
    fn test_reference_section_across_cells() {
        let cells = vec![
            Cell::narrative(0, "## Introduction\nAs shown in [1]."),
            Cell::narrative(
                1,
                "## References\n[1] Smith,   J. (2020). Title.\n\n- J. Doe and A. Roe, Acoustics, 2019",
            ),
            Cell::code(2, "x = 1"),
            Cell::narrative(3, "Müller, K. Untitled notes.\n## Appendix\nNot a reference."),
        ];
        let result = extract_citations(&cells);

        let keys: Vec<_> = result.citations.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["Smith2020", "Doe2019", "Muller"]);
        assert_eq!(result.citations[0].label.as_deref(), Some("1"));
        assert_eq!(result.citations[0].raw, "[1] Smith, J. (2020). Title.");
        assert_eq!(result.citations[0].text, "Smith, J. (2020). Title.");
        assert_eq!(result.citations[1].text, "J. Doe and A. Roe, Acoustics, 2019");
        assert_eq!(result.citations[2].cell_index, 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_key_collisions_and_fallback() {
        let cells = vec![Cell::narrative(
            0,
            "# Bibliography\nSmith, J. (2020). A.\nSmith, K. (2020). B.\nSmith, L. 2020. C.\nhttps://example.org/data",
        )];
        let result = extract_citations(&cells);

        let keys: Vec<_> = result.citations.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["Smith2020", "Smith2020a", "Smith2020b", "ref4"]);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind(), WarningKind::CitationParseAmbiguous);
    }

    #[test]
    fn test_no_references() {
        let cells = vec![Cell::narrative(0, "## Results\nNothing cited.")];
        assert!(extract_citations(&cells).citations.is_empty());
    }

    #[test]
    fn test_surname_patterns() {
        assert_eq!(first_author_surname("Smith J, Doe A. Title"), Some("Smith".into()));
        assert_eq!(first_author_surname("Smith et al. (2021)"), Some("Smith".into()));
        assert_eq!(first_author_surname("O'Neil, P."), Some("ONeil".into()));
        assert_eq!(first_author_surname("see the manual"), None);
    }

    #[test]
    fn test_suffix() {
        assert_eq!(suffix(0), "a");
        assert_eq!(suffix(25), "z");
        assert_eq!(suffix(26), "aa");
    }
}
