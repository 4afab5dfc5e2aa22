//! Paper metadata extraction.
//!
//! Fields are written as bold markers (`**Authors:** A, B and C`). The title
//! may instead come from the first level-1 heading of the opening cell. When
//! several metadata cells repeat a field, the first value wins.

use crate::classify::{Classification, Label};
use crate::error::{Error, Result, Warning};
use crate::model::{Cell, PaperMetadata};
use crate::render::{resolve_template, TemplateId};
use crate::text::{lines_with_ranges, normalize_whitespace, parse_heading};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*+]\s+)?\*\*\s*(title|authors?|institution|affiliations?|keywords?|template)\s*(?::\s*\*\*|\*\*\s*:)\s*(.*?)\s*$",
    )
    .unwrap()
});

static TITLE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^paper\s+title\s*:\s*").unwrap());

static AUTHOR_SEP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:;|&|,\s*and\s+|\s+and\s+|,)\s*").unwrap());

/// A metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Authors,
    Institution,
    Keywords,
    Template,
}

impl Field {
    fn parse(key: &str) -> Self {
        match key.to_lowercase().as_str() {
            "title" => Field::Title,
            "author" | "authors" => Field::Authors,
            "institution" | "affiliation" | "affiliations" => Field::Institution,
            "keyword" | "keywords" => Field::Keywords,
            _ => Field::Template,
        }
    }

    /// Field name.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Authors => "authors",
            Field::Institution => "institution",
            Field::Keywords => "keywords",
            Field::Template => "template",
        }
    }
}

/// A part of a cell that belongs to the title block and is left out of the
/// body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedRange {
    /// Cell index
    pub cell_index: usize,

    /// Byte range in the cell source
    pub range: Range<usize>,
}

/// Output of [`extract_metadata`].
#[derive(Debug, Clone)]
pub struct MetadataExtraction {
    /// The paper metadata
    pub metadata: PaperMetadata,

    /// Field and title lines to strip from the body
    pub consumed: Vec<ConsumedRange>,

    /// Recoverable problems
    pub warnings: Vec<Warning>,
}

/// Whether a text contains a bold metadata field marker.
pub fn has_field_marker(source: &str) -> bool {
    lines_with_ranges(source).any(|(_, line)| FIELD_RE.is_match(line))
}

/// Whether a metadata cell holds anything besides field lines (and, for the
/// opening cell, its title heading).
pub fn has_other_content(source: &str, title_heading: bool) -> bool {
    let mut heading_seen = !title_heading;
    for (_, line) in lines_with_ranges(source) {
        if line.trim().is_empty() || FIELD_RE.is_match(line) {
            continue;
        }
        if !heading_seen && matches!(parse_heading(line), Some((1, _))) {
            heading_seen = true;
            continue;
        }
        return true;
    }
    false
}

/// Extract [`PaperMetadata`] from the cells labeled as metadata.
///
/// Fails with [`Error::MissingMetadata`] when no title or no author is found.
pub fn extract_metadata(cells: &[Cell], classification: &Classification) -> Result<MetadataExtraction> {
    let mut fields = FieldState::default();
    let mut consumed = Vec::new();
    let mut warnings = Vec::new();
    let mut heading_title: Option<(String, ConsumedRange)> = None;

    for position in classification.positions_with(Label::Metadata) {
        let cell = &cells[position];

        for (range, line) in lines_with_ranges(&cell.source) {
            if let Some(caps) = FIELD_RE.captures(line) {
                let field = Field::parse(&caps[1]);
                let value = normalize_whitespace(&caps[2]);
                consumed.push(ConsumedRange {
                    cell_index: cell.index,
                    range,
                });
                if value.is_empty() {
                    continue;
                }
                if fields.seen.contains(&field) {
                    log::warn!(
                        "Metadata field '{}' repeated in cell {}, ignored",
                        field.name(),
                        cell.index
                    );
                    warnings.push(Warning::DuplicateMetadata {
                        cell_index: cell.index,
                        field: field.name().to_string(),
                    });
                    continue;
                }
                fields.seen.push(field);
                if let Some(warning) = fields.set(field, value) {
                    warnings.push(warning);
                }
            } else if position == 0 && heading_title.is_none() {
                if let Some((1, text)) = parse_heading(line) {
                    heading_title = Some((
                        text.to_string(),
                        ConsumedRange {
                            cell_index: cell.index,
                            range,
                        },
                    ));
                }
            }
        }
    }

    let title = match (fields.title.take(), heading_title) {
        (Some(title), _) => title,
        (None, Some((text, range))) => {
            consumed.push(range);
            clean_title(&text)
        }
        (None, None) => String::new(),
    };
    if title.is_empty() {
        return Err(Error::MissingMetadata("title".into()));
    }

    let authors = fields.authors.take().unwrap_or_default();
    if authors.is_empty() {
        return Err(Error::MissingMetadata("authors".into()));
    }

    let mut metadata = PaperMetadata::new(title, authors).with_template(fields.template);
    metadata.institution = fields.institution.take();
    for keyword in fields.keywords.drain(..) {
        metadata.add_keyword(keyword);
    }

    log::debug!(
        "Metadata: '{}' by {} author(s), template {}",
        metadata.title,
        metadata.authors.len(),
        metadata.template
    );

    consumed.sort_by_key(|c| (c.cell_index, c.range.start));
    Ok(MetadataExtraction {
        metadata,
        consumed,
        warnings,
    })
}

#[derive(Default)]
struct FieldState {
    seen: Vec<Field>,
    title: Option<String>,
    authors: Option<Vec<String>>,
    institution: Option<String>,
    keywords: Vec<String>,
    template: TemplateId,
}

impl FieldState {
    fn set(&mut self, field: Field, value: String) -> Option<Warning> {
        match field {
            Field::Title => self.title = Some(clean_title(&value)),
            Field::Authors => self.authors = Some(split_authors(&value)),
            Field::Institution => self.institution = Some(strip_emphasis(&value).to_string()),
            Field::Keywords => self.keywords = split_keywords(&value),
            Field::Template => {
                let (id, warning) = resolve_template(&value);
                self.template = id;
                return warning;
            }
        }
        None
    }
}

fn strip_emphasis(value: &str) -> &str {
    value.trim_matches(|c: char| c == '*' || c == '_').trim()
}

fn clean_title(value: &str) -> String {
    let value = strip_emphasis(value);
    TITLE_PREFIX_RE.replace(value, "").trim().to_string()
}

/// Split an author list on commas, semicolons, `&` and "and".
pub fn split_authors(value: &str) -> Vec<String> {
    AUTHOR_SEP_RE
        .split(value)
        .map(strip_emphasis)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_keywords(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == ';')
        .map(|k| strip_emphasis(k).trim_end_matches('.').trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}
