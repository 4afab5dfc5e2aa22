//! Math span detection and equation extraction.
//!
//! Display spans (`$$..$$`, `\[..\]`, math environments) are located first;
//! inline spans (`$..$`, `\(..\)`) are then searched in the remaining text,
//! so the two never overlap. Escaped dollars and code (fenced blocks and
//! backtick spans) are skipped. Inline `$` follows the pandoc rules: the
//! opening `$` is followed by a non-space, the closing `$` is preceded by a
//! non-space and not followed by a digit, and the span does not cross a
//! blank line.

use crate::classify::{Classification, Label};
use crate::model::{Annotation, Cell, Equation, MathKind};
use crate::text::{
    fenced_code_ranges, in_ranges, inline_code_ranges, normalize_whitespace, sentence_end,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

const MATH_ENVIRONMENTS: &[&str] = &[
    "equation",
    "align",
    "gather",
    "multline",
    "eqnarray",
    "displaymath",
];

static INTERPRETATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(physical interpretation[ \t]*:|physically[ \t]*,|perceptual interpretation[ \t]*:|perceptually[ \t]*,)")
        .unwrap()
});

/// A math span located in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan {
    /// Span including delimiters
    pub range: Range<usize>,

    /// Math content without delimiters
    pub content: Range<usize>,

    /// Display or inline
    pub kind: MathKind,

    /// Environment name for `\begin{..}` spans
    pub environment: Option<String>,
}

impl MathSpan {
    /// Whether this is a display span.
    pub fn is_display(&self) -> bool {
        self.kind == MathKind::Display
    }
}

/// Find all math spans of a text, in source order.
pub fn find_math_spans(text: &str) -> Vec<MathSpan> {
    let fenced = fenced_code_ranges(text);
    let mut masked = inline_code_ranges(text, &fenced);
    masked.extend(fenced);

    let display = find_display_spans(text, &masked);
    masked.extend(display.iter().map(|s| s.range.clone()));
    let inline = find_inline_spans(text, &masked);

    let mut spans = display;
    spans.extend(inline);
    spans.sort_by_key(|s| s.range.start);
    spans
}

fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let backslashes = bytes[..pos].iter().rev().take_while(|b| **b == b'\\').count();
    backslashes % 2 == 1
}

fn skip_masked(masked: &[Range<usize>], pos: usize) -> Option<usize> {
    masked.iter().find(|r| r.contains(&pos)).map(|r| r.end)
}

/// Find an unescaped closing delimiter at or after `from` that is not
/// inside a masked range.
fn find_closing(text: &str, from: usize, delim: &str, masked: &[Range<usize>]) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut search = from;
    while let Some(rel) = text.get(search..)?.find(delim) {
        let pos = search + rel;
        if in_ranges(masked, pos) || (delim.starts_with('$') && is_escaped(bytes, pos)) {
            search = pos + 1;
            continue;
        }
        return Some(pos);
    }
    None
}

fn find_display_spans(text: &str, masked: &[Range<usize>]) -> Vec<MathSpan> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = skip_masked(masked, i) {
            i = end;
            continue;
        }

        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'$') && !is_escaped(bytes, i) {
            match find_closing(text, i + 2, "$$", masked) {
                Some(close) => {
                    spans.push(MathSpan {
                        range: i..close + 2,
                        content: i + 2..close,
                        kind: MathKind::Display,
                        environment: None,
                    });
                    i = close + 2;
                }
                None => i += 2,
            }
            continue;
        }

        if bytes[i] == b'\\' {
            if text[i..].starts_with("\\[") {
                if let Some(close) = find_closing(text, i + 2, "\\]", masked) {
                    spans.push(MathSpan {
                        range: i..close + 2,
                        content: i + 2..close,
                        kind: MathKind::Display,
                        environment: None,
                    });
                    i = close + 2;
                    continue;
                }
            } else if let Some(span) = environment_span(text, i, masked) {
                i = span.range.end;
                spans.push(span);
                continue;
            }
            // skip the escaped character
            i += 2;
            continue;
        }

        i += 1;
    }
    spans
}

fn environment_span(text: &str, start: usize, masked: &[Range<usize>]) -> Option<MathSpan> {
    let rest = text[start..].strip_prefix("\\begin{")?;
    let close_brace = rest.find('}')?;
    let name = &rest[..close_brace];
    let base = name.strip_suffix('*').unwrap_or(name);
    if !MATH_ENVIRONMENTS.contains(&base) {
        return None;
    }

    let content_start = start + "\\begin{".len() + close_brace + 1;
    let end_marker = format!("\\end{{{}}}", name);
    let close = find_closing(text, content_start, &end_marker, masked)?;
    Some(MathSpan {
        range: start..close + end_marker.len(),
        content: content_start..close,
        kind: MathKind::Display,
        environment: Some(name.to_string()),
    })
}

fn find_inline_spans(text: &str, masked: &[Range<usize>]) -> Vec<MathSpan> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = skip_masked(masked, i) {
            i = end;
            continue;
        }

        match bytes[i] {
            b'\\' if text[i..].starts_with("\\(") => {
                match find_closing(text, i + 2, "\\)", masked) {
                    Some(close) => {
                        spans.push(MathSpan {
                            range: i..close + 2,
                            content: i + 2..close,
                            kind: MathKind::Inline,
                            environment: None,
                        });
                        i = close + 2;
                    }
                    None => i += 2,
                }
            }
            b'\\' => i += 2,
            b'$' => match inline_dollar_close(text, i, masked) {
                Some(close) => {
                    spans.push(MathSpan {
                        range: i..close + 1,
                        content: i + 1..close,
                        kind: MathKind::Inline,
                        environment: None,
                    });
                    i = close + 1;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
    spans
}

fn inline_dollar_close(text: &str, open: usize, masked: &[Range<usize>]) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes.get(open + 1) {
        Some(b) if !b.is_ascii_whitespace() && *b != b'$' => {}
        _ => return None,
    }

    let mut j = open + 1;
    while j < bytes.len() {
        if in_ranges(masked, j) {
            return None;
        }
        match bytes[j] {
            b'\\' => {
                j += 2;
                continue;
            }
            b'\n' if bytes.get(j + 1) == Some(&b'\n') => return None,
            b'$' => {
                let before_ok = !bytes[j - 1].is_ascii_whitespace();
                let after_ok = !bytes.get(j + 1).map_or(false, |b| b.is_ascii_digit());
                if before_ok && after_ok {
                    return Some(j);
                }
            }
            _ => {}
        }
        j += 1;
    }
    None
}

/// Build [`Equation`]s from the math spans of one text.
pub fn equations_in(cell_index: usize, text: &str) -> Vec<Equation> {
    find_math_spans(text)
        .into_iter()
        .map(|span| {
            let source = text[span.content.clone()].trim();
            let mut equation = Equation::new(source, span.kind, cell_index, span.range);
            equation.environment = span.environment;
            equation
        })
        .collect()
}

/// Extract all equations of the equation-bearing cells, in source order,
/// with their interpretation annotations attached.
pub fn extract_equations(cells: &[Cell], classification: &Classification) -> Vec<Equation> {
    let mut equations = Vec::new();

    for position in classification.positions_with(Label::EquationBearing) {
        let cell = &cells[position];
        let mut found = equations_in(cell.index, &cell.source);

        for k in 0..found.len() {
            let window_end = found[k + 1..]
                .iter()
                .find(|next| next.is_display() || !found[k].is_display())
                .map(|next| next.span.start);

            let (physical, perceptual) = match window_end {
                Some(end) => find_annotations(cell.index, &cell.source, found[k].span.end..end),
                None => {
                    let own = find_annotations(
                        cell.index,
                        &cell.source,
                        found[k].span.end..cell.source.len(),
                    );
                    let next = next_text_cell(cells, position)
                        .map(|next| {
                            let limit = first_span_start(&next.source, found[k].is_display());
                            find_annotations(next.index, &next.source, 0..limit)
                        })
                        .unwrap_or((None, None));
                    (own.0.or(next.0), own.1.or(next.1))
                }
            };

            found[k].physical = physical;
            found[k].perceptual = perceptual;
        }

        equations.extend(found);
    }

    log::debug!(
        "Extracted {} equation(s), {} display",
        equations.len(),
        equations.iter().filter(|e| e.is_display()).count()
    );
    equations
}

fn next_text_cell(cells: &[Cell], position: usize) -> Option<&Cell> {
    cells.get(position + 1).filter(|c| c.is_text())
}

fn first_span_start(text: &str, display_only: bool) -> usize {
    find_math_spans(text)
        .into_iter()
        .find(|s| s.is_display() || !display_only)
        .map(|s| s.range.start)
        .unwrap_or(text.len())
}

/// Search a window of a text for interpretation sentences. The marker must
/// start inside the window; the sentence may run past it.
pub fn find_annotations(
    cell_index: usize,
    text: &str,
    window: Range<usize>,
) -> (Option<Annotation>, Option<Annotation>) {
    let mut physical = None;
    let mut perceptual = None;
    let region = match text.get(window.clone()) {
        Some(region) => region,
        None => return (None, None),
    };

    for caps in INTERPRETATION_RE.captures_iter(region) {
        let marker = match caps.get(1) {
            Some(m) => m,
            None => continue,
        };
        let start = window.start + marker.start();
        let end = sentence_end(text, start);
        let label = marker.as_str().to_lowercase();
        let body_start = if label.ends_with(':') {
            (window.start + marker.end()).min(end)
        } else {
            start
        };
        let annotation = Annotation {
            text: normalize_whitespace(&text[body_start..end]),
            cell_index,
            span: start..end,
        };

        if label.starts_with("physical") {
            physical.get_or_insert(annotation);
        } else {
            perceptual.get_or_insert(annotation);
        }
    }

    (physical, perceptual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    fn sources(spans: &[MathSpan], text: &str) -> Vec<String> {
        spans
            .iter()
            .map(|s| text[s.content.clone()].trim().to_string())
            .collect()
    }

    #[test]
    fn test_display_and_inline() {
        let text = "Energy $E$ is\n$$E = mc^2$$\nand \\[a+b\\] with \\(c\\).";
        let spans = find_math_spans(text);
        assert_eq!(sources(&spans, text), vec!["E", "E = mc^2", "a+b", "c"]);
        let kinds: Vec<_> = spans.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MathKind::Inline,
                MathKind::Display,
                MathKind::Display,
                MathKind::Inline
            ]
        );
    }

    #[test]
    fn test_environment() {
        let text = "\\begin{align*}\na &= b\n\\end{align*}\n\\begin{itemize}\\end{itemize}";
        let spans = find_math_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].environment.as_deref(), Some("align*"));
        assert_eq!(sources(&spans, text), vec!["a &= b"]);
    }

    #[test]
    fn test_escapes_currency_and_code() {
        let text = "Costs \\$5 and $10 today, `$x$` is code.\n```\n$$y$$\n```";
        assert!(find_math_spans(text).is_empty());
    }

    #[test]
    fn test_display_first_prevents_overlap() {
        let text = "$x $$y$$";
        let spans = find_math_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, MathKind::Display);
    }

    #[test]
    fn test_annotations_same_cell() {
        let text = "$$p = \\rho c v$$\nPhysical interpretation: pressure scales with velocity. \
                    Perceptually, louder sounds follow.";
        let cells = vec![Cell::narrative(0, text)];
        let classification = classify(&cells);
        let equations = extract_equations(&cells, &classification);

        assert_eq!(equations.len(), 1);
        let eq = &equations[0];
        assert_eq!(
            eq.physical.as_ref().unwrap().text,
            "pressure scales with velocity."
        );
        assert_eq!(
            eq.perceptual.as_ref().unwrap().text,
            "Perceptually, louder sounds follow."
        );
    }

    #[test]
    fn test_annotation_in_next_cell_and_order() {
        let cells = vec![
            Cell::narrative(0, "# T\n**Author:** A"),
            Cell::narrative(1, "First $$a$$"),
            Cell::narrative(2, "Physically, $a$ is an amplitude. Then $$a$$"),
        ];
        let classification = classify(&cells);
        let equations = extract_equations(&cells, &classification);

        let cells_of: Vec<_> = equations.iter().map(|e| e.cell_index).collect();
        assert_eq!(cells_of, vec![1, 2, 2]);
        assert_eq!(equations[0].source, "a");
        assert_eq!(equations[2].source, "a");
        assert_eq!(
            equations[0].physical.as_ref().unwrap().text,
            "Physically, $a$ is an amplitude."
        );
        assert_eq!(equations[0].physical.as_ref().unwrap().cell_index, 2);
        assert!(equations[2].physical.is_none());
    }

    #[test]
    fn test_marker_split_by_blank_line() {
        let cells = vec![Cell::narrative(
            0,
            "$$a$$\nPhysical interpretation\n\n: it grows.",
        )];
        let classification = classify(&cells);
        let equations = extract_equations(&cells, &classification);

        assert_eq!(equations.len(), 1);
        assert!(equations[0].physical.is_none());
    }

    #[test]
    fn test_marker_with_trailing_spaces() {
        let text = "$$a$$ Physical interpretation  : it grows.";
        let (physical, perceptual) = find_annotations(0, text, 5..text.len());
        assert_eq!(physical.unwrap().text, "it grows.");
        assert!(perceptual.is_none());
    }
}
