//! Text helpers shared by the extractors and the builder.

use std::ops::Range;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Collapse whitespace runs to single spaces, trim, and normalize to NFC.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.nfc().collect()
}

/// Fold text to its ASCII letters (NFD, combining marks dropped).
///
/// `"Müller"` becomes `"Muller"`; letters without an ASCII base are dropped.
pub fn fold_ascii_letters(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphabetic())
        .collect()
}

/// Lines of a text with their byte offsets. The yielded slice excludes the
/// line terminator; the range includes it.
pub fn lines_with_ranges(text: &str) -> impl Iterator<Item = (Range<usize>, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches('\n').trim_end_matches('\r');
        (start..offset, line)
    })
}

/// An ATX markdown heading line (`## Methods`).
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let level = trimmed.bytes().take_while(|b| *b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(|c: char| c == ' ' || c == '\t') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    if text.is_empty() {
        return None;
    }
    Some((level as u8, text))
}

/// Byte ranges of fenced code blocks (``` or ~~~), fences included.
/// An unclosed fence runs to the end of the text.
pub fn fenced_code_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut open: Option<(usize, &str)> = None;

    for (range, line) in lines_with_ranges(text) {
        let trimmed = line.trim_start();
        let fence = if trimmed.starts_with("```") {
            Some("```")
        } else if trimmed.starts_with("~~~") {
            Some("~~~")
        } else {
            None
        };

        match (open, fence) {
            (None, Some(f)) => open = Some((range.start, f)),
            (Some((start, f)), Some(g)) if f == g => {
                ranges.push(start..range.end);
                open = None;
            }
            _ => {}
        }
    }

    if let Some((start, _)) = open {
        ranges.push(start..text.len());
    }
    ranges
}

/// Byte ranges of inline code spans (`` `code` ``) outside fenced blocks.
pub fn inline_code_ranges(text: &str, fenced: &[Range<usize>]) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(r) = fenced.iter().find(|r| r.contains(&i)) {
            i = r.end;
            continue;
        }
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let ticks = bytes[i..].iter().take_while(|b| **b == b'`').count();
        let marker = &text[i..i + ticks];
        match text[i + ticks..].find(marker) {
            Some(rel) => {
                let end = i + ticks + rel + ticks;
                ranges.push(i..end);
                i = end;
            }
            None => i += ticks,
        }
    }
    ranges
}

/// End of the sentence starting at `start`: after the first `.`, `!` or
/// `?` followed by whitespace, at a blank line, or at the end of the text.
pub fn sentence_end(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'.' | b'!' | b'?' => {
                if i + 1 == bytes.len() || bytes[i + 1].is_ascii_whitespace() {
                    return i + 1;
                }
            }
            b'\n' if bytes.get(i + 1) == Some(&b'\n') => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// The last sentence of a text, trimmed.
pub fn last_sentence(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut start = 0;
    let mut pos = 0;
    while pos < trimmed.len() {
        let end = sentence_end(trimmed, pos);
        if end >= trimmed.len() {
            break;
        }
        start = end;
        pos = end + 1;
    }

    let sentence = normalize_whitespace(&trimmed[start..]);
    if sentence.is_empty() {
        None
    } else {
        Some(sentence)
    }
}

/// Whether `pos` lies inside any of the ranges.
pub fn in_ranges(ranges: &[Range<usize>], pos: usize) -> bool {
    ranges.iter().any(|r| r.contains(&pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
        // "e" + combining acute composes to a single char
        assert_eq!(normalize_whitespace("Cafe\u{301}"), "Caf\u{e9}");
    }

    #[test]
    fn test_fold_ascii_letters() {
        assert_eq!(fold_ascii_letters("Müller"), "Muller");
        assert_eq!(fold_ascii_letters("García-López"), "GarciaLopez");
        assert_eq!(fold_ascii_letters("O'Brien"), "OBrien");
    }

    #[test]
    fn test_parse_heading() {
        assert_eq!(parse_heading("# Title"), Some((1, "Title")));
        assert_eq!(parse_heading("### Methods ###"), Some((3, "Methods")));
        assert_eq!(parse_heading("#hashtag"), None);
        assert_eq!(parse_heading("####### deep"), None);
        assert_eq!(parse_heading("#"), None);
    }

    #[test]
    fn test_lines_with_ranges() {
        let text = "ab\ncd\r\nef";
        let lines: Vec<_> = lines_with_ranges(text).collect();
        assert_eq!(lines[0], (0..3, "ab"));
        assert_eq!(lines[1], (3..7, "cd"));
        assert_eq!(lines[2], (7..9, "ef"));
    }

    #[test]
    fn test_code_ranges() {
        let text = "a `x$y` b\n```\n$z$\n```\nc";
        let fenced = fenced_code_ranges(text);
        assert_eq!(fenced.len(), 1);
        assert_eq!(&text[fenced[0].clone()], "```\n$z$\n```\n");

        let inline = inline_code_ranges(text, &fenced);
        assert_eq!(inline.len(), 1);
        assert_eq!(&text[inline[0].clone()], "`x$y`");
    }

    #[test]
    fn test_last_sentence() {
        assert_eq!(
            last_sentence("Load data. Plot the response"),
            Some("Plot the response".to_string())
        );
        assert_eq!(
            last_sentence("Only one sentence."),
            Some("Only one sentence.".to_string())
        );
        assert_eq!(last_sentence("   "), None);
    }

    #[test]
    fn test_sentence_end() {
        let text = "Physically, this is 1.5 times larger. Next.";
        assert_eq!(&text[..sentence_end(text, 0)], "Physically, this is 1.5 times larger.");
    }
}
