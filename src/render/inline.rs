//! Markdown text to LaTeX.
//!
//! Handles the subset authors use in notebook prose: paragraphs, bullet and
//! numbered lists, fenced code, inline code, bold, italics, links and `[n]`
//! citation markers. Math spans are copied verbatim; everything else is
//! escaped.

use crate::extract::find_math_spans;
use crate::model::CitationEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static INLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?P<attachment>!\[[^\]]*\]\(attachment:[^)]*\))",
        r"|!\[(?P<alt>[^\]]*)\]\((?P<src>[^)\s]+)\)",
        r"|`(?P<code>[^`]+)`",
        r"|\\(?P<cmd>(?:cite[pt]?|ref|eqref|autoref|label)\{[^}]*\})",
        r"|\*\*(?P<bold>[^*]+?)\*\*",
        r"|__(?P<bold2>[^_]+?)__",
        r"|\*(?P<emph>[^*\s](?:[^*]*[^*\s])?)\*",
        r"|\[(?P<text>[^\]]+)\]\((?P<url>[^)\s]+)\)",
        r"|\[(?P<label>\w+)\]",
    ))
    .unwrap()
});

static LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}(?:(?P<bullet>[-*+])|(?P<number>\d+)[.)])\s+(?P<rest>.*)$").unwrap());

/// Maps reference labels (`[1]`) to bibliography keys.
#[derive(Debug, Clone, Default)]
pub struct CiteLabels {
    keys: HashMap<String, String>,
}

impl CiteLabels {
    /// Collect the labels of a reference list. The first entry with a label
    /// wins.
    pub fn from_citations(citations: &[CitationEntry]) -> Self {
        let mut keys = HashMap::new();
        for citation in citations {
            if let Some(label) = &citation.label {
                keys.entry(label.clone())
                    .or_insert_with(|| citation.key.clone());
            }
        }
        Self { keys }
    }

    /// Key for a label.
    pub fn key(&self, label: &str) -> Option<&str> {
        self.keys.get(label).map(String::as_str)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Itemize,
    Enumerate,
}

impl ListKind {
    fn environment(&self) -> &'static str {
        match self {
            ListKind::Itemize => "itemize",
            ListKind::Enumerate => "enumerate",
        }
    }
}

#[derive(Default)]
struct Blocks<'a> {
    out: Vec<String>,
    paragraph: Vec<&'a str>,
    list: Option<(ListKind, Vec<String>)>,
}

impl<'a> Blocks<'a> {
    fn flush_paragraph(&mut self, cites: &CiteLabels) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join("\n");
        self.paragraph.clear();
        let latex = inline_to_latex(text.trim(), cites);
        if !latex.is_empty() {
            self.out.push(latex);
        }
    }

    fn flush_list(&mut self, cites: &CiteLabels) {
        if let Some((kind, items)) = self.list.take() {
            let env = kind.environment();
            let mut block = format!("\\begin{{{}}}\n", env);
            for item in items {
                block.push_str("  \\item ");
                block.push_str(&inline_to_latex(item.trim(), cites));
                block.push('\n');
            }
            block.push_str(&format!("\\end{{{}}}", env));
            self.out.push(block);
        }
    }

    fn flush(&mut self, cites: &CiteLabels) {
        self.flush_paragraph(cites);
        self.flush_list(cites);
    }
}

/// Convert a block of markdown text to LaTeX.
pub fn markdown_to_latex(text: &str, cites: &CiteLabels) -> String {
    let mut blocks = Blocks::default();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            blocks.flush(cites);
            let fence = &trimmed[..3];
            let mut code = Vec::new();
            for inner in lines.by_ref() {
                if inner.trim_start().starts_with(fence) {
                    break;
                }
                code.push(inner);
            }
            blocks.out.push(format!(
                "\\begin{{verbatim}}\n{}\n\\end{{verbatim}}",
                code.join("\n")
            ));
            continue;
        }

        if trimmed.is_empty() {
            blocks.flush(cites);
            continue;
        }

        if let Some(caps) = LIST_ITEM_RE.captures(line) {
            blocks.flush_paragraph(cites);
            let kind = if caps.name("bullet").is_some() {
                ListKind::Itemize
            } else {
                ListKind::Enumerate
            };
            if blocks.list.as_ref().map(|(k, _)| *k) != Some(kind) {
                blocks.flush_list(cites);
                blocks.list = Some((kind, Vec::new()));
            }
            if let Some((_, items)) = blocks.list.as_mut() {
                items.push(caps["rest"].to_string());
            }
            continue;
        }

        if let Some((_, items)) = blocks.list.as_mut() {
            if line.starts_with(|c: char| c == ' ' || c == '\t') {
                if let Some(last) = items.last_mut() {
                    last.push(' ');
                    last.push_str(trimmed);
                    continue;
                }
            }
        }
        blocks.flush_list(cites);
        blocks.paragraph.push(line.strip_prefix("> ").unwrap_or(line));
    }

    blocks.flush(cites);
    blocks.out.join("\n\n")
}

/// Convert inline markdown to LaTeX, keeping math spans verbatim.
pub fn inline_to_latex(text: &str, cites: &CiteLabels) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut cursor = 0;
    for span in find_math_spans(text) {
        out.push_str(&convert_plain(&text[cursor..span.range.start], cites));
        out.push_str(&text[span.range.clone()]);
        cursor = span.range.end;
    }
    out.push_str(&convert_plain(&text[cursor..], cites));
    out
}

fn convert_plain(text: &str, cites: &CiteLabels) -> String {
    let mut out = String::new();
    let mut cursor = 0;

    for caps in INLINE_RE.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        out.push_str(&escape_text(&text[cursor..whole.start()]));
        cursor = whole.end();

        if caps.name("attachment").is_some() {
            // Attached images are emitted as figures.
        } else if let Some(src) = caps.name("src") {
            let alt = caps.name("alt").map_or("", |m| m.as_str()).trim();
            if alt.is_empty() {
                out.push_str(&format!("\\url{{{}}}", escape_url(src.as_str())));
            } else {
                out.push_str(&format!(
                    "\\href{{{}}}{{{}}}",
                    escape_url(src.as_str()),
                    convert_plain(alt, cites)
                ));
            }
        } else if let Some(code) = caps.name("code") {
            out.push_str(&format!("\\texttt{{{}}}", escape_text(code.as_str())));
        } else if let Some(cmd) = caps.name("cmd") {
            out.push('\\');
            out.push_str(cmd.as_str());
        } else if let Some(bold) = caps.name("bold").or_else(|| caps.name("bold2")) {
            out.push_str(&format!("\\textbf{{{}}}", convert_plain(bold.as_str(), cites)));
        } else if let Some(emph) = caps.name("emph") {
            out.push_str(&format!("\\emph{{{}}}", convert_plain(emph.as_str(), cites)));
        } else if let (Some(label), Some(url)) = (caps.name("text"), caps.name("url")) {
            out.push_str(&format!(
                "\\href{{{}}}{{{}}}",
                escape_url(url.as_str()),
                convert_plain(label.as_str(), cites)
            ));
        } else if let Some(label) = caps.name("label") {
            match cites.key(label.as_str()) {
                Some(key) => out.push_str(&format!("\\cite{{{}}}", key)),
                None => out.push_str(&escape_text(whole.as_str())),
            }
        }
    }

    out.push_str(&escape_text(&text[cursor..]));
    out
}

/// Whether a text renders to at least one hyperlink.
pub fn has_link(text: &str) -> bool {
    let mut cursor = 0;
    for span in find_math_spans(text) {
        if plain_has_link(&text[cursor..span.range.start]) {
            return true;
        }
        cursor = span.range.end;
    }
    plain_has_link(&text[cursor..])
}

fn plain_has_link(text: &str) -> bool {
    INLINE_RE.captures_iter(text).any(|caps| {
        if caps.name("url").is_some() || caps.name("src").is_some() {
            return true;
        }
        caps.name("bold")
            .or_else(|| caps.name("bold2"))
            .or_else(|| caps.name("emph"))
            .map_or(false, |inner| plain_has_link(inner.as_str()))
    })
}

/// Escape LaTeX special characters. Markdown backslash escapes (`\$`,
/// `\*`) are resolved first.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let c = match (c, chars.peek()) {
            ('\\', Some(next)) if next.is_ascii_punctuation() => {
                let next = *next;
                chars.next();
                next
            }
            _ => c,
        };
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' | '}' | '$' | '&' | '#' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '<' => out.push_str("\\textless{}"),
            '>' => out.push_str("\\textgreater{}"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_url(url: &str) -> String {
    url.replace('\\', "/")
        .replace('%', "\\%")
        .replace('#', "\\#")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cites() -> CiteLabels {
        CiteLabels::from_citations(&[CitationEntry {
            raw: "[1] Smith, J. (2020).".into(),
            text: "Smith, J. (2020).".into(),
            key: "Smith2020".into(),
            label: Some("1".into()),
            cell_index: 4,
        }])
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("50% of A&B_c #1"), "50\\% of A\\&B\\_c \\#1");
        assert_eq!(escape_text("costs \\$5"), "costs \\$5");
        assert_eq!(escape_text("a\\b ~ ^"), "a\\textbackslash{}b \\textasciitilde{} \\textasciicircum{}");
    }

    #[test]
    fn test_math_passes_through() {
        let latex = inline_to_latex("Energy $E_k = \\frac{1}{2}mv^2$ in 100% of cases", &cites());
        assert_eq!(latex, "Energy $E_k = \\frac{1}{2}mv^2$ in 100\\% of cases");
    }

    #[test]
    fn test_inline_markup() {
        let latex = inline_to_latex(
            "**Bold** and *italic* with `x_1`, see [docs](https://a.org/x#y) and [1], not [2].",
            &cites(),
        );
        assert_eq!(
            latex,
            "\\textbf{Bold} and \\emph{italic} with \\texttt{x\\_1}, see \\href{https://a.org/x\\#y}{docs} and \\cite{Smith2020}, not [2]."
        );
    }

    #[test]
    fn test_latex_refs_kept() {
        let latex = inline_to_latex("As in \\ref{fig:2-0} and \\cite{Doe2019}.", &cites());
        assert_eq!(latex, "As in \\ref{fig:2-0} and \\cite{Doe2019}.");
    }

    #[test]
    fn test_lists_and_paragraphs() {
        let text = "First paragraph\ncontinues.\n\n- one\n- two\n  wrapped\n1. first\n\nLast.";
        let latex = markdown_to_latex(text, &CiteLabels::default());
        assert_eq!(
            latex,
            "First paragraph\ncontinues.\n\n\\begin{itemize}\n  \\item one\n  \\item two wrapped\n\\end{itemize}\n\n\\begin{enumerate}\n  \\item first\n\\end{enumerate}\n\nLast."
        );
    }

    #[test]
    fn test_fenced_code_is_verbatim() {
        let text = "Run:\n```python\nx = {'a': 1}  # 50%\n```";
        let latex = markdown_to_latex(text, &CiteLabels::default());
        assert_eq!(
            latex,
            "Run:\n\n\\begin{verbatim}\nx = {'a': 1}  # 50%\n\\end{verbatim}"
        );
    }

    #[test]
    fn test_attachment_image_removed() {
        let latex = inline_to_latex("Setup: ![The rig](attachment:rig.png)", &CiteLabels::default());
        assert_eq!(latex, "Setup: ");
        assert!(!has_link("Setup: ![The rig](attachment:rig.png)"));
    }

    #[test]
    fn test_external_image_kept_as_link() {
        let cites = CiteLabels::default();
        assert_eq!(
            inline_to_latex("Rig: ![The rig](images/rig.png)", &cites),
            "Rig: \\href{images/rig.png}{The rig}"
        );
        assert_eq!(
            inline_to_latex("![](https://a.org/p.png)", &cites),
            "\\url{https://a.org/p.png}"
        );
    }

    #[test]
    fn test_has_link() {
        assert!(has_link("see [docs](https://a.org)"));
        assert!(has_link("**see [docs](https://a.org)**"));
        assert!(!has_link("see [1] and `[x](y)`"));
        assert!(!has_link("no links here"));
    }
}
