//! Document-level types.

use super::{CitationEntry, Equation, Figure, PaperMetadata};
use serde::{Deserialize, Serialize};

/// The structured paper assembled from a notebook.
///
/// This is the only input of the template engine; it holds no reference
/// back to notebook cells. Body items point into `equations` and `figures`
/// by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentModel {
    /// Title block information
    pub metadata: PaperMetadata,

    /// Sections in notebook order
    pub sections: Vec<Section>,

    /// All equations in source order (display and inline)
    pub equations: Vec<Equation>,

    /// All emitted figures in source order
    pub figures: Vec<Figure>,

    /// Reference list in source order
    pub citations: Vec<CitationEntry>,
}

impl DocumentModel {
    /// Create an empty document for the given metadata.
    pub fn new(metadata: PaperMetadata) -> Self {
        Self {
            metadata,
            sections: Vec::new(),
            equations: Vec::new(),
            figures: Vec::new(),
            citations: Vec::new(),
        }
    }

    /// Get an equation by index.
    pub fn equation(&self, index: usize) -> Option<&Equation> {
        self.equations.get(index)
    }

    /// Get a figure by index.
    pub fn figure(&self, index: usize) -> Option<&Figure> {
        self.figures.get(index)
    }

    /// The first abstract section, if any.
    pub fn abstract_section(&self) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.kind == SectionKind::Abstract)
    }

    /// Sections rendered as numbered body text (everything except the
    /// abstract and the reference list).
    pub fn body_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|s| !matches!(s.kind, SectionKind::Abstract | SectionKind::References))
    }

    /// Number of display equations.
    pub fn display_equation_count(&self) -> usize {
        self.equations.iter().filter(|e| e.is_display()).count()
    }

    /// Whether any figure was written as SVG.
    pub fn has_svg_figures(&self) -> bool {
        self.figures
            .iter()
            .any(|f| f.written_as == super::ImageMime::Svg)
    }

    /// Plain text of all narrative spans.
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .flat_map(|s| s.body.iter())
            .filter_map(|item| match item {
                BodyItem::Text(span) => Some(span.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Recognized section roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Content before the first heading
    Preamble,
    Abstract,
    Introduction,
    Background,
    RelatedWork,
    Methods,
    Results,
    Discussion,
    Conclusion,
    Acknowledgements,
    Appendix,
    References,
    /// Any other heading, kept verbatim
    Custom,
}

impl SectionKind {
    /// Classify a heading text. Leading numbering ("2.", "3.1") and
    /// emphasis markers are ignored.
    pub fn from_heading(heading: &str) -> Self {
        let cleaned: String = heading
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
            .trim()
            .trim_matches(|c: char| c == '*' || c == '_' || c == ':')
            .trim()
            .to_lowercase();

        match cleaned.as_str() {
            "abstract" | "summary" => SectionKind::Abstract,
            "introduction" => SectionKind::Introduction,
            "background" | "theory" | "theoretical background" => SectionKind::Background,
            "related work" | "prior work" | "literature review" => SectionKind::RelatedWork,
            "method" | "methods" | "methodology" | "materials and methods" => {
                SectionKind::Methods
            }
            "result" | "results" | "experiments" | "experimental results" => {
                SectionKind::Results
            }
            "discussion" | "results and discussion" => SectionKind::Discussion,
            "conclusion" | "conclusions" | "summary and conclusions" => SectionKind::Conclusion,
            "acknowledgement" | "acknowledgements" | "acknowledgment" | "acknowledgments" => {
                SectionKind::Acknowledgements
            }
            "appendix" | "appendices" => SectionKind::Appendix,
            "references" | "bibliography" | "literature" => SectionKind::References,
            _ => SectionKind::Custom,
        }
    }

    /// Whether the heading is a recognized paper section.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, SectionKind::Custom | SectionKind::Preamble)
    }
}

/// A section of the paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text as written (empty for the preamble)
    pub heading: String,

    /// Section role
    pub kind: SectionKind,

    /// Nesting depth (0 = top level)
    pub depth: u8,

    /// Interleaved content in source order
    pub body: Vec<BodyItem>,
}

impl Section {
    /// Create a section from a heading.
    pub fn new(heading: impl Into<String>, depth: u8) -> Self {
        let heading = heading.into();
        let kind = SectionKind::from_heading(&heading);
        Self {
            heading,
            kind,
            depth,
            body: Vec::new(),
        }
    }

    /// The implicit section holding content before the first heading.
    pub fn preamble() -> Self {
        Self {
            heading: String::new(),
            kind: SectionKind::Preamble,
            depth: 0,
            body: Vec::new(),
        }
    }

    /// Append a body item.
    pub fn push(&mut self, item: BodyItem) {
        self.body.push(item);
    }

    /// Check if the section has no body.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Content inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyItem {
    /// Narrative markdown text (inline math stays inside)
    Text(TextSpan),
    /// Display equation, index into [`DocumentModel::equations`]
    Equation { index: usize },
    /// Figure, index into [`DocumentModel::figures`]
    Figure { index: usize },
    /// Code listing (only when code is included)
    Code(CodeListing),
}

/// A run of narrative text from one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Originating cell
    pub cell_index: usize,

    /// Markdown text
    pub text: String,
}

/// Source code of a code cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeListing {
    /// Originating cell
    pub cell_index: usize,

    /// Code text
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_kind_from_heading() {
        assert_eq!(SectionKind::from_heading("Abstract"), SectionKind::Abstract);
        assert_eq!(
            SectionKind::from_heading("1. Introduction"),
            SectionKind::Introduction
        );
        assert_eq!(
            SectionKind::from_heading("**Materials and Methods**"),
            SectionKind::Methods
        );
        assert_eq!(
            SectionKind::from_heading("References"),
            SectionKind::References
        );
        assert_eq!(
            SectionKind::from_heading("Room Acoustics Model"),
            SectionKind::Custom
        );
    }

    #[test]
    fn test_body_sections_skip_abstract_and_references() {
        let mut doc = DocumentModel::new(PaperMetadata::new("T", vec!["A".into()]));
        doc.sections.push(Section::new("Abstract", 0));
        doc.sections.push(Section::new("Introduction", 0));
        doc.sections.push(Section::new("References", 0));

        let kinds: Vec<_> = doc.body_sections().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SectionKind::Introduction]);
        assert!(doc.abstract_section().is_some());
    }

    #[test]
    fn test_plain_text() {
        let mut doc = DocumentModel::new(PaperMetadata::new("T", vec!["A".into()]));
        let mut section = Section::new("Introduction", 0);
        section.push(BodyItem::Text(TextSpan {
            cell_index: 1,
            text: "Hello".into(),
        }));
        section.push(BodyItem::Equation { index: 0 });
        section.push(BodyItem::Text(TextSpan {
            cell_index: 1,
            text: "World".into(),
        }));
        doc.sections.push(section);
        assert_eq!(doc.plain_text(), "Hello\n\nWorld");
    }
}
