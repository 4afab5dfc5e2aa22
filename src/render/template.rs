//! Template registry.
//!
//! Each [`TemplateId`] maps to one immutable [`Template`] record. Lookup by
//! name is case-insensitive, treats `_`, `-` and spaces alike, and accepts a
//! few legacy aliases. Unknown names resolve to the baseline template and
//! produce a [`Warning::UnrecognizedTemplate`].

use crate::error::Warning;
use serde::{Deserialize, Serialize};

/// Recognized templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateId {
    /// Single-column article
    #[default]
    Baseline,
    /// Two-column article
    TwoColumn,
    /// IEEE conference paper (`IEEEtran`)
    IeeeStyle,
    /// Two-column journal layout with interpretation boxes
    DomainJournal,
    /// Report class with chapters and a title page
    Thesis,
}

impl TemplateId {
    /// All templates in registry order.
    pub const ALL: [TemplateId; 5] = [
        TemplateId::Baseline,
        TemplateId::TwoColumn,
        TemplateId::IeeeStyle,
        TemplateId::DomainJournal,
        TemplateId::Thesis,
    ];

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            TemplateId::Baseline => "baseline",
            TemplateId::TwoColumn => "two-column",
            TemplateId::IeeeStyle => "ieee-style",
            TemplateId::DomainJournal => "domain-journal",
            TemplateId::Thesis => "thesis",
        }
    }

    /// Look up a template by name or alias.
    pub fn lookup(name: &str) -> Option<Self> {
        let key: String = name
            .trim()
            .trim_matches(|c: char| c == '`' || c == '"' || c == '\'')
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        match key.as_str() {
            "baseline" | "article" | "default" => Some(TemplateId::Baseline),
            "two-column" | "twocolumn" => Some(TemplateId::TwoColumn),
            "ieee-style" | "ieee" | "ieeetran" => Some(TemplateId::IeeeStyle),
            "domain-journal" | "acta-acustica" | "journal" => Some(TemplateId::DomainJournal),
            "thesis" | "report" => Some(TemplateId::Thesis),
            _ => None,
        }
    }

    /// The template record.
    pub fn template(&self) -> &'static Template {
        match self {
            TemplateId::Baseline => &BASELINE,
            TemplateId::TwoColumn => &TWO_COLUMN,
            TemplateId::IeeeStyle => &IEEE_STYLE,
            TemplateId::DomainJournal => &DOMAIN_JOURNAL,
            TemplateId::Thesis => &THESIS,
        }
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolve a template name, falling back to baseline.
pub fn resolve_template(name: &str) -> (TemplateId, Option<Warning>) {
    match TemplateId::lookup(name) {
        Some(id) => (id, None),
        None => {
            let fallback = TemplateId::default();
            log::warn!(
                "Unrecognized template '{}', using '{}'",
                name,
                fallback.name()
            );
            (
                fallback,
                Some(Warning::UnrecognizedTemplate {
                    requested: name.to_string(),
                    fallback: fallback.name().to_string(),
                }),
            )
        }
    }
}

/// How equation interpretations are typeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretationStyle {
    /// A `quote` block with an italic label
    Quote,
    /// The template's own `interpretation` environment
    Environment,
}

/// How the title block is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleBlock {
    /// `\title`, `\author`, `\maketitle`
    Standard,
    /// `\IEEEauthorblockN` / `\IEEEauthorblockA`, keywords in `IEEEkeywords`
    Ieee,
    /// Title page with institution and a table of contents
    Thesis,
}

/// Immutable rendering rules of one template.
#[derive(Debug)]
pub struct Template {
    /// Template identifier
    pub id: TemplateId,

    /// LaTeX document class
    pub document_class: &'static str,

    /// Document class options
    pub class_options: &'static [&'static str],

    /// Packages as `(name, options)`, in load order
    pub packages: &'static [(&'static str, &'static str)],

    /// Preamble lines after the packages
    pub preamble: &'static [&'static str],

    /// Sectioning commands by depth
    pub headings: [&'static str; 3],

    /// Width given to `\includegraphics`
    pub figure_width: &'static str,

    /// Float placement
    pub figure_placement: &'static str,

    /// Interpretation rendering
    pub interpretation: InterpretationStyle,

    /// Title block layout
    pub title_block: TitleBlock,

    /// BibTeX style
    pub bibliography_style: &'static str,
}

impl Template {
    /// Sectioning command for a depth (deeper levels clamp).
    pub fn heading_command(&self, depth: u8) -> &'static str {
        self.headings[usize::from(depth).min(self.headings.len() - 1)]
    }
}

static BASELINE: Template = Template {
    id: TemplateId::Baseline,
    document_class: "article",
    class_options: &["11pt", "a4paper"],
    packages: &[
        ("inputenc", "utf8"),
        ("fontenc", "T1"),
        ("amsmath", ""),
        ("amssymb", ""),
        ("graphicx", ""),
        ("geometry", "margin=1in"),
        ("cite", ""),
        ("hyperref", ""),
    ],
    preamble: &[],
    headings: ["section", "subsection", "subsubsection"],
    figure_width: "0.8\\linewidth",
    figure_placement: "htbp",
    interpretation: InterpretationStyle::Quote,
    title_block: TitleBlock::Standard,
    bibliography_style: "plain",
};

static TWO_COLUMN: Template = Template {
    id: TemplateId::TwoColumn,
    document_class: "article",
    class_options: &["10pt", "twocolumn", "a4paper"],
    packages: &[
        ("inputenc", "utf8"),
        ("fontenc", "T1"),
        ("amsmath", ""),
        ("amssymb", ""),
        ("graphicx", ""),
        ("geometry", "margin=0.75in"),
        ("cite", ""),
        ("hyperref", ""),
    ],
    preamble: &[],
    headings: ["section", "subsection", "subsubsection"],
    figure_width: "\\columnwidth",
    figure_placement: "htbp",
    interpretation: InterpretationStyle::Quote,
    title_block: TitleBlock::Standard,
    bibliography_style: "plain",
};

static IEEE_STYLE: Template = Template {
    id: TemplateId::IeeeStyle,
    document_class: "IEEEtran",
    class_options: &["conference"],
    packages: &[
        ("inputenc", "utf8"),
        ("fontenc", "T1"),
        ("amsmath", ""),
        ("amssymb", ""),
        ("graphicx", ""),
        ("cite", ""),
    ],
    preamble: &[],
    headings: ["section", "subsection", "subsubsection"],
    figure_width: "\\columnwidth",
    figure_placement: "!t",
    interpretation: InterpretationStyle::Quote,
    title_block: TitleBlock::Ieee,
    bibliography_style: "IEEEtran",
};

static DOMAIN_JOURNAL: Template = Template {
    id: TemplateId::DomainJournal,
    document_class: "article",
    class_options: &["10pt", "twocolumn", "a4paper"],
    packages: &[
        ("inputenc", "utf8"),
        ("fontenc", "T1"),
        ("amsmath", ""),
        ("amssymb", ""),
        ("graphicx", ""),
        ("geometry", "margin=0.75in"),
        ("tikz", ""),
        ("siunitx", ""),
        ("booktabs", ""),
        ("cite", ""),
        ("hyperref", ""),
    ],
    preamble: &[
        "\\usetikzlibrary{positioning,shapes,arrows}",
        "\\newenvironment{interpretation}[1]{\\begin{quote}\\small\\textbf{#1 interpretation:}}{\\end{quote}}",
    ],
    headings: ["section", "subsection", "subsubsection"],
    figure_width: "\\columnwidth",
    figure_placement: "htbp",
    interpretation: InterpretationStyle::Environment,
    title_block: TitleBlock::Standard,
    bibliography_style: "unsrt",
};

static THESIS: Template = Template {
    id: TemplateId::Thesis,
    document_class: "report",
    class_options: &["12pt", "a4paper"],
    packages: &[
        ("inputenc", "utf8"),
        ("fontenc", "T1"),
        ("amsmath", ""),
        ("amssymb", ""),
        ("graphicx", ""),
        ("geometry", "margin=1.25in"),
        ("tikz", ""),
        ("fancyhdr", ""),
        ("setspace", ""),
        ("cite", ""),
        ("hyperref", ""),
    ],
    preamble: &["\\pagestyle{fancy}", "\\doublespacing"],
    headings: ["chapter", "section", "subsection"],
    figure_width: "0.8\\linewidth",
    figure_placement: "htbp",
    interpretation: InterpretationStyle::Quote,
    title_block: TitleBlock::Thesis,
    bibliography_style: "plain",
};
