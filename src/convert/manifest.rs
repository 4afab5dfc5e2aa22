//! Conversion manifest.

use crate::error::{Error, Result, Warning, WarningKind};
use crate::model::DocumentModel;
use crate::render::TemplateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content counts of a converted paper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCounts {
    /// Sections, the preamble included
    pub sections: usize,

    /// Equations, display and inline
    pub equations: usize,

    /// Display equations
    pub display_equations: usize,

    /// Figures written and referenced
    pub figures: usize,

    /// Bibliography entries
    pub citations: usize,
}

impl ManifestCounts {
    /// Count the content of a document.
    pub fn of(doc: &DocumentModel) -> Self {
        Self {
            sections: doc.sections.len(),
            equations: doc.equations.len(),
            display_equations: doc.display_equation_count(),
            figures: doc.figures.len(),
            citations: doc.citations.len(),
        }
    }
}

/// Structured result of one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// When the conversion finished
    pub generated_at: DateTime<Utc>,

    /// Paper title
    pub title: String,

    /// Authors in byline order
    pub authors: Vec<String>,

    /// Institution
    pub institution: Option<String>,

    /// Keywords
    pub keywords: Vec<String>,

    /// Template used for rendering
    pub template: TemplateId,

    /// Content counts
    pub counts: ManifestCounts,

    /// Recoverable problems, in pipeline order
    pub warnings: Vec<Warning>,

    /// False when any figure was omitted
    pub complete: bool,

    /// Output directory
    pub output_dir: PathBuf,

    /// Path of `main.tex`
    pub main_tex: PathBuf,

    /// Path of the BibTeX file
    pub bibliography: PathBuf,

    /// Paths of the written figure files, in figure order
    pub figure_files: Vec<PathBuf>,
}

impl Manifest {
    /// Whether any warning was recorded.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind() == kind)
    }

    /// Serialize the manifest as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaperMetadata;

    fn manifest() -> Manifest {
        Manifest {
            generated_at: Utc::now(),
            title: "T".into(),
            authors: vec!["A".into()],
            institution: None,
            keywords: Vec::new(),
            template: TemplateId::Baseline,
            counts: ManifestCounts::default(),
            warnings: vec![Warning::MissingCaption {
                cell_index: 2,
                placeholder: "Figure 1".into(),
            }],
            complete: true,
            output_dir: PathBuf::from("out"),
            main_tex: PathBuf::from("out/main.tex"),
            bibliography: PathBuf::from("out/references.bib"),
            figure_files: vec![PathBuf::from("out/figures/fig-2-0.png")],
        }
    }

    #[test]
    fn test_warning_filter() {
        let m = manifest();
        assert!(m.has_warnings());
        assert_eq!(m.warnings_of(WarningKind::MissingCaption).count(), 1);
        assert_eq!(m.warnings_of(WarningKind::UnrecognizedTemplate).count(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let m = manifest();
        let json = m.to_json().unwrap();
        assert!(json.contains("\"kind\": \"missing_caption\""));
        assert!(json.contains("\"template\": \"baseline\""));
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_counts_of_empty_document() {
        let doc = DocumentModel::new(PaperMetadata::new("T", vec!["A".into()]));
        assert_eq!(ManifestCounts::of(&doc), ManifestCounts::default());
    }
}
