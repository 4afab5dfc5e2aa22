//! Notebook to paper conversion.
//!
//! [`convert`] drives the whole pipeline: load, classify, extract, build,
//! render, write. Every fatal error (unreadable notebook, missing title or
//! authors, invalid options) is raised before anything is written to the
//! output directory.
//!
//! # Example
//!
//! ```no_run
//! use nbpaper::convert::{convert, ConvertOptions};
//!
//! fn main() -> nbpaper::Result<()> {
//!     let options = ConvertOptions::new().with_template("ieee-style");
//!     let manifest = convert("paper.ipynb", "out", &options)?;
//!     println!("{} figure(s), complete: {}", manifest.counts.figures, manifest.complete);
//!     Ok(())
//! }
//! ```

mod manifest;
mod options;

pub use manifest::{Manifest, ManifestCounts};
pub use options::ConvertOptions;

use crate::builder::{BuildOutput, DocumentBuilder};
use crate::classify::{classify, Classification};
use crate::error::{Result, Warning};
use crate::extract::{
    extract_citations, extract_equations, extract_figures, extract_metadata, number_figures,
    write_figures, CitationExtraction, FigureExtraction, MetadataExtraction, WrittenFigures,
};
use crate::model::{DocumentModel, Equation, Figure, Notebook};
use crate::parser::NotebookParser;
use crate::render::render_with_options;
use chrono::Utc;
use std::fs;
use std::path::Path;

/// File name of the rendered paper.
pub const MAIN_TEX: &str = "main.tex";

/// Everything extracted from a notebook before figures are decoded.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Cell labels
    pub classification: Classification,

    /// Paper metadata and the title-block ranges
    pub metadata: MetadataExtraction,

    /// Equations in source order
    pub equations: Vec<Equation>,

    /// Reference list
    pub citations: CitationExtraction,
}

impl Analysis {
    /// Warnings of the analysis steps, in pipeline order.
    pub fn warnings(&self) -> Vec<Warning> {
        let mut warnings = self.metadata.warnings.clone();
        warnings.extend(self.citations.warnings.iter().cloned());
        warnings
    }
}

/// Classify a notebook and run the text extractors.
///
/// Fails with [`Error::MissingMetadata`](crate::Error::MissingMetadata) when
/// the notebook has no title or no author.
pub fn analyze(notebook: &Notebook) -> Result<Analysis> {
    let classification = classify(&notebook.cells);
    let metadata = extract_metadata(&notebook.cells, &classification)?;
    let equations = extract_equations(&notebook.cells, &classification);
    let citations = extract_citations(&notebook.cells);

    Ok(Analysis {
        classification,
        metadata,
        equations,
        citations,
    })
}

/// Build the document model of a notebook without writing anything.
///
/// Figures are decoded in memory so that the model lists exactly the
/// figures a conversion would write.
pub fn build_document(
    notebook: &Notebook,
    options: &ConvertOptions,
) -> Result<(DocumentModel, Vec<Warning>)> {
    options.validate()?;
    let analysis = analyze(notebook)?;
    let extraction = figures_of(notebook, &analysis, options);

    let mut warnings = analysis.warnings();
    warnings.extend(extraction.warnings.iter().cloned());
    let mut figures: Vec<Figure> = extraction.figures.into_iter().map(|f| f.figure).collect();
    warnings.extend(number_figures(&mut figures));

    let built = assemble(notebook, analysis, figures, options);
    warnings.extend(built.warnings);
    Ok((built.document, warnings))
}

/// Convert a notebook file into a paper in `output_dir`.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    notebook_path: P,
    output_dir: Q,
    options: &ConvertOptions,
) -> Result<Manifest> {
    options.validate()?;
    let notebook =
        NotebookParser::open_with_options(notebook_path.as_ref(), options.parse.clone())?
            .parse()?;
    convert_notebook(&notebook, output_dir.as_ref(), options)
}

/// Convert an already loaded notebook.
pub fn convert_notebook(
    notebook: &Notebook,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<Manifest> {
    options.validate()?;
    let analysis = analyze(notebook)?;
    let extraction = figures_of(notebook, &analysis, options);
    let mut warnings = analysis.warnings();

    fs::create_dir_all(output_dir)?;
    let mut written = if options.save_figures {
        write_figures(extraction, output_dir)?
    } else {
        WrittenFigures::default()
    };
    warnings.append(&mut written.warnings);
    warnings.extend(number_figures(&mut written.figures));

    let built = assemble(notebook, analysis, written.figures, options);
    warnings.extend(built.warnings);
    let document = built.document;

    let render_options = options.effective_render_options();
    let output = render_with_options(&document, &render_options);
    if let Some(fallback) = output.fallback {
        warnings.push(fallback);
    }

    let main_tex = output_dir.join(MAIN_TEX);
    let bibliography = output_dir.join(render_options.bibliography_file());
    fs::write(&main_tex, &output.markup)?;
    fs::write(&bibliography, &output.bibliography)?;

    let meta = &document.metadata;
    let manifest = Manifest {
        generated_at: Utc::now(),
        title: meta.title.clone(),
        authors: meta.authors.clone(),
        institution: meta.institution.clone(),
        keywords: meta.keywords.clone(),
        template: output.template,
        counts: ManifestCounts::of(&document),
        warnings,
        complete: written.failed == 0,
        output_dir: output_dir.to_path_buf(),
        main_tex,
        bibliography,
        figure_files: written.paths,
    };

    log::info!(
        "Converted '{}' with template {}: {} figure(s), {} citation(s), {} warning(s)",
        manifest.title,
        manifest.template,
        manifest.counts.figures,
        manifest.counts.citations,
        manifest.warnings.len()
    );
    Ok(manifest)
}

fn figures_of(notebook: &Notebook, analysis: &Analysis, options: &ConvertOptions) -> FigureExtraction {
    if options.save_figures {
        extract_figures(
            &notebook.cells,
            &analysis.classification,
            options.figure_format,
        )
    } else {
        log::debug!("Figure extraction disabled");
        FigureExtraction::default()
    }
}

fn assemble(
    notebook: &Notebook,
    analysis: Analysis,
    figures: Vec<Figure>,
    options: &ConvertOptions,
) -> BuildOutput {
    DocumentBuilder::new(analysis.metadata.metadata)
        .with_consumed(analysis.metadata.consumed)
        .with_equations(analysis.equations)
        .with_figures(figures)
        .with_citations(analysis.citations.citations)
        .include_code(options.include_code)
        .build(&notebook.cells, &analysis.classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, WarningKind};
    use crate::model::Cell;
    use tempfile::TempDir;

    fn notebook() -> Notebook {
        Notebook::new(vec![
            Cell::narrative(0, "# Paper\n**Author:** A\n**Template:** fancy"),
            Cell::narrative(1, "## Results\nWe found $x$."),
        ])
    }

    #[test]
    fn test_analysis_warnings() {
        let analysis = analyze(&notebook()).unwrap();
        assert_eq!(analysis.equations.len(), 1);
        let kinds: Vec<_> = analysis.warnings().iter().map(|w| w.kind()).collect();
        assert_eq!(kinds, vec![WarningKind::UnrecognizedTemplate]);
    }

    #[test]
    fn test_build_document_writes_nothing() {
        let (doc, warnings) = build_document(&notebook(), &ConvertOptions::default()).unwrap();
        assert_eq!(doc.metadata.title, "Paper");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_convert_notebook_outputs() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("paper");
        let manifest =
            convert_notebook(&notebook(), &out, &ConvertOptions::default().with_save_figures(false))
                .unwrap();

        assert!(manifest.main_tex.exists());
        assert!(manifest.bibliography.exists());
        assert!(!out.join("figures").exists());
        assert!(manifest.complete);
        assert_eq!(manifest.counts.equations, 1);
        assert_eq!(manifest.counts.display_equations, 0);
    }

    #[test]
    fn test_missing_authors_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("paper");
        let notebook = Notebook::new(vec![Cell::narrative(0, "# Only a title")]);
        let err = convert_notebook(&notebook, &out, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingMetadata(ref f) if f == "authors"));
        assert!(!out.exists());
    }
}
