//! # nbpaper
//!
//! Convert Jupyter notebooks into academic LaTeX papers.
//!
//! A notebook is read into immutable cells, the cells are classified, and
//! metadata, equations, figures and references are extracted into a
//! [`DocumentModel`]. The model is then rendered through one of five
//! templates into `main.tex` plus a BibTeX file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use nbpaper::{convert, ConvertOptions};
//!
//! fn main() -> nbpaper::Result<()> {
//!     let options = ConvertOptions::new().with_template("two-column");
//!     let manifest = convert("analysis.ipynb", "paper", &options)?;
//!
//!     println!("Wrote {}", manifest.main_tex.display());
//!     for warning in &manifest.warnings {
//!         println!("warning: {}", warning);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Metadata**: title, authors, institution, keywords and template from
//!   bold `**Key:**` fields or the opening heading
//! - **Equations**: `$..$`, `$$..$$`, `\[..\]` and math environments, with
//!   physical and perceptual interpretation sentences attached
//! - **Figures**: image outputs and attachments decoded in parallel with
//!   Rayon and written as vector or raster files
//! - **Bibliography**: reference lists keyed as `Smith2020`
//! - **Templates**: baseline, two-column, ieee-style, domain-journal, thesis

pub mod builder;
pub mod classify;
pub mod collab;
pub mod convert;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod parser;
pub mod render;
pub mod text;

// Re-export commonly used types
pub use builder::DocumentBuilder;
pub use classify::{classify, Classification, Label};
pub use collab::{publish_all, MarkupCompiler, TreePublisher};
pub use convert::{convert, convert_notebook, ConvertOptions, Manifest, ManifestCounts};
pub use detect::{detect_format_from_bytes, detect_format_from_path, NotebookFormat};
pub use error::{Error, Result, Warning, WarningKind};
pub use model::{
    Artifact, BodyItem, Cell, CellKind, CitationEntry, DocumentModel, Equation, Figure,
    FigureFormat, ImageMime, MathKind, Notebook, PaperMetadata, Section, SectionKind,
};
pub use parser::{ErrorMode, NotebookParser, ParseOptions};
pub use render::{JsonFormat, RenderOptions, RenderOutput, TemplateId};

use std::path::Path;

/// Load a notebook file into cells.
///
/// # Example
///
/// ```no_run
/// use nbpaper::parse_file;
///
/// let notebook = parse_file("analysis.ipynb").unwrap();
/// println!("Cells: {}", notebook.len());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Notebook> {
    NotebookParser::open(path)?.parse()
}

/// Load a notebook file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Notebook> {
    NotebookParser::open_with_options(path, options)?.parse()
}

/// Load a notebook from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Notebook> {
    NotebookParser::from_bytes(data)?.parse()
}

/// Build the document model of a notebook file without writing anything.
///
/// # Example
///
/// ```no_run
/// use nbpaper::load_document;
///
/// let doc = load_document("analysis.ipynb").unwrap();
/// println!("{} by {}", doc.metadata.title, doc.metadata.byline());
/// ```
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<DocumentModel> {
    load_document_with_options(path, &ConvertOptions::default())
}

/// Build the document model of a notebook file with custom options.
pub fn load_document_with_options<P: AsRef<Path>>(
    path: P,
    options: &ConvertOptions,
) -> Result<DocumentModel> {
    let notebook = parse_file_with_options(path, options.parse.clone())?;
    let (document, _) = convert::build_document(&notebook, options)?;
    Ok(document)
}

/// Render a notebook file with a named template, without writing files.
///
/// # Example
///
/// ```no_run
/// use nbpaper::render_file;
///
/// let output = render_file("analysis.ipynb", "thesis").unwrap();
/// std::fs::write("main.tex", output.markup).unwrap();
/// ```
pub fn render_file<P: AsRef<Path>>(path: P, template: &str) -> Result<RenderOutput> {
    let doc = load_document(path)?;
    Ok(render::render(&doc, template))
}

/// Convert a notebook file to the JSON form of its document model.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = load_document(path)?;
    render::to_json(&doc, format)
}

/// Builder for loading and converting notebooks.
///
/// # Example
///
/// ```no_run
/// use nbpaper::{FigureFormat, Nbpaper};
///
/// let manifest = Nbpaper::new()
///     .template("ieee-style")
///     .figure_format(FigureFormat::Raster)
///     .include_code(true)
///     .lenient()
///     .load("analysis.ipynb")?
///     .write_to("paper")?;
/// # Ok::<(), nbpaper::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Nbpaper {
    options: ConvertOptions,
}

impl Nbpaper {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing options.
    pub fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Set the template name.
    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.options = self.options.with_template(name);
        self
    }

    /// Set the figure format.
    pub fn figure_format(mut self, format: FigureFormat) -> Self {
        self.options = self.options.with_figure_format(format);
        self
    }

    /// Keep code cells as listings.
    pub fn include_code(mut self, include: bool) -> Self {
        self.options = self.options.with_code(include);
        self
    }

    /// Enable or disable figure extraction.
    pub fn save_figures(mut self, save: bool) -> Self {
        self.options = self.options.with_save_figures(save);
        self
    }

    /// Enable lenient loading.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// The options collected so far.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Load a notebook file and build its document model.
    pub fn load<P: AsRef<Path>>(self, path: P) -> Result<NbpaperResult> {
        let notebook = parse_file_with_options(path, self.options.parse.clone())?;
        self.finish(notebook)
    }

    /// Load a notebook from bytes.
    pub fn load_bytes(self, data: &[u8]) -> Result<NbpaperResult> {
        let notebook =
            NotebookParser::from_bytes_with_options(data, self.options.parse.clone())?.parse()?;
        self.finish(notebook)
    }

    fn finish(self, notebook: Notebook) -> Result<NbpaperResult> {
        let (document, warnings) = convert::build_document(&notebook, &self.options)?;
        Ok(NbpaperResult {
            notebook,
            document,
            warnings,
            options: self.options,
        })
    }
}

/// A loaded notebook with its document model.
#[derive(Debug, Clone)]
pub struct NbpaperResult {
    notebook: Notebook,
    document: DocumentModel,
    warnings: Vec<Warning>,
    options: ConvertOptions,
}

impl NbpaperResult {
    /// Get the document model.
    pub fn document(&self) -> &DocumentModel {
        &self.document
    }

    /// Get the source notebook.
    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    /// Warnings collected while building the model.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Render with the configured template.
    pub fn render(&self) -> RenderOutput {
        render::render_with_options(&self.document, &self.options.effective_render_options())
    }

    /// Convert the document model to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Plain narrative text of the document.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Run the full conversion into a directory.
    pub fn write_to<P: AsRef<Path>>(&self, output_dir: P) -> Result<Manifest> {
        convert_notebook(&self.notebook, output_dir.as_ref(), &self.options)
    }
}
