//! Rendering of the document model to LaTeX, BibTeX and JSON.

mod bibtex;
mod inline;
mod json;
mod latex;
mod options;
mod result;
mod template;

pub use bibtex::to_bibtex;
pub use inline::{escape_text, inline_to_latex, markdown_to_latex, CiteLabels};
pub use json::{to_json, JsonFormat};
pub use latex::{to_latex, LatexRenderer};
pub use options::RenderOptions;
pub use result::{RenderOutput, RenderStats};
pub use template::{resolve_template, InterpretationStyle, Template, TemplateId, TitleBlock};

use crate::model::DocumentModel;

/// Render a document with a named template.
///
/// Unknown names fall back to the baseline template; the fallback is
/// reported in [`RenderOutput::fallback`]. Rendering is deterministic:
/// identical inputs give byte-identical output.
///
/// # Example
///
/// ```no_run
/// use nbpaper::{load_document, render};
///
/// let doc = load_document("paper.ipynb")?;
/// let output = render::render(&doc, "two-column");
/// std::fs::write("main.tex", &output.markup)?;
/// # Ok::<(), nbpaper::Error>(())
/// ```
pub fn render(doc: &DocumentModel, template_name: &str) -> RenderOutput {
    render_with_options(doc, &RenderOptions::new().with_template(template_name))
}

/// Render a document with custom options. Without a template name the
/// template chosen in the notebook metadata is used.
pub fn render_with_options(doc: &DocumentModel, options: &RenderOptions) -> RenderOutput {
    let (template, fallback) = match options.template.as_deref() {
        Some(name) => resolve_template(name),
        None => (doc.metadata.template, None),
    };

    let renderer = LatexRenderer::new(template.template(), options.clone());
    let (markup, stats) = renderer.render(doc);

    RenderOutput {
        markup,
        bibliography: to_bibtex(&doc.citations),
        template,
        fallback,
        stats,
    }
}
