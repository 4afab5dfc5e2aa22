//! LaTeX rendering.

use super::inline::{has_link, inline_to_latex, markdown_to_latex, CiteLabels};
use super::{InterpretationStyle, RenderOptions, RenderStats, Template, TitleBlock};
use crate::model::{
    Annotation, BodyItem, CodeListing, DocumentModel, Equation, Figure, ImageMime, Section,
    SectionKind,
};

/// Render a document with a template.
pub fn to_latex(
    doc: &DocumentModel,
    template: &'static Template,
    options: &RenderOptions,
) -> (String, RenderStats) {
    LatexRenderer::new(template, options.clone()).render(doc)
}

/// LaTeX renderer for one template.
pub struct LatexRenderer {
    template: &'static Template,
    options: RenderOptions,
    cites: CiteLabels,
    stats: RenderStats,
}

impl LatexRenderer {
    /// Create a new renderer.
    pub fn new(template: &'static Template, options: RenderOptions) -> Self {
        Self {
            template,
            options,
            cites: CiteLabels::default(),
            stats: RenderStats::new(),
        }
    }

    /// Render a document to `main.tex` source.
    pub fn render(mut self, doc: &DocumentModel) -> (String, RenderStats) {
        self.cites = CiteLabels::from_citations(&doc.citations);

        let mut output = String::new();
        self.render_preamble(&mut output, doc);
        output.push_str("\\begin{document}\n\n");
        self.render_front_matter(&mut output, doc);

        for section in &doc.sections {
            match section.kind {
                SectionKind::Abstract => {}
                // Only floats and listings remain under the reference heading.
                SectionKind::References => self.render_items(&mut output, doc, &section.body),
                _ => self.render_section(&mut output, doc, section),
            }
        }

        self.render_bibliography(&mut output, doc);
        output.push_str("\\end{document}\n");

        log::debug!(
            "Rendered {} bytes with template {}",
            output.len(),
            self.template.id
        );
        (output, self.stats)
    }

    fn render_preamble(&self, output: &mut String, doc: &DocumentModel) {
        let template = self.template;
        if template.class_options.is_empty() {
            output.push_str(&format!("\\documentclass{{{}}}\n\n", template.document_class));
        } else {
            output.push_str(&format!(
                "\\documentclass[{}]{{{}}}\n\n",
                template.class_options.join(","),
                template.document_class
            ));
        }

        for (name, options) in self.packages(doc) {
            if options.is_empty() {
                output.push_str(&format!("\\usepackage{{{}}}\n", name));
            } else {
                output.push_str(&format!("\\usepackage[{}]{{{}}}\n", options, name));
            }
        }
        output.push('\n');

        if !template.preamble.is_empty() {
            for line in template.preamble {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }

        self.render_title_block(output, doc);
    }

    /// Template packages plus the ones the content needs. Extra packages
    /// load before `hyperref`; templates without it get it when the prose
    /// has links.
    fn packages(&self, doc: &DocumentModel) -> Vec<(&'static str, &'static str)> {
        let mut extra = Vec::new();
        if has_code(doc) {
            extra.push(("listings", ""));
        }
        if doc.has_svg_figures() {
            extra.push(("svg", ""));
        }
        let loads_hyperref = self.template.packages.iter().any(|&(name, _)| name == "hyperref");
        if !loads_hyperref && has_links(doc) {
            extra.push(("hyperref", ""));
        }

        let mut packages = Vec::with_capacity(self.template.packages.len() + extra.len());
        for &(name, options) in self.template.packages {
            if name == "hyperref" {
                packages.append(&mut extra);
            }
            packages.push((name, options));
        }
        packages.append(&mut extra);
        packages
    }

    fn render_title_block(&self, output: &mut String, doc: &DocumentModel) {
        let meta = &doc.metadata;
        let title = self.inline(&meta.title);
        let byline = self.inline(&meta.byline());
        let institution = meta.institution.as_deref().map(|i| self.inline(i));

        output.push_str(&format!("\\title{{{}}}\n", title));
        match self.template.title_block {
            TitleBlock::Standard => {
                match institution {
                    Some(inst) => output.push_str(&format!(
                        "\\author{{{} \\\\ \\small {}}}\n",
                        byline, inst
                    )),
                    None => output.push_str(&format!("\\author{{{}}}\n", byline)),
                }
                output.push_str("\\date{}\n");
            }
            TitleBlock::Ieee => {
                output.push_str(&format!("\\author{{\\IEEEauthorblockN{{{}}}", byline));
                if let Some(inst) = institution {
                    output.push_str(&format!("\n\\IEEEauthorblockA{{{}}}", inst));
                }
                output.push_str("}\n");
            }
            TitleBlock::Thesis => {
                output.push_str(&format!("\\author{{{}}}\n", byline));
                output.push_str(&format!("\\date{{{}}}\n", institution.unwrap_or_default()));
            }
        }
        output.push('\n');
    }

    fn render_front_matter(&mut self, output: &mut String, doc: &DocumentModel) {
        output.push_str("\\maketitle\n\n");

        if let Some(section) = doc.abstract_section() {
            output.push_str("\\begin{abstract}\n");
            let mut body = String::new();
            self.render_items(&mut body, doc, &section.body);
            output.push_str(body.trim_end());
            output.push_str("\n\\end{abstract}\n\n");
        }

        let keywords = &doc.metadata.keywords;
        if !keywords.is_empty() {
            let list = self.inline(&keywords.join(", "));
            match self.template.title_block {
                TitleBlock::Ieee => output.push_str(&format!(
                    "\\begin{{IEEEkeywords}}\n{}\n\\end{{IEEEkeywords}}\n\n",
                    list
                )),
                _ => output.push_str(&format!("\\noindent\\textbf{{Keywords:}} {}\n\n", list)),
            }
        }

        if self.template.title_block == TitleBlock::Thesis {
            output.push_str("\\tableofcontents\n\n");
        }
    }

    fn render_section(&mut self, output: &mut String, doc: &DocumentModel, section: &Section) {
        if section.kind != SectionKind::Preamble {
            self.stats.section_count += 1;
            output.push_str(&format!(
                "\\{}{{{}}}\n\n",
                self.template.heading_command(section.depth),
                self.inline(strip_numbering(&section.heading))
            ));
        }
        self.render_items(output, doc, &section.body);
    }

    fn render_items(&mut self, output: &mut String, doc: &DocumentModel, items: &[BodyItem]) {
        for item in items {
            match item {
                BodyItem::Text(span) => {
                    self.stats.count_text(&span.text);
                    let latex = markdown_to_latex(&span.text, &self.cites);
                    if !latex.is_empty() {
                        output.push_str(&latex);
                        output.push_str("\n\n");
                    }
                }
                BodyItem::Equation { index } => {
                    if let Some(equation) = doc.equation(*index) {
                        let ordinal = doc.equations[..*index]
                            .iter()
                            .filter(|e| e.cell_index == equation.cell_index)
                            .count();
                        self.render_equation(output, equation, ordinal);
                    }
                }
                BodyItem::Figure { index } => {
                    if let Some(figure) = doc.figure(*index) {
                        self.render_figure(output, figure);
                    }
                }
                BodyItem::Code(listing) => self.render_listing(output, listing),
            }
        }
    }

    fn render_equation(&mut self, output: &mut String, equation: &Equation, ordinal: usize) {
        self.stats.equation_count += 1;
        let environment = equation.environment.as_deref().unwrap_or("equation");
        output.push_str(&format!("\\begin{{{}}}\n{}\n", environment, equation.source));
        if equation.is_numbered() {
            output.push_str(&format!("\\label{{{}}}\n", equation.label(ordinal)));
        }
        output.push_str(&format!("\\end{{{}}}\n\n", environment));

        if let Some(annotation) = &equation.physical {
            self.render_annotation(output, "Physical", annotation);
        }
        if let Some(annotation) = &equation.perceptual {
            self.render_annotation(output, "Perceptual", annotation);
        }
    }

    fn render_annotation(&self, output: &mut String, label: &str, annotation: &Annotation) {
        let text = self.inline(&annotation.text);
        match self.template.interpretation {
            InterpretationStyle::Environment => output.push_str(&format!(
                "\\begin{{interpretation}}{{{}}}\n{}\n\\end{{interpretation}}\n\n",
                label, text
            )),
            InterpretationStyle::Quote => output.push_str(&format!(
                "\\begin{{quote}}\n\\small\\textit{{{} interpretation:}} {}\n\\end{{quote}}\n\n",
                label, text
            )),
        }
    }

    fn render_figure(&mut self, output: &mut String, figure: &Figure) {
        self.stats.figure_count += 1;
        let template = self.template;
        output.push_str(&format!(
            "\\begin{{figure}}[{}]\n  \\centering\n",
            template.figure_placement
        ));
        if figure.written_as == ImageMime::Svg {
            output.push_str(&format!(
                "  \\includesvg[width={}]{{{}}}\n",
                template.figure_width,
                figure.relative_stem()
            ));
        } else {
            output.push_str(&format!(
                "  \\includegraphics[width={}]{{{}}}\n",
                template.figure_width,
                figure.relative_path()
            ));
        }
        output.push_str(&format!("  \\caption{{{}}}\n", self.inline(&figure.caption)));
        output.push_str(&format!("  \\label{{{}}}\n", figure.label()));
        output.push_str("\\end{figure}\n\n");
    }

    fn render_listing(&mut self, output: &mut String, listing: &CodeListing) {
        self.stats.listing_count += 1;
        output.push_str(&format!(
            "\\begin{{lstlisting}}[language={}]\n{}\n\\end{{lstlisting}}\n\n",
            self.options.code_language, listing.source
        ));
    }

    fn render_bibliography(&mut self, output: &mut String, doc: &DocumentModel) {
        if doc.citations.is_empty() {
            return;
        }
        self.stats.citation_count = doc.citations.len() as u32;
        output.push_str("\\nocite{*}\n");
        output.push_str(&format!(
            "\\bibliographystyle{{{}}}\n",
            self.template.bibliography_style
        ));
        output.push_str(&format!(
            "\\bibliography{{{}}}\n\n",
            self.options.bibliography_name
        ));
    }

    fn inline(&self, text: &str) -> String {
        inline_to_latex(text, &self.cites)
    }
}

fn has_code(doc: &DocumentModel) -> bool {
    doc.sections
        .iter()
        .flat_map(|s| s.body.iter())
        .any(|item| matches!(item, BodyItem::Code(_)))
}

fn has_links(doc: &DocumentModel) -> bool {
    let meta = &doc.metadata;
    let body = doc.sections.iter().flat_map(|s| {
        std::iter::once(s.heading.as_str()).chain(s.body.iter().filter_map(|item| match item {
            BodyItem::Text(span) => Some(span.text.as_str()),
            _ => None,
        }))
    });
    let annotations = doc
        .equations
        .iter()
        .flat_map(|e| e.physical.iter().chain(e.perceptual.iter()))
        .map(|a| a.text.as_str());

    std::iter::once(meta.title.as_str())
        .chain(meta.institution.as_deref())
        .chain(meta.authors.iter().map(String::as_str))
        .chain(meta.keywords.iter().map(String::as_str))
        .chain(body)
        .chain(doc.figures.iter().map(|f| f.caption.as_str()))
        .chain(annotations)
        .any(has_link)
}

/// Drop manual numbering ("2.1 Methods"); LaTeX numbers sections itself.
fn strip_numbering(heading: &str) -> &str {
    let rest = heading.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    if rest.len() < heading.len() && rest.starts_with(' ') {
        rest.trim_start()
    } else {
        heading
    }
}
