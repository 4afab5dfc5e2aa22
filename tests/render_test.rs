//! Rendering tests over a hand-built document model.

use nbpaper::model::{
    Annotation, ArtifactRef, BodyItem, CitationEntry, DocumentModel, Equation, Figure,
    FigureFormat, ImageMime, MathKind, PaperMetadata, Section, TextSpan,
};
use nbpaper::render::{render, render_with_options, to_bibtex, RenderOptions, TemplateId};
use nbpaper::WarningKind;

fn document() -> DocumentModel {
    let mut metadata = PaperMetadata::new("Sound & Noise", vec!["A. Researcher".into()])
        .with_institution("Example University");
    metadata.add_keyword("acoustics");

    let mut doc = DocumentModel::new(metadata);

    let mut intro = Section::new("Introduction", 0);
    intro.push(BodyItem::Text(TextSpan {
        cell_index: 1,
        text: "Levels rose by 10% over **two** weeks [1].".into(),
    }));
    intro.push(BodyItem::Equation { index: 0 });

    let mut method = Section::new("Method", 1);
    method.push(BodyItem::Figure { index: 0 });

    doc.sections = vec![intro, method];

    let mut equation = Equation::new("L = 20 \\log_{10}(p/p_0)", MathKind::Display, 1, 50..80);
    equation.physical = Some(Annotation {
        text: "Physically, the level is logarithmic.".into(),
        cell_index: 1,
        span: 81..118,
    });
    doc.equations = vec![equation];

    doc.figures = vec![Figure {
        cell_index: 2,
        sub_index: 0,
        number: 1,
        source: ArtifactRef {
            output_index: 0,
            mime: ImageMime::Png,
        },
        file_name: Figure::file_name_for(2, 0, "png"),
        format: FigureFormat::Raster,
        written_as: ImageMime::Png,
        caption: "Setup".into(),
        caption_generated: false,
    }];

    doc.citations = vec![CitationEntry {
        raw: "[1] Smith, J. (2020). Noise.".into(),
        text: "Smith, J. (2020). Noise.".into(),
        key: "Smith2020".into(),
        label: Some("1".into()),
        cell_index: 3,
    }];
    doc
}

#[test]
fn test_render_is_deterministic() {
    let doc = document();
    for id in TemplateId::ALL {
        let a = render(&doc, id.name());
        let b = render(&doc, id.name());
        assert_eq!(a.markup, b.markup, "template {}", id);
        assert_eq!(a.bibliography, b.bibliography);
        assert_eq!(a.template, id);
        assert!(a.fallback.is_none());
    }
}

#[test]
fn test_document_order_is_preserved() {
    let output = render(&document(), "baseline");
    let latex = &output.markup;

    let intro = latex.find("\\section{Introduction}").unwrap();
    let text = latex.find("10\\% over \\textbf{two} weeks").unwrap();
    let equation = latex.find("\\begin{equation}").unwrap();
    let method = latex.find("\\subsection{Method}").unwrap();
    let figure = latex.find("fig-2-0.png").unwrap();
    assert!(intro < text && text < equation && equation < method && method < figure);

    assert!(latex.contains("\\title{Sound \\& Noise}"));
    assert!(latex.contains("\\cite{Smith2020}"));
}

#[test]
fn test_every_template_renders_shared_content() {
    let doc = document();
    for id in TemplateId::ALL {
        let latex = render(&doc, id.name()).markup;
        assert!(latex.contains("\\begin{document}"), "template {}", id);
        assert!(latex.contains("L = 20 \\log_{10}(p/p_0)"));
        assert!(latex.contains("figures/fig-2-0.png"));
        assert!(latex.contains("\\bibliography{references}"));
        assert!(latex.trim_end().ends_with("\\end{document}"));
    }
}

#[test]
fn test_unknown_template_warning() {
    let output = render(&document(), "fancy-journal");
    assert_eq!(output.template, TemplateId::Baseline);
    let warning = output.fallback.unwrap();
    assert_eq!(warning.kind(), WarningKind::UnrecognizedTemplate);
}

#[test]
fn test_custom_bibliography_name() {
    let options = RenderOptions::new()
        .with_template("thesis")
        .with_bibliography_name("sources");
    let output = render_with_options(&document(), &options);
    assert!(output.markup.contains("\\bibliography{sources}"));
    assert_eq!(output.stats.figure_count, 1);
    assert_eq!(output.stats.citation_count, 1);
}

#[test]
fn test_bibtex_matches_document() {
    let doc = document();
    let bib = to_bibtex(&doc.citations);
    assert_eq!(bib, render(&doc, "baseline").bibliography);
    assert!(bib.contains("@misc{Smith2020,"));
}
