//! Document model assembly.
//!
//! The builder walks the cells once in notebook order. Heading lines open
//! sections; display equations and figures are interleaved at their source
//! position. Title-block lines and display-equation interpretation sentences
//! are cut from the body text.

use crate::classify::{Classification, Label};
use crate::error::Warning;
use crate::extract::ConsumedRange;
use crate::model::{
    BodyItem, Cell, CitationEntry, CodeListing, DocumentModel, Equation, Figure, PaperMetadata,
    Section, SectionKind, TextSpan,
};
use crate::text::{fenced_code_ranges, in_ranges, lines_with_ranges, parse_heading};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static ABSTRACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*[*_]*abstract[*_]*\s*:\s*[*_]*\s*").unwrap());

/// Deepest section level.
const MAX_DEPTH: u8 = 2;

/// Output of [`DocumentBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The assembled document
    pub document: DocumentModel,

    /// Structure warnings
    pub warnings: Vec<Warning>,
}

/// Builder for a [`DocumentModel`].
///
/// # Example
///
/// ```no_run
/// use nbpaper::builder::DocumentBuilder;
/// use nbpaper::classify::classify;
/// use nbpaper::extract::{extract_equations, extract_metadata};
/// use nbpaper::parser::NotebookParser;
///
/// let notebook = NotebookParser::open("paper.ipynb")?.parse()?;
/// let labels = classify(&notebook.cells);
/// let meta = extract_metadata(&notebook.cells, &labels)?;
/// let built = DocumentBuilder::new(meta.metadata)
///     .with_consumed(meta.consumed)
///     .with_equations(extract_equations(&notebook.cells, &labels))
///     .build(&notebook.cells, &labels);
/// println!("{} sections", built.document.sections.len());
/// # Ok::<(), nbpaper::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    metadata: PaperMetadata,
    consumed: Vec<ConsumedRange>,
    equations: Vec<Equation>,
    figures: Vec<Figure>,
    citations: Vec<CitationEntry>,
    include_code: bool,
}

impl DocumentBuilder {
    /// Create a builder for the given metadata.
    pub fn new(metadata: PaperMetadata) -> Self {
        Self {
            metadata,
            consumed: Vec::new(),
            equations: Vec::new(),
            figures: Vec::new(),
            citations: Vec::new(),
            include_code: false,
        }
    }

    /// Title-block ranges to leave out of the body.
    pub fn with_consumed(mut self, consumed: Vec<ConsumedRange>) -> Self {
        self.consumed = consumed;
        self
    }

    /// Set the extracted equations.
    pub fn with_equations(mut self, equations: Vec<Equation>) -> Self {
        self.equations = equations;
        self
    }

    /// Set the figures that were written.
    pub fn with_figures(mut self, figures: Vec<Figure>) -> Self {
        self.figures = figures;
        self
    }

    /// Set the reference list.
    pub fn with_citations(mut self, citations: Vec<CitationEntry>) -> Self {
        self.citations = citations;
        self
    }

    /// Keep code cells as listings.
    pub fn include_code(mut self, include: bool) -> Self {
        self.include_code = include;
        self
    }

    /// Assemble the document.
    pub fn build(self, cells: &[Cell], classification: &Classification) -> BuildOutput {
        let plans: Vec<Option<Vec<(Range<usize>, Mark)>>> = cells
            .iter()
            .enumerate()
            .map(|(position, cell)| self.plan_cell(position, cell, classification))
            .collect();

        let min_level = plans
            .iter()
            .flatten()
            .flatten()
            .filter_map(|(_, mark)| match mark {
                Mark::Heading { level, .. } => Some(*level),
                _ => None,
            })
            .min()
            .unwrap_or(1);

        let mut assembly = Assembly {
            sections: Vec::new(),
            placed_equations: vec![false; self.equations.len()],
            placed_figures: vec![false; self.figures.len()],
        };

        for (cell, plan) in cells.iter().zip(plans) {
            match plan {
                Some(marks) => assembly.add_text(cell, marks, min_level),
                None if cell.is_code() && self.include_code && !cell.source.trim().is_empty() => {
                    assembly.current().push(BodyItem::Code(CodeListing {
                        cell_index: cell.index,
                        source: cell.source.trim_end().to_string(),
                    }));
                }
                None => {}
            }

            for (index, _) in self
                .figures
                .iter()
                .enumerate()
                .filter(|(_, f)| f.cell_index == cell.index)
            {
                assembly.current().push(BodyItem::Figure { index });
                assembly.placed_figures[index] = true;
            }
        }

        let warnings = assembly.attach_orphans(&self.equations, &self.figures);

        let mut document = DocumentModel::new(self.metadata);
        document.sections = assembly.sections;
        document.equations = self.equations;
        document.figures = self.figures;
        document.citations = self.citations;

        log::debug!(
            "Built document: {} section(s), {} equation(s), {} figure(s), {} citation(s)",
            document.sections.len(),
            document.equations.len(),
            document.figures.len(),
            document.citations.len()
        );

        BuildOutput { document, warnings }
    }

    /// Positions in a text cell where the body changes: headings, display
    /// equations and cut ranges. `None` for cells without body text.
    fn plan_cell(
        &self,
        position: usize,
        cell: &Cell,
        classification: &Classification,
    ) -> Option<Vec<(Range<usize>, Mark)>> {
        if !cell.is_text() {
            return None;
        }
        let is_metadata = classification.has(position, Label::Metadata);
        if is_metadata && !classification.has(position, Label::Narrative) {
            return None;
        }

        let mut marks = Vec::new();
        let consumed: Vec<Range<usize>> = self
            .consumed
            .iter()
            .filter(|c| c.cell_index == cell.index)
            .map(|c| c.range.clone())
            .collect();
        marks.extend(consumed.iter().map(|r| (r.clone(), Mark::Skip)));

        let mut display = Vec::new();
        for (index, equation) in self.equations.iter().enumerate() {
            if !equation.is_display() {
                continue;
            }
            if equation.cell_index == cell.index {
                display.push(equation.span.clone());
                marks.push((equation.span.clone(), Mark::Equation(index)));
            }
            for annotation in [&equation.physical, &equation.perceptual].into_iter().flatten() {
                if annotation.cell_index == cell.index {
                    marks.push((annotation.span.clone(), Mark::Skip));
                }
            }
        }

        let fenced = fenced_code_ranges(&cell.source);
        let mut skip_title = position == 0 && is_metadata;
        let mut first_line = true;

        for (range, line) in lines_with_ranges(&cell.source) {
            if in_ranges(&consumed, range.start) {
                if matches!(parse_heading(line), Some((1, _))) {
                    skip_title = false;
                }
                continue;
            }
            if line.trim().is_empty() || in_ranges(&display, range.start) {
                continue;
            }
            if in_ranges(&fenced, range.start) {
                first_line = false;
                continue;
            }

            if let Some((level, text)) = parse_heading(line) {
                if skip_title && level == 1 {
                    skip_title = false;
                    marks.push((range, Mark::Skip));
                } else {
                    marks.push((
                        range,
                        Mark::Heading {
                            level,
                            text: text.to_string(),
                        },
                    ));
                }
            } else if first_line {
                if let Some(m) = ABSTRACT_RE.find(line) {
                    marks.push((range.start..range.start + m.end(), Mark::Abstract));
                }
            }
            first_line = false;
        }

        marks.sort_by_key(|(range, _)| range.start);
        Some(marks)
    }
}

#[derive(Debug)]
enum Mark {
    Heading { level: u8, text: String },
    Abstract,
    Equation(usize),
    Skip,
}

struct Assembly {
    sections: Vec<Section>,
    placed_equations: Vec<bool>,
    placed_figures: Vec<bool>,
}

impl Assembly {
    fn current(&mut self) -> &mut Section {
        if self.sections.is_empty() {
            self.sections.push(Section::preamble());
        }
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    fn add_text(&mut self, cell: &Cell, marks: Vec<(Range<usize>, Mark)>, min_level: u8) {
        let source = &cell.source;
        let mut cursor = 0;

        for (range, mark) in marks {
            if range.start > cursor {
                self.push_text(cell.index, &source[cursor..range.start]);
            }
            match mark {
                Mark::Heading { level, text } if range.start >= cursor => {
                    let depth = level.saturating_sub(min_level).min(MAX_DEPTH);
                    self.sections.push(Section::new(text, depth));
                }
                Mark::Abstract if range.start >= cursor => {
                    self.sections.push(Section::new("Abstract", 0));
                }
                Mark::Equation(index) => {
                    self.current().push(BodyItem::Equation { index });
                    self.placed_equations[index] = true;
                }
                _ => {}
            }
            cursor = cursor.max(range.end);
        }

        if cursor < source.len() {
            self.push_text(cell.index, &source[cursor..]);
        }
    }

    fn push_text(&mut self, cell_index: usize, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let section = self.current();
        // Reference lines live in the citation list.
        if section.kind == SectionKind::References {
            return;
        }
        section.push(BodyItem::Text(TextSpan {
            cell_index,
            text: text.to_string(),
        }));
    }

    /// Attach unplaced display equations and figures to the preamble.
    fn attach_orphans(&mut self, equations: &[Equation], figures: &[Figure]) -> Vec<Warning> {
        let mut orphans = Vec::new();
        for (index, equation) in equations.iter().enumerate() {
            if equation.is_display() && !self.placed_equations[index] {
                orphans.push((
                    BodyItem::Equation { index },
                    format!("equation {} of cell {} has no section", index, equation.cell_index),
                ));
            }
        }
        for (index, figure) in figures.iter().enumerate() {
            if !self.placed_figures[index] {
                orphans.push((
                    BodyItem::Figure { index },
                    format!("figure {} of cell {} has no section", figure.file_name, figure.cell_index),
                ));
            }
        }
        if orphans.is_empty() {
            return Vec::new();
        }

        if self.sections.first().map(|s| s.kind) != Some(SectionKind::Preamble) {
            self.sections.insert(0, Section::preamble());
        }

        orphans
            .into_iter()
            .map(|(item, detail)| {
                log::warn!("{}, attached to preamble", detail);
                self.sections[0].push(item);
                Warning::StructureInconsistent { detail }
            })
            .collect()
    }
}
