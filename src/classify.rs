//! Cell classification.
//!
//! Every cell receives one or more [`Label`]s; labels are additive and no
//! cell is dropped. Downstream extractors select the cells they care about
//! by label.

use crate::extract::equation::find_math_spans;
use crate::extract::metadata::{has_field_marker, has_other_content};
use crate::model::Cell;
use crate::text::{lines_with_ranges, parse_heading};
use serde::{Deserialize, Serialize};

/// Role of a cell in the paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Label {
    /// Title block fields
    Metadata,
    /// Prose
    Narrative,
    /// Contains at least one math span
    EquationBearing,
    /// Carries image outputs or attachments
    FigureProducing,
    /// Code without images
    CodeOnly,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Label::Metadata => "metadata",
            Label::Narrative => "narrative",
            Label::EquationBearing => "equation-bearing",
            Label::FigureProducing => "figure-producing",
            Label::CodeOnly => "code-only",
        };
        write!(f, "{}", name)
    }
}

/// Labels of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellLabels {
    /// Cell index
    pub cell_index: usize,

    labels: Vec<Label>,
}

impl CellLabels {
    fn new(cell_index: usize) -> Self {
        Self {
            cell_index,
            labels: Vec::new(),
        }
    }

    fn insert(&mut self, label: Label) {
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }

    /// Check for a label.
    pub fn contains(&self, label: Label) -> bool {
        self.labels.contains(&label)
    }

    /// Labels in assignment order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
}

/// Labels for a cell sequence, parallel to it by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    cells: Vec<CellLabels>,
}

impl Classification {
    /// Labels of the cell at a position.
    pub fn get(&self, position: usize) -> Option<&CellLabels> {
        self.cells.get(position)
    }

    /// Whether the cell at a position carries a label.
    pub fn has(&self, position: usize, label: Label) -> bool {
        self.cells
            .get(position)
            .map(|c| c.contains(label))
            .unwrap_or(false)
    }

    /// Positions of the cells carrying a label, in order.
    pub fn positions_with(&self, label: Label) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.contains(label))
            .map(|(position, _)| position)
    }

    /// All cell labels.
    pub fn iter(&self) -> impl Iterator<Item = &CellLabels> {
        self.cells.iter()
    }

    /// Number of classified cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cell was classified.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Classify a cell sequence.
pub fn classify(cells: &[Cell]) -> Classification {
    let cells = cells
        .iter()
        .enumerate()
        .map(|(position, cell)| classify_cell(position, cell))
        .collect();
    Classification { cells }
}

fn classify_cell(position: usize, cell: &Cell) -> CellLabels {
    let mut labels = CellLabels::new(cell.index);

    if cell.is_code() {
        if cell.has_image() {
            labels.insert(Label::FigureProducing);
        } else {
            labels.insert(Label::CodeOnly);
        }
        return labels;
    }

    let title_heading = position == 0 && has_title_heading(&cell.source);
    if title_heading || has_field_marker(&cell.source) {
        labels.insert(Label::Metadata);
        if has_other_content(&cell.source, title_heading) {
            labels.insert(Label::Narrative);
        }
    } else {
        labels.insert(Label::Narrative);
    }

    if !find_math_spans(&cell.source).is_empty() {
        labels.insert(Label::EquationBearing);
    }
    if cell.has_image() {
        labels.insert(Label::FigureProducing);
    }

    labels
}

fn has_title_heading(source: &str) -> bool {
    lines_with_ranges(source).any(|(_, line)| matches!(parse_heading(line), Some((1, _))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Artifact, ImageArtifact, ImageData, ImageMime};

    fn image() -> Artifact {
        Artifact::Image(ImageArtifact::new(vec![ImageData::new(
            ImageMime::Png,
            "AAAA",
        )]))
    }

    #[test]
    fn test_classify_rules() {
        let cells = vec![
            Cell::narrative(0, "# Test Paper\n**Author:** A. Researcher"),
            Cell::narrative(1, "## Abstract\nShort text with $x$."),
            Cell::code(2, "plot()").with_artifact(image()),
            Cell::code(3, "x = 1"),
            Cell::narrative(4, "# Not a title\n**Keywords:** a, b\nMore prose."),
        ];
        let c = classify(&cells);

        assert_eq!(c.get(0).unwrap().labels(), &[Label::Metadata]);
        assert!(c.has(1, Label::Narrative));
        assert!(c.has(1, Label::EquationBearing));
        assert!(!c.has(1, Label::Metadata));
        assert_eq!(c.get(2).unwrap().labels(), &[Label::FigureProducing]);
        assert_eq!(c.get(3).unwrap().labels(), &[Label::CodeOnly]);
        assert!(c.has(4, Label::Metadata));
        assert!(c.has(4, Label::Narrative));

        let metadata: Vec<_> = c.positions_with(Label::Metadata).collect();
        assert_eq!(metadata, vec![0, 4]);
    }

    #[test]
    fn test_heading_only_counts_at_start() {
        let cells = vec![
            Cell::narrative(0, "Some prose first."),
            Cell::narrative(1, "# Title later"),
        ];
        let c = classify(&cells);
        assert!(c.positions_with(Label::Metadata).next().is_none());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_mixed_cell_is_figure_producing() {
        let mut cell = Cell::new(0, crate::model::CellKind::Mixed, "![Setup](attachment:a.png)");
        cell.artifacts.push(image());
        let c = classify(&[cell]);
        assert!(c.has(0, Label::FigureProducing));
        assert!(c.has(0, Label::Narrative));
    }
}
