//! Extracted content: equations, figures and citations.

use super::ImageMime;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Directory (relative to the output directory) that holds figure files.
pub const FIGURES_DIR: &str = "figures";

/// How a math span was delimited in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathKind {
    /// `$$..$$`, `\[..\]` or a math environment
    Display,
    /// `$..$` or `\(..\)`
    Inline,
}

/// A sentence interpreting an equation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Interpretation text
    pub text: String,

    /// Cell the sentence was found in
    pub cell_index: usize,

    /// Byte range of the sentence in that cell
    pub span: Range<usize>,
}

/// A math expression found in a narrative cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equation {
    /// Math source without delimiters
    pub source: String,

    /// Display or inline
    pub kind: MathKind,

    /// Math environment name when written as `\begin{align}` etc.
    pub environment: Option<String>,

    /// Originating cell
    pub cell_index: usize,

    /// Byte range of the span (delimiters included) in the cell
    pub span: Range<usize>,

    /// Physical interpretation, if the author gave one
    pub physical: Option<Annotation>,

    /// Perceptual interpretation, if the author gave one
    pub perceptual: Option<Annotation>,
}

impl Equation {
    /// Create an equation without annotations.
    pub fn new(
        source: impl Into<String>,
        kind: MathKind,
        cell_index: usize,
        span: Range<usize>,
    ) -> Self {
        Self {
            source: source.into(),
            kind,
            environment: None,
            cell_index,
            span,
            physical: None,
            perceptual: None,
        }
    }

    /// Whether the equation is displayed on its own line.
    pub fn is_display(&self) -> bool {
        self.kind == MathKind::Display
    }

    /// Whether any interpretation is attached.
    pub fn has_annotation(&self) -> bool {
        self.physical.is_some() || self.perceptual.is_some()
    }

    /// Starred environments are unnumbered and take no label.
    pub fn is_numbered(&self) -> bool {
        !self
            .environment
            .as_deref()
            .map_or(false, |env| env.ends_with('*'))
    }

    /// Cross-reference label; `ordinal` counts the math spans before this
    /// one in the same cell.
    pub fn label(&self, ordinal: usize) -> String {
        format!("eq:{}-{}", self.cell_index, ordinal)
    }
}

/// Target format family for figure files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureFormat {
    /// PDF or SVG
    #[default]
    Vector,
    /// PNG or JPEG
    Raster,
}

impl FigureFormat {
    /// Parse a configuration value. Legacy extension names are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" | "pdf" | "svg" => Some(FigureFormat::Vector),
            "raster" | "png" | "jpg" | "jpeg" => Some(FigureFormat::Raster),
            _ => None,
        }
    }
}

impl std::fmt::Display for FigureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FigureFormat::Vector => write!(f, "vector"),
            FigureFormat::Raster => write!(f, "raster"),
        }
    }
}

/// Which notebook output a figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Index in the cell's artifact list
    pub output_index: usize,

    /// Representation that was used
    pub mime: ImageMime,
}

/// A figure emitted to the figures directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    /// Originating cell
    pub cell_index: usize,

    /// Position among the cell's images
    pub sub_index: usize,

    /// 1-based figure number in notebook order
    pub number: usize,

    /// Source artifact
    pub source: ArtifactRef,

    /// File name inside [`FIGURES_DIR`] (`fig-<cell>-<sub>.<ext>`)
    pub file_name: String,

    /// Written format family
    pub format: FigureFormat,

    /// File format actually written
    pub written_as: ImageMime,

    /// Caption text
    pub caption: String,

    /// Whether the caption is a generated placeholder
    pub caption_generated: bool,
}

impl Figure {
    /// Deterministic file name for a figure.
    pub fn file_name_for(cell_index: usize, sub_index: usize, ext: &str) -> String {
        format!("fig-{}-{}.{}", cell_index, sub_index, ext)
    }

    /// Path relative to the output directory, always with `/`.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", FIGURES_DIR, self.file_name)
    }

    /// Path without extension (used by `\includesvg`).
    pub fn relative_stem(&self) -> String {
        let stem = self
            .file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.file_name);
        format!("{}/{}", FIGURES_DIR, stem)
    }

    /// Cross-reference label.
    pub fn label(&self) -> String {
        format!("fig:{}-{}", self.cell_index, self.sub_index)
    }
}

/// One entry of the reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEntry {
    /// The reference line, whitespace normalized
    pub raw: String,

    /// The line without list marker or `[n]` label
    pub text: String,

    /// Bibliography key, unique within the document
    pub key: String,

    /// Numeric label when the line started with `[n]`
    pub label: Option<String>,

    /// Cell the line was found in
    pub cell_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_paths() {
        let figure = Figure {
            cell_index: 2,
            sub_index: 0,
            number: 1,
            source: ArtifactRef {
                output_index: 0,
                mime: ImageMime::Svg,
            },
            file_name: Figure::file_name_for(2, 0, "svg"),
            format: FigureFormat::Vector,
            written_as: ImageMime::Svg,
            caption: "Response".into(),
            caption_generated: false,
        };
        assert_eq!(figure.relative_path(), "figures/fig-2-0.svg");
        assert_eq!(figure.relative_stem(), "figures/fig-2-0");
        assert_eq!(figure.label(), "fig:2-0");
    }

    #[test]
    fn test_figure_format_parse() {
        assert_eq!(FigureFormat::parse("Vector"), Some(FigureFormat::Vector));
        assert_eq!(FigureFormat::parse("pdf"), Some(FigureFormat::Vector));
        assert_eq!(FigureFormat::parse("png"), Some(FigureFormat::Raster));
        assert_eq!(FigureFormat::parse("bmp"), None);
    }
}
