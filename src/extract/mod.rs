//! Content extractors.
//!
//! Each extractor reads classified cells and produces one kind of paper
//! content. Nothing here mutates a cell; recoverable problems come back as
//! [`Warning`](crate::Warning)s next to the extracted values.

pub mod citation;
pub mod equation;
pub mod figure;
pub mod metadata;

pub use citation::{extract_citations, CitationExtraction};
pub use equation::{extract_equations, find_math_spans, MathSpan};
pub use figure::{
    extract_figures, number_figures, write_figures, ExtractedFigure, FigureExtraction,
    WrittenFigures,
};
pub use metadata::{extract_metadata, ConsumedRange, MetadataExtraction};
