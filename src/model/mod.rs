//! Document model types for notebook content representation.
//!
//! This module defines the intermediate representation that bridges
//! notebook parsing and LaTeX rendering: immutable [`Cell`]s on the input
//! side, and the [`DocumentModel`] the template engine consumes.

mod cell;
mod content;
mod document;
mod metadata;

pub use cell::{Artifact, Cell, CellKind, ImageArtifact, ImageData, ImageMime, Notebook};
pub use content::{
    Annotation, ArtifactRef, CitationEntry, Equation, Figure, FigureFormat, MathKind, FIGURES_DIR,
};
pub use document::{BodyItem, CodeListing, DocumentModel, Section, SectionKind, TextSpan};
pub use metadata::PaperMetadata;
