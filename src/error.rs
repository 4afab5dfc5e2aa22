//! Error and warning types for nbpaper.
//!
//! Two kinds of failure exist:
//!
//! * [`Error`] is **fatal**: the conversion cannot proceed (no title, bad
//!   option value, unreadable notebook). It is returned before any file is
//!   written to the output directory.
//!
//! * [`Warning`] is **recoverable**: one figure could not be decoded, a
//!   template name was unknown, a reference line could not be keyed. The
//!   conversion continues and the warning is recorded in the
//!   [`crate::Manifest`].

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Result type alias for nbpaper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is not a Jupyter notebook.
    #[error("Unknown file format: not a Jupyter notebook")]
    UnknownFormat,

    /// The notebook uses a format version that is not supported.
    #[error("Unsupported notebook format: {0} (nbformat 4 is required)")]
    UnsupportedNotebook(String),

    /// The notebook JSON is structurally invalid.
    #[error("Notebook parsing error: {0}")]
    NotebookParse(String),

    /// A field required by every template (title, authors) is missing.
    #[error("Missing required metadata: {0}")]
    MissingMetadata(String),

    /// A configuration value is malformed.
    #[error("Invalid value '{value}' for option '{key}' (expected {expected})")]
    InvalidOption {
        key: String,
        value: String,
        expected: String,
    },

    /// Error while producing the document model JSON.
    #[error("Rendering error: {0}")]
    Render(String),

    /// An external collaborator (compiler, publisher) reported a failure.
    #[error("{name} failed: {reason}")]
    Collaborator { name: String, reason: String },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::InvalidOption`].
    pub fn invalid_option(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Error::InvalidOption {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Recoverable problems collected during a conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The requested template is unknown; the baseline template was used.
    #[error("Unrecognized template '{requested}', using '{fallback}'")]
    UnrecognizedTemplate { requested: String, fallback: String },

    /// A figure could not be decoded or converted and was omitted.
    #[error("Figure from cell {cell_index} (output {sub_index}) omitted: {reason}")]
    FigureExtractionFailed {
        cell_index: usize,
        sub_index: usize,
        reason: String,
    },

    /// A figure was written in another format than requested.
    #[error("Figure from cell {cell_index} (output {sub_index}): {reason}")]
    FigureFormatFallback {
        cell_index: usize,
        sub_index: usize,
        reason: String,
    },

    /// No caption could be derived; a placeholder was used.
    #[error("Figure from cell {cell_index} has no caption, using '{placeholder}'")]
    MissingCaption {
        cell_index: usize,
        placeholder: String,
    },

    /// A reference line had no parseable author; it was kept verbatim.
    #[error("Reference '{line}' could not be parsed, keyed as '{key}'")]
    CitationParseAmbiguous { line: String, key: String },

    /// A metadata field was given more than once; the later value was ignored.
    #[error("Metadata field '{field}' repeated in cell {cell_index}, keeping the first value")]
    DuplicateMetadata { cell_index: usize, field: String },

    /// The notebook structure needed a repair while building the document.
    #[error("Structure: {detail}")]
    StructureInconsistent { detail: String },
}

impl Warning {
    /// Short machine-readable name of the warning kind.
    pub fn kind(&self) -> WarningKind {
        match self {
            Warning::UnrecognizedTemplate { .. } => WarningKind::UnrecognizedTemplate,
            Warning::FigureExtractionFailed { .. } => WarningKind::FigureExtractionFailed,
            Warning::FigureFormatFallback { .. } => WarningKind::FigureFormatFallback,
            Warning::MissingCaption { .. } => WarningKind::MissingCaption,
            Warning::CitationParseAmbiguous { .. } => WarningKind::CitationParseAmbiguous,
            Warning::DuplicateMetadata { .. } => WarningKind::DuplicateMetadata,
            Warning::StructureInconsistent { .. } => WarningKind::StructureInconsistent,
        }
    }
}

/// Discriminant of [`Warning`], convenient for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnrecognizedTemplate,
    FigureExtractionFailed,
    FigureFormatFallback,
    MissingCaption,
    CitationParseAmbiguous,
    DuplicateMetadata,
    StructureInconsistent,
}
