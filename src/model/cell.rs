//! Notebook cells and their output artifacts.

use crate::detect::NotebookFormat;
use serde::{Deserialize, Serialize};

/// A loaded notebook: the ordered cell sequence plus its format version.
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    /// Format version detected from the file
    pub format: NotebookFormat,

    /// Cells in source order
    pub cells: Vec<Cell>,
}

impl Notebook {
    /// Create a notebook from cells (nbformat 4.5 is assumed).
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            format: NotebookFormat { major: 4, minor: 5 },
            cells,
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the notebook has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Markdown or raw text
    Narrative,
    /// Executable code
    Code,
    /// Markdown text carrying embedded image attachments
    Mixed,
}

/// One immutable notebook cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Position in the notebook (0-based)
    pub index: usize,

    /// Cell kind
    pub kind: CellKind,

    /// Raw source text
    pub source: String,

    /// Attached outputs (code cells) or attachments (mixed cells)
    pub artifacts: Vec<Artifact>,
}

impl Cell {
    /// Create a cell without artifacts.
    pub fn new(index: usize, kind: CellKind, source: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            source: source.into(),
            artifacts: Vec::new(),
        }
    }

    /// Create a narrative (markdown) cell.
    pub fn narrative(index: usize, source: impl Into<String>) -> Self {
        Self::new(index, CellKind::Narrative, source)
    }

    /// Create a code cell.
    pub fn code(index: usize, source: impl Into<String>) -> Self {
        Self::new(index, CellKind::Code, source)
    }

    /// Attach an artifact.
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Whether the cell holds narrative text.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, CellKind::Narrative | CellKind::Mixed)
    }

    /// Whether the cell is a code cell.
    pub fn is_code(&self) -> bool {
        self.kind == CellKind::Code
    }

    /// Image artifacts with their output index.
    pub fn images(&self) -> impl Iterator<Item = (usize, &ImageArtifact)> {
        self.artifacts
            .iter()
            .enumerate()
            .filter_map(|(i, artifact)| match artifact {
                Artifact::Image(image) => Some((i, image)),
                _ => None,
            })
    }

    /// Whether any image artifact is attached.
    pub fn has_image(&self) -> bool {
        self.images().next().is_some()
    }
}

/// A typed output attached to a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Image output, possibly in several representations
    Image(ImageArtifact),
    /// Textual result (stdout, `text/plain`)
    Text(String),
    /// Execution error
    Error { name: String, value: String },
}

/// An image output. Jupyter display bundles may carry the same picture in
/// several formats; representations are kept in preference order
/// (PDF, SVG, PNG, JPEG, GIF).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    /// Attachment name for markdown attachments (`attachment:<name>`)
    pub name: Option<String>,

    /// Encoded payloads
    pub representations: Vec<ImageData>,
}

impl ImageArtifact {
    /// Create an image artifact from representations, sorting them into
    /// preference order.
    pub fn new(mut representations: Vec<ImageData>) -> Self {
        representations.sort_by_key(|r| r.mime.preference());
        Self {
            name: None,
            representations,
        }
    }

    /// Set the attachment name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// First representation of the given MIME type.
    pub fn representation(&self, mime: ImageMime) -> Option<&ImageData> {
        self.representations.iter().find(|r| r.mime == mime)
    }
}

/// One encoded image payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Image MIME type
    pub mime: ImageMime,

    /// Base64 text for binary formats, markup text for SVG
    pub payload: String,
}

impl ImageData {
    /// Create a payload.
    pub fn new(mime: ImageMime, payload: impl Into<String>) -> Self {
        Self {
            mime,
            payload: payload.into(),
        }
    }
}

/// Image formats recognized in notebook outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMime {
    Pdf,
    Svg,
    Png,
    Jpeg,
    Gif,
}

impl ImageMime {
    /// All supported formats in preference order.
    pub const ALL: [ImageMime; 5] = [
        ImageMime::Pdf,
        ImageMime::Svg,
        ImageMime::Png,
        ImageMime::Jpeg,
        ImageMime::Gif,
    ];

    /// Parse a MIME type string.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Some(ImageMime::Pdf),
            "image/svg+xml" => Some(ImageMime::Svg),
            "image/png" => Some(ImageMime::Png),
            "image/jpeg" | "image/jpg" => Some(ImageMime::Jpeg),
            "image/gif" => Some(ImageMime::Gif),
            _ => None,
        }
    }

    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageMime::Pdf => "application/pdf",
            ImageMime::Svg => "image/svg+xml",
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Gif => "image/gif",
        }
    }

    /// File extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageMime::Pdf => "pdf",
            ImageMime::Svg => "svg",
            ImageMime::Png => "png",
            ImageMime::Jpeg => "jpg",
            ImageMime::Gif => "gif",
        }
    }

    /// Whether the format is vector graphics.
    pub fn is_vector(&self) -> bool {
        matches!(self, ImageMime::Pdf | ImageMime::Svg)
    }

    /// Whether the notebook stores the payload base64 encoded.
    pub fn is_base64(&self) -> bool {
        !matches!(self, ImageMime::Svg)
    }

    fn preference(&self) -> usize {
        Self::ALL.iter().position(|m| m == self).unwrap_or(usize::MAX)
    }

    /// Detect a format from decoded bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"%PDF-") {
            return Some(ImageMime::Pdf);
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageMime::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageMime::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageMime::Gif);
        }

        let head = &data[..data.len().min(512)];
        let head = String::from_utf8_lossy(head);
        if head.contains("<svg") {
            return Some(ImageMime::Svg);
        }

        None
    }
}

impl std::fmt::Display for ImageMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}
