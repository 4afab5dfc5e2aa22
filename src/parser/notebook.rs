//! Jupyter notebook (`.ipynb`) loader.

use super::ParseOptions;
use crate::detect::{detect_format_from_value, NotebookFormat};
use crate::error::{Error, Result};
use crate::model::{Artifact, Cell, CellKind, ImageArtifact, ImageData, ImageMime, Notebook};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Notebook text fields are either a string or a list of line strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MultilineText {
    Single(String),
    Lines(Vec<String>),
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::Single(String::new())
    }
}

impl MultilineText {
    fn into_string(self) -> String {
        match self {
            MultilineText::Single(s) => s,
            MultilineText::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawNotebook {
    #[serde(default)]
    cells: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: MultilineText,
    #[serde(default)]
    outputs: Vec<Value>,
    #[serde(default)]
    attachments: BTreeMap<String, BTreeMap<String, MultilineText>>,
}

/// Loader turning notebook JSON into immutable [`Cell`]s.
///
/// # Example
///
/// ```no_run
/// use nbpaper::parser::NotebookParser;
///
/// let notebook = NotebookParser::open("paper.ipynb")?.parse()?;
/// println!("{} cells", notebook.len());
/// # Ok::<(), nbpaper::Error>(())
/// ```
pub struct NotebookParser {
    value: Value,
    format: NotebookFormat,
    options: ParseOptions,
}

impl NotebookParser {
    /// Open a notebook file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a notebook file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Create a parser from notebook bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Create a parser from notebook bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        let value: Value = serde_json::from_slice(data).map_err(|_| Error::UnknownFormat)?;
        let format = detect_format_from_value(&value)?;
        Ok(Self {
            value,
            format,
            options,
        })
    }

    /// Create a parser from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Create a parser from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Detected notebook format.
    pub fn format(&self) -> NotebookFormat {
        self.format
    }

    /// Load all cells.
    pub fn parse(self) -> Result<Notebook> {
        let raw: RawNotebook =
            serde_json::from_value(self.value).map_err(|e| Error::NotebookParse(e.to_string()))?;

        let mut cells = Vec::with_capacity(raw.cells.len());
        for (index, value) in raw.cells.into_iter().enumerate() {
            match self.options.convert_cell(index, value) {
                Ok(cell) => cells.push(cell),
                Err(e) if self.options.is_lenient() => {
                    log::warn!("Skipping cell {}: {}", index, e);
                }
                Err(e) => return Err(e),
            }
        }

        log::debug!("Loaded {} cells ({})", cells.len(), self.format);
        Ok(Notebook {
            format: self.format,
            cells,
        })
    }
}

impl ParseOptions {
    fn convert_cell(&self, index: usize, value: Value) -> Result<Cell> {
        let raw: RawCell = serde_json::from_value(value)
            .map_err(|e| Error::NotebookParse(format!("cell {}: {}", index, e)))?;
        let source = raw.source.into_string();

        match raw.cell_type.as_str() {
            "markdown" => {
                let images = if self.load_attachments {
                    attachments_in_order(&source, raw.attachments)
                } else {
                    Vec::new()
                };
                let kind = if images.is_empty() {
                    CellKind::Narrative
                } else {
                    CellKind::Mixed
                };
                let mut cell = Cell::new(index, kind, source);
                cell.artifacts = images.into_iter().map(Artifact::Image).collect();
                Ok(cell)
            }
            "raw" => Ok(Cell::narrative(index, source)),
            "code" => {
                let mut cell = Cell::code(index, source);
                for (output_index, output) in raw.outputs.iter().enumerate() {
                    match convert_output(output) {
                        Ok(Some(artifact)) => cell.artifacts.push(artifact),
                        Ok(None) => {}
                        Err(e) if self.is_lenient() => {
                            log::warn!(
                                "Skipping output {} of cell {}: {}",
                                output_index,
                                index,
                                e
                            );
                        }
                        Err(e) => return Err(e),
                    }
                }
                Ok(cell)
            }
            other => Err(Error::NotebookParse(format!(
                "cell {}: unknown cell type '{}'",
                index, other
            ))),
        }
    }
}

fn convert_output(output: &Value) -> Result<Option<Artifact>> {
    let object = output
        .as_object()
        .ok_or_else(|| Error::NotebookParse("output is not an object".into()))?;
    let output_type = object
        .get("output_type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::NotebookParse("output without output_type".into()))?;

    match output_type {
        "stream" => Ok(Some(Artifact::Text(
            object.get("text").map(text_of).unwrap_or_default(),
        ))),
        "execute_result" | "display_data" => {
            let data = object
                .get("data")
                .and_then(Value::as_object)
                .ok_or_else(|| Error::NotebookParse(format!("{} without data", output_type)))?;
            Ok(bundle_artifact(data))
        }
        "error" => Ok(Some(Artifact::Error {
            name: string_field(object, "ename"),
            value: string_field(object, "evalue"),
        })),
        other => {
            log::debug!("Ignoring output type '{}'", other);
            Ok(None)
        }
    }
}

fn bundle_artifact(data: &Map<String, Value>) -> Option<Artifact> {
    let representations: Vec<ImageData> = ImageMime::ALL
        .iter()
        .filter_map(|mime| {
            data.get(mime.mime_type())
                .map(|payload| ImageData::new(*mime, text_of(payload)))
        })
        .collect();

    if !representations.is_empty() {
        return Some(Artifact::Image(ImageArtifact::new(representations)));
    }

    data.get("text/plain").map(|text| Artifact::Text(text_of(text)))
}

/// Attachments ordered by their first reference in the cell text;
/// unreferenced ones follow in name order.
fn attachments_in_order(
    source: &str,
    attachments: BTreeMap<String, BTreeMap<String, MultilineText>>,
) -> Vec<ImageArtifact> {
    let mut images: Vec<(usize, ImageArtifact)> = attachments
        .into_iter()
        .filter_map(|(name, bundle)| {
            let representations: Vec<ImageData> = bundle
                .into_iter()
                .filter_map(|(mime, payload)| {
                    ImageMime::from_mime_type(&mime)
                        .map(|mime| ImageData::new(mime, payload.into_string()))
                })
                .collect();
            if representations.is_empty() {
                return None;
            }
            let position = source
                .find(&format!("attachment:{}", name))
                .unwrap_or(usize::MAX);
            Some((position, ImageArtifact::new(representations).with_name(name)))
        })
        .collect();

    images.sort_by_key(|(position, _)| *position);
    images.into_iter().map(|(_, image)| image).collect()
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_value(value: Value) -> Result<Notebook> {
        let data = serde_json::to_vec(&value).unwrap();
        NotebookParser::from_bytes(&data)?.parse()
    }

    #[test]
    fn test_parse_cells() {
        let notebook = parse_value(json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [
                {"cell_type": "markdown", "metadata": {}, "source": ["# Title\n", "**Authors:** A"]},
                {"cell_type": "code", "metadata": {}, "execution_count": 1, "source": "print(1)",
                 "outputs": [
                    {"output_type": "stream", "name": "stdout", "text": ["1\n"]},
                    {"output_type": "display_data", "metadata": {},
                     "data": {"image/png": "iVBORw0KGgo=\n", "text/plain": ["<Figure>"]}},
                    {"output_type": "error", "ename": "ValueError", "evalue": "bad", "traceback": []}
                 ]},
                {"cell_type": "raw", "metadata": {}, "source": "\\newpage"}
            ]
        }))
        .unwrap();

        assert_eq!(notebook.len(), 3);
        assert_eq!(notebook.cells[0].source, "# Title\n**Authors:** A");
        assert_eq!(notebook.cells[0].kind, CellKind::Narrative);

        let code = &notebook.cells[1];
        assert_eq!(code.kind, CellKind::Code);
        assert_eq!(code.artifacts.len(), 3);
        assert_eq!(code.artifacts[0], Artifact::Text("1\n".into()));
        match &code.artifacts[1] {
            Artifact::Image(image) => {
                assert_eq!(image.representations.len(), 1);
                assert_eq!(image.representations[0].mime, ImageMime::Png);
            }
            other => panic!("expected image, got {:?}", other),
        }
        assert!(matches!(code.artifacts[2], Artifact::Error { .. }));

        assert_eq!(notebook.cells[2].kind, CellKind::Narrative);
    }

    #[test]
    fn test_markdown_attachments_make_mixed_cells() {
        let notebook = parse_value(json!({
            "nbformat": 4,
            "nbformat_minor": 4,
            "cells": [
                {"cell_type": "markdown", "metadata": {},
                 "source": "Setup ![b](attachment:b.png) then ![a](attachment:a.png)",
                 "attachments": {
                    "a.png": {"image/png": "AAAA"},
                    "b.png": {"image/png": "BBBB"}
                 }}
            ]
        }))
        .unwrap();

        let cell = &notebook.cells[0];
        assert_eq!(cell.kind, CellKind::Mixed);
        let names: Vec<_> = cell
            .images()
            .map(|(_, image)| image.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["b.png", "a.png"]);
    }

    #[test]
    fn test_unknown_cell_type_strict_and_lenient() {
        let value = json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "cells": [
                {"cell_type": "widget", "source": ""},
                {"cell_type": "markdown", "source": "kept"}
            ]
        });

        let result = parse_value(value.clone());
        assert!(matches!(result, Err(Error::NotebookParse(_))));

        let data = serde_json::to_vec(&value).unwrap();
        let notebook = NotebookParser::from_bytes_with_options(&data, ParseOptions::new().lenient())
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(notebook.len(), 1);
        assert_eq!(notebook.cells[0].index, 1);
    }

    #[test]
    fn test_rejects_non_notebook() {
        assert!(matches!(
            NotebookParser::from_bytes(b"not json"),
            Err(Error::UnknownFormat)
        ));
    }
}
