//! Notebook format detection and validation.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Lowest nbformat major version the loader understands.
pub const MIN_NBFORMAT: u64 = 4;

/// Notebook format information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotebookFormat {
    /// nbformat major version (e.g. 4)
    pub major: u32,
    /// nbformat minor version (e.g. 5)
    pub minor: u32,
}

impl std::fmt::Display for NotebookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nbformat {}.{}", self.major, self.minor)
    }
}

/// Detect the notebook format of a file.
///
/// # Example
/// ```no_run
/// use nbpaper::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("analysis.ipynb").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<NotebookFormat> {
    let data = fs::read(path)?;
    detect_format_from_bytes(&data)
}

/// Detect the notebook format from raw file content.
///
/// # Returns
/// * `Ok(NotebookFormat)` if the data is a notebook with nbformat >= 4
/// * `Err(Error::UnsupportedNotebook)` for older notebooks
/// * `Err(Error::UnknownFormat)` if the data is not a notebook at all
pub fn detect_format_from_bytes(data: &[u8]) -> Result<NotebookFormat> {
    let value: Value = serde_json::from_slice(data).map_err(|_| Error::UnknownFormat)?;
    detect_format_from_value(&value)
}

/// Detect the notebook format from an already parsed JSON document.
pub fn detect_format_from_value(value: &Value) -> Result<NotebookFormat> {
    let object = value.as_object().ok_or(Error::UnknownFormat)?;
    let major = object
        .get("nbformat")
        .and_then(Value::as_u64)
        .ok_or(Error::UnknownFormat)?;
    let minor = object
        .get("nbformat_minor")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    if major < MIN_NBFORMAT {
        return Err(Error::UnsupportedNotebook(format!(
            "nbformat {}.{}",
            major, minor
        )));
    }

    Ok(NotebookFormat {
        major: major as u32,
        minor: minor as u32,
    })
}

/// Check whether the bytes hold a supported notebook.
pub fn is_notebook_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Check whether a path has the `.ipynb` extension.
pub fn has_notebook_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("ipynb"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_v4() {
        let data = br#"{"nbformat": 4, "nbformat_minor": 5, "cells": []}"#;
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format.major, 4);
        assert_eq!(format.minor, 5);
        assert_eq!(format.to_string(), "nbformat 4.5");
    }

    #[test]
    fn test_detect_v3_rejected() {
        let data = br#"{"nbformat": 3, "nbformat_minor": 0, "worksheets": []}"#;
        let result = detect_format_from_bytes(data);
        assert!(matches!(result, Err(Error::UnsupportedNotebook(_))));
    }

    #[test]
    fn test_detect_not_json() {
        assert!(matches!(
            detect_format_from_bytes(b"%PDF-1.7"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(
            detect_format_from_bytes(b"[1, 2, 3]"),
            Err(Error::UnknownFormat)
        ));
        assert!(!is_notebook_bytes(b""));
    }

    #[test]
    fn test_extension() {
        assert!(has_notebook_extension("paper.ipynb"));
        assert!(has_notebook_extension("PAPER.IPYNB"));
        assert!(!has_notebook_extension("paper.md"));
        assert!(!has_notebook_extension("paper"));
    }
}
