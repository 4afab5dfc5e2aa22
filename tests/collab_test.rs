//! Tests for the compiler and publisher seams.

use nbpaper::collab::{compile, publish_all, MarkupCompiler, TreePublisher};
use nbpaper::{convert, ConvertOptions, Error, Manifest, Result};
use serde_json::json;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct FakeCompiler;

impl MarkupCompiler for FakeCompiler {
    fn name(&self) -> &str {
        "fake-latex"
    }

    fn compile(&self, main: &Path) -> Result<PathBuf> {
        let source = fs::read_to_string(main)?;
        if !source.contains("\\end{document}") {
            return Err(Error::Other("unterminated document".into()));
        }
        let pdf = main.with_extension("pdf");
        fs::write(&pdf, b"%PDF-1.4")?;
        Ok(pdf)
    }
}

struct RecordingPublisher {
    name: &'static str,
    fail: bool,
    seen: RefCell<Vec<PathBuf>>,
}

impl RecordingPublisher {
    fn new(name: &'static str, fail: bool) -> Self {
        Self {
            name,
            fail,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl TreePublisher for RecordingPublisher {
    fn name(&self) -> &str {
        self.name
    }

    fn publish(&self, output_dir: &Path, manifest: &Manifest) -> Result<()> {
        assert_eq!(output_dir, manifest.output_dir);
        if self.fail {
            return Err(Error::Other("remote rejected push".into()));
        }
        self.seen.borrow_mut().push(output_dir.to_path_buf());
        Ok(())
    }
}

fn converted(dir: &Path) -> Manifest {
    let notebook = json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {},
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": "# Shared Paper\n**Author:** A. Researcher"},
            {"cell_type": "markdown", "metadata": {}, "source": "## Introduction\nHello."}
        ]
    });
    let input = dir.join("shared.ipynb");
    fs::write(&input, notebook.to_string()).unwrap();
    convert(&input, dir.join("out"), &ConvertOptions::default()).unwrap()
}

#[test]
fn test_compile_main_file() {
    let dir = TempDir::new().unwrap();
    let manifest = converted(dir.path());

    let pdf = compile(&manifest, &FakeCompiler).unwrap();
    assert_eq!(pdf, dir.path().join("out").join("main.pdf"));
    assert!(pdf.exists());
}

#[test]
fn test_publish_all_in_order() {
    let dir = TempDir::new().unwrap();
    let manifest = converted(dir.path());

    let git = RecordingPublisher::new("git", false);
    let editor = RecordingPublisher::new("editor", false);
    publish_all(&manifest, &[&git, &editor]).unwrap();

    assert_eq!(git.seen.borrow().len(), 1);
    assert_eq!(editor.seen.borrow()[0], manifest.output_dir);
}

#[test]
fn test_publish_stops_at_first_failure() {
    let dir = TempDir::new().unwrap();
    let manifest = converted(dir.path());

    let broken = RecordingPublisher::new("git", true);
    let editor = RecordingPublisher::new("editor", false);
    let err = publish_all(&manifest, &[&broken, &editor]).unwrap_err();

    match err {
        Error::Collaborator { name, reason } => {
            assert_eq!(name, "git");
            assert!(reason.contains("remote rejected push"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(editor.seen.borrow().is_empty());
}
