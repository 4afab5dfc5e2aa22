//! Interfaces for the tools that consume a converted paper.
//!
//! Compiling the LaTeX sources and publishing the output tree (to a git
//! remote, a collaborative editor, ...) happen outside this crate. Both
//! only ever see the output directory and its [`Manifest`].

use crate::convert::Manifest;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Compiles `main.tex` into a document.
pub trait MarkupCompiler {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Compile the main file, returning the produced document path.
    fn compile(&self, main: &Path) -> Result<PathBuf>;
}

/// Publishes an output directory somewhere else.
pub trait TreePublisher {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Publish the directory described by the manifest.
    fn publish(&self, output_dir: &Path, manifest: &Manifest) -> Result<()>;
}

/// Compile the main file of a conversion.
pub fn compile(manifest: &Manifest, compiler: &dyn MarkupCompiler) -> Result<PathBuf> {
    log::debug!("Compiling {} with {}", manifest.main_tex.display(), compiler.name());
    compiler
        .compile(&manifest.main_tex)
        .map_err(|e| wrap(compiler.name(), e))
}

/// Run publishers in order, stopping at the first failure.
pub fn publish_all(manifest: &Manifest, publishers: &[&dyn TreePublisher]) -> Result<()> {
    for publisher in publishers {
        log::debug!(
            "Publishing {} via {}",
            manifest.output_dir.display(),
            publisher.name()
        );
        publisher
            .publish(&manifest.output_dir, manifest)
            .map_err(|e| wrap(publisher.name(), e))?;
    }
    Ok(())
}

fn wrap(name: &str, error: Error) -> Error {
    match error {
        Error::Collaborator { .. } => error,
        other => Error::Collaborator {
            name: name.to_string(),
            reason: other.to_string(),
        },
    }
}
