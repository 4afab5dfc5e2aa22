//! Notebook loading module.

mod notebook;
mod options;

pub use notebook::NotebookParser;
pub use options::{ErrorMode, ParseOptions};
