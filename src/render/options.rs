//! Rendering options.

/// Options for rendering a document to LaTeX.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Template name; overrides the template chosen in the notebook
    pub template: Option<String>,

    /// Stem of the bibliography file referenced by `\bibliography`
    pub bibliography_name: String,

    /// Language given to `lstlisting` for code listings
    pub code_language: String,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template name.
    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    /// Set the bibliography file stem.
    pub fn with_bibliography_name(mut self, name: impl Into<String>) -> Self {
        self.bibliography_name = name.into();
        self
    }

    /// Set the code listing language.
    pub fn with_code_language(mut self, language: impl Into<String>) -> Self {
        self.code_language = language.into();
        self
    }

    /// File name of the bibliography (`<stem>.bib`).
    pub fn bibliography_file(&self) -> String {
        format!("{}.bib", self.bibliography_name)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            template: None,
            bibliography_name: "references".to_string(),
            code_language: "Python".to_string(),
        }
    }
}
