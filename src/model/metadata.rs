//! Paper-level metadata.

use crate::render::TemplateId;
use serde::{Deserialize, Serialize};

/// Title block information of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    /// Paper title
    pub title: String,

    /// Authors in byline order (never empty)
    pub authors: Vec<String>,

    /// Institution or affiliation
    pub institution: Option<String>,

    /// Keywords, duplicates removed
    pub keywords: Vec<String>,

    /// Template chosen in the notebook (baseline when absent)
    pub template: TemplateId,
}

impl PaperMetadata {
    /// Create metadata with a title and authors.
    pub fn new(title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            title: title.into(),
            authors,
            institution: None,
            keywords: Vec::new(),
            template: TemplateId::default(),
        }
    }

    /// Set the institution.
    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    /// Set the template.
    pub fn with_template(mut self, template: TemplateId) -> Self {
        self.template = template;
        self
    }

    /// Add a keyword unless an equal one (ignoring case) is present.
    pub fn add_keyword(&mut self, keyword: impl Into<String>) {
        let keyword = keyword.into();
        if keyword.is_empty() || self.has_keyword(&keyword) {
            return;
        }
        self.keywords.push(keyword);
    }

    /// Check for a keyword, ignoring case.
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| k.to_lowercase() == keyword.to_lowercase())
    }

    /// Authors joined for display ("A, B and C").
    pub fn byline(&self) -> String {
        match self.authors.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [init @ .., last] => format!("{} and {}", init.join(", "), last),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_dedupe() {
        let mut meta = PaperMetadata::new("T", vec!["A".into()]);
        meta.add_keyword("acoustics");
        meta.add_keyword("Acoustics");
        meta.add_keyword("");
        meta.add_keyword("perception");
        assert_eq!(meta.keywords, vec!["acoustics", "perception"]);
        assert!(meta.has_keyword("PERCEPTION"));
    }

    #[test]
    fn test_byline() {
        let meta = PaperMetadata::new("T", vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(meta.byline(), "A, B and C");
        let meta = PaperMetadata::new("T", vec!["A. Researcher".into()]);
        assert_eq!(meta.byline(), "A. Researcher");
    }
}
