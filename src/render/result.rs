//! Rendering result with statistics.

use super::TemplateId;
use crate::error::Warning;
use serde::{Deserialize, Serialize};

/// Result of rendering a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// LaTeX source of `main.tex`
    pub markup: String,

    /// BibTeX source
    pub bibliography: String,

    /// Template actually used
    pub template: TemplateId,

    /// Set when the requested template was unknown
    pub fallback: Option<Warning>,

    /// Counts collected while rendering
    pub stats: RenderStats,
}

impl RenderOutput {
    /// Get the markup length in bytes.
    pub fn markup_len(&self) -> usize {
        self.markup.len()
    }
}

/// Statistics collected during rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Sections with a heading
    pub section_count: u32,

    /// Display equations
    pub equation_count: u32,

    /// Figure environments
    pub figure_count: u32,

    /// Code listings
    pub listing_count: u32,

    /// Bibliography entries
    pub citation_count: u32,

    /// Approximate word count of the narrative text
    pub word_count: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the word count of a text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &RenderStats) {
        self.section_count += other.section_count;
        self.equation_count += other.equation_count;
        self.figure_count += other.figure_count;
        self.listing_count += other.listing_count;
        self.citation_count += other.citation_count;
        self.word_count += other.word_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_text_and_merge() {
        let mut stats = RenderStats::new();
        stats.count_text("Hello, world! This is a test.");
        assert_eq!(stats.word_count, 6);

        let other = RenderStats {
            figure_count: 2,
            ..Default::default()
        };
        stats.merge(&other);
        assert_eq!(stats.figure_count, 2);
        assert_eq!(stats.word_count, 6);
    }
}
