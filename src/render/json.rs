//! JSON rendering of the document model.

use crate::error::{Error, Result};
use crate::model::DocumentModel;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document model to JSON.
pub fn to_json(doc: &DocumentModel, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BodyItem, PaperMetadata, Section, TextSpan};

    fn document() -> DocumentModel {
        let mut doc = DocumentModel::new(PaperMetadata::new("Test", vec!["A".into()]));
        let mut section = Section::new("Introduction", 0);
        section.push(BodyItem::Text(TextSpan {
            cell_index: 1,
            text: "Hello".into(),
        }));
        doc.sections.push(section);
        doc
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&document(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\""));
        assert!(json.contains("\"introduction\""));
        assert!(json.contains("\"type\": \"text\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact_round_trips() {
        let doc = document();
        let json = to_json(&doc, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        let back: DocumentModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
