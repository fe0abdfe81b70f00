//! Producer for pre-converted interchange JSON.

use crate::error::Result;
use crate::model::Document;
use std::path::Path;

use super::DocumentProducer;

/// Reads interchange JSON written by the upstream converter.
#[derive(Debug, Clone, Default)]
pub struct DoclingJsonProducer {
    _private: (),
}

impl DoclingJsonProducer {
    /// Create a new JSON producer.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentProducer for DoclingJsonProducer {
    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn name(&self) -> &str {
        "docling-json"
    }

    fn produce(&self, path: &Path) -> Result<Document> {
        Document::open(path)
    }

    fn produce_bytes(&self, bytes: &[u8]) -> Result<Document> {
        Document::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_produce_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(
            &path,
            r##"{"name": "doc", "body": {"self_ref": "#/body", "children": [{"$ref": "#/texts/0"}]},
                "texts": [{"self_ref": "#/texts/0", "label": "text", "text": "Hi"}]}"##,
        )
        .unwrap();

        let doc = DoclingJsonProducer::new().produce(&path).unwrap();
        assert_eq!(doc.texts[0].text, "Hi");
        assert_eq!(doc.body_refs().collect::<Vec<_>>(), vec!["#/texts/0"]);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = DoclingJsonProducer::new().produce_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_client_error());
    }
}
