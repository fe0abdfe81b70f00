//! Export pipeline: reconstructed document → JSON → re-parsed document → Markdown.
//!
//! The Markdown is always rendered from the re-parsed JSON, never from the
//! in-memory document, so both artifacts derive from the same bytes.

use crate::error::{Error, ExportStage, Result};
use crate::model::Document;
use crate::render::{to_json, to_markdown, JsonFormat, RenderOptions};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the exported interchange JSON.
pub const EXPORT_JSON_FILE: &str = "complete_edited.json";

/// File name of the exported Markdown.
pub const EXPORT_MARKDOWN_FILE: &str = "complete_edited.md";

/// Export options.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// JSON layout
    pub json_format: JsonFormat,

    /// Markdown rendering options
    pub render: RenderOptions,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JSON layout.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set the Markdown rendering options.
    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }
}

/// Output of the export pipeline.
#[derive(Debug, Clone)]
pub struct Export {
    /// Interchange JSON
    pub json: String,

    /// Markdown rendered from the re-parsed JSON
    pub markdown: String,

    /// The re-parsed document
    pub document: Document,
}

/// Paths written by [`Export::write_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    /// JSON file
    pub json_path: PathBuf,

    /// Markdown file
    pub markdown_path: PathBuf,
}

impl Export {
    /// Write both artifacts into `dir`, overwriting earlier exports.
    pub fn write_to(&self, dir: &Path) -> Result<ExportPaths> {
        fs::create_dir_all(dir)?;
        let paths = ExportPaths {
            json_path: dir.join(EXPORT_JSON_FILE),
            markdown_path: dir.join(EXPORT_MARKDOWN_FILE),
        };
        fs::write(&paths.json_path, &self.json)?;
        fs::write(&paths.markdown_path, &self.markdown)?;

        log::info!(
            "Wrote {} and {}",
            paths.json_path.display(),
            paths.markdown_path.display()
        );
        Ok(paths)
    }
}

/// Run the two-stage export on a reconstructed document.
pub fn export(doc: &Document, options: &ExportOptions) -> Result<Export> {
    let json = to_json(doc, options.json_format).map_err(|e| stage_error(ExportStage::Serialize, e))?;
    let document = Document::from_json(&json).map_err(|e| stage_error(ExportStage::Reparse, e))?;
    let markdown = markdown_from_document(&document, &options.render)?;

    log::debug!(
        "Exported {} bytes of JSON and {} bytes of Markdown",
        json.len(),
        markdown.len()
    );

    Ok(Export {
        json,
        markdown,
        document,
    })
}

/// Render Markdown from arbitrary interchange JSON.
pub fn markdown_from_json(json: &str, options: &RenderOptions) -> Result<String> {
    let document = Document::from_json(json).map_err(|e| stage_error(ExportStage::Reparse, e))?;
    markdown_from_document(&document, options)
}

fn markdown_from_document(doc: &Document, options: &RenderOptions) -> Result<String> {
    to_markdown(doc, options).map_err(|e| stage_error(ExportStage::Markdown, e))
}

fn stage_error(stage: ExportStage, err: Error) -> Error {
    let message = match err {
        Error::Json(e) => e.to_string(),
        Error::Render(message) => message,
        other => other.to_string(),
    };
    Error::Export { stage, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextLabel;
    use crate::order::{build, reconstruct, seed, SaveRequest};

    #[test]
    fn test_export_round_trip() {
        let mut doc = Document::new("report");
        let title = doc.add_text(TextLabel::Title, "Report");
        let body = doc.add_text(TextLabel::Text, "Body text.");
        doc.push_body(&title);
        doc.push_body(&body);

        let (index, tables) = build(&doc);
        let mut state = seed(&index, &tables, &doc);
        state.apply_save(
            SaveRequest::new()
                .with_order([body.as_str(), title.as_str()])
                .with_text(&body, "Edited."),
        );
        let rebuilt = reconstruct(&state, &doc, &tables);

        let out = export(&rebuilt.document, &ExportOptions::new()).unwrap();
        assert_eq!(out.markdown, "Edited.\n\n# Report");
        assert_eq!(out.document, rebuilt.document);
        assert!(out.json.contains("\"text\": \"Edited.\""));
    }

    #[test]
    fn test_markdown_from_invalid_json() {
        let err = markdown_from_json("{\"name\": \"no body\"}", &RenderOptions::new()).unwrap_err();
        match err {
            Error::Export { stage, message } => {
                assert_eq!(stage, ExportStage::Reparse);
                assert!(message.contains("body"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::new("empty");
        let out = export(&doc, &ExportOptions::new()).unwrap();

        let paths = out.write_to(&dir.path().join("nested")).unwrap();
        assert!(paths.json_path.ends_with(EXPORT_JSON_FILE));
        let written = std::fs::read_to_string(&paths.json_path).unwrap();
        assert_eq!(Document::from_json(&written).unwrap(), doc);
        assert_eq!(std::fs::read_to_string(&paths.markdown_path).unwrap(), "");
    }
}
