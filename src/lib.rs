//! # readorder
//!
//! Reading-order reconciliation for layout-analysed PDF documents.
//!
//! An upstream converter turns a PDF into a hierarchical document (texts,
//! pictures, tables and groups referencing each other by identifier). This
//! library flattens that hierarchy into a single editable order, tracks the
//! user's reordering and text edits, and rebuilds a valid document from them,
//! exported as interchange JSON and Markdown.
//!
//! ## Quick Start
//!
//! ```no_run
//! use readorder::{Readorder, SaveRequest};
//!
//! fn main() -> readorder::Result<()> {
//!     let mut session = Readorder::new().load("paper.json")?;
//!     println!("{:?}", session.reading_order().order);
//!
//!     session.apply_save(SaveRequest::new().with_text("#/texts/0", "A better title"));
//!     let export = session.export(&Default::default())?;
//!     println!("{}", export.markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Produce**: [`produce`] reads interchange JSON or runs the converter
//! - **Flatten**: [`order::flatten`] builds the flat index and ownership tables
//! - **Edit**: [`order::state`] seeds and saves the reading order
//! - **Reconstruct**: [`order::reconstruct`] rebuilds the root's children
//! - **Export**: [`export`] serializes, re-parses and renders Markdown

pub mod detect;
pub mod error;
pub mod export;
pub mod model;
pub mod order;
pub mod produce;
pub mod render;
pub mod session;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, InputFormat, PdfFormat};
pub use error::{Error, ExportStage, Result};
pub use export::{export, markdown_from_json, Export, ExportOptions, ExportPaths};
pub use model::{Document, GroupItem, Node, NodeKind, NodeRef, PictureItem, TableItem, TextItem, TextLabel};
pub use order::{FlatIndex, OwnershipTables, ReadingOrderState, ReconstructReport, Reconstruction, SaveRequest};
pub use produce::{DocumentProducer, ProducerOptions, ProducerRegistry};
pub use render::{JsonFormat, PageBox, PageSelection, RenderOptions, TableFallback};
pub use session::{page_order_file, write_order_dump, OrderSnapshot, Session, SessionStore, ALL_ORDERS_FILE};

use std::path::Path;

/// Load a document from a PDF or interchange JSON file.
///
/// PDFs are converted with the default converter command.
///
/// # Example
///
/// ```no_run
/// let doc = readorder::load_file("paper.json").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    ProducerRegistry::default().produce(path.as_ref())
}

/// Load a document from interchange JSON text.
pub fn load_json(json: &str) -> Result<Document> {
    Document::from_json(json)
}

/// Compute the initial reading order of a document.
///
/// # Example
///
/// ```no_run
/// let doc = readorder::load_file("paper.json").unwrap();
/// for id in readorder::reading_order(&doc).order {
///     println!("{}", id);
/// }
/// ```
pub fn reading_order(doc: &Document) -> ReadingOrderState {
    let (index, tables) = order::build(doc);
    order::seed(&index, &tables, doc)
}

/// Apply one save to a freshly seeded order and rebuild the document.
pub fn apply_edits(doc: &Document, edits: SaveRequest) -> Reconstruction {
    let mut session = Session::new(doc.clone());
    session.apply_save(edits);
    session.reconstruct()
}

/// Render a document file to Markdown without edits.
///
/// # Example
///
/// ```no_run
/// let markdown = readorder::to_markdown("paper.json").unwrap();
/// std::fs::write("paper.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = load_file(path)?;
    render::to_markdown(&doc, &RenderOptions::default())
}

/// Builder for loading, editing and exporting documents.
///
/// # Example
///
/// ```no_run
/// use readorder::{Readorder, SaveRequest, TableFallback};
///
/// let export = Readorder::new()
///     .with_converter("/opt/docling/bin/docling")
///     .with_table_fallback(TableFallback::Html)
///     .with_frontmatter()
///     .export_file("paper.pdf", Some(SaveRequest::new().with_order(["#/texts/1", "#/texts/0"])))?;
/// println!("{}", export.markdown);
/// # Ok::<(), readorder::Error>(())
/// ```
pub struct Readorder {
    producer_options: ProducerOptions,
    export_options: ExportOptions,
}

impl Readorder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            producer_options: ProducerOptions::default(),
            export_options: ExportOptions::default(),
        }
    }

    /// Set the converter executable used for PDFs.
    pub fn with_converter(mut self, executable: impl Into<std::path::PathBuf>) -> Self {
        self.producer_options = self.producer_options.with_executable(executable);
        self
    }

    /// Set producer options.
    pub fn with_producer_options(mut self, options: ProducerOptions) -> Self {
        self.producer_options = options;
        self
    }

    /// Set Markdown rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.export_options.render = options;
        self
    }

    /// Enable frontmatter in the Markdown.
    pub fn with_frontmatter(mut self) -> Self {
        self.export_options.render = self.export_options.render.with_frontmatter(true);
        self
    }

    /// Set table fallback mode.
    pub fn with_table_fallback(mut self, fallback: TableFallback) -> Self {
        self.export_options.render = self.export_options.render.with_table_fallback(fallback);
        self
    }

    /// Set the JSON layout.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.export_options.json_format = format;
        self
    }

    /// Export options in effect.
    pub fn export_options(&self) -> &ExportOptions {
        &self.export_options
    }

    /// Load a file into a new session.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Session> {
        let path = path.as_ref();
        let registry = ProducerRegistry::with_defaults(self.producer_options.clone());
        let document = registry.produce(path)?;
        Ok(Session::new(document).with_source(path))
    }

    /// Load a file, apply optional edits and export it.
    pub fn export_file<P: AsRef<Path>>(&self, path: P, edits: Option<SaveRequest>) -> Result<Export> {
        let mut session = self.load(path)?;
        if let Some(edits) = edits {
            session.apply_save(edits);
        }
        session.export(&self.export_options)
    }
}

impl Default for Readorder {
    fn default() -> Self {
        Self::new()
    }
}
