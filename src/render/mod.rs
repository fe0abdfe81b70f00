//! Rendering module for converting documents to output formats.

mod boxes;
mod json;
mod markdown;
mod options;
mod result;

pub use boxes::{page_boxes, BoxEdges, ImageMetadata, PageBox};
pub use json::{to_json, JsonFormat};
pub use markdown::{table_to_markdown, to_markdown, to_markdown_with_stats, MarkdownRenderer};
pub use options::{PageSelection, RenderOptions, TableFallback};
pub use result::{ExtractionStats, RenderResult};
