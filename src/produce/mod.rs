//! Document producers: turn an uploaded file into a [`Document`].
//!
//! Layout analysis itself is delegated. A producer either reads interchange
//! JSON that was converted elsewhere, or runs an external converter on a PDF
//! and loads what it writes. Producers are registered by extension and
//! dispatched by the registry.
//!
//! # Example
//!
//! ```no_run
//! use readorder::produce::{ProducerOptions, ProducerRegistry};
//! use std::path::Path;
//!
//! fn main() -> readorder::Result<()> {
//!     let registry = ProducerRegistry::with_defaults(ProducerOptions::default());
//!     let doc = registry.produce(Path::new("paper.pdf"))?;
//!     println!("{} pages", doc.page_count());
//!     Ok(())
//! }
//! ```

mod command;
mod json;

pub use command::DoclingCommandProducer;
pub use json::DoclingJsonProducer;

use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::Document;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for the external converter.
#[derive(Debug, Clone)]
pub struct ProducerOptions {
    /// Converter executable
    pub executable: PathBuf,

    /// Ask the converter to embed picture data in the JSON
    pub embed_images: bool,

    /// Extra arguments appended to the converter command line
    pub extra_args: Vec<String>,
}

impl ProducerOptions {
    /// Create new producer options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the converter executable.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Enable or disable embedded picture data.
    pub fn with_embedded_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }

    /// Append an extra converter argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

impl Default for ProducerOptions {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("docling"),
            embed_images: true,
            extra_args: Vec::new(),
        }
    }
}

/// Trait for document producers.
///
/// Implement this trait to support another upstream source.
pub trait DocumentProducer: Send + Sync {
    /// Supported file extensions, lowercase without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    /// Name of this producer.
    fn name(&self) -> &str;

    /// Produce a document from a file.
    fn produce(&self, path: &Path) -> Result<Document>;

    /// Produce a document from in-memory bytes.
    ///
    /// The default spools the bytes to a temporary file carrying the
    /// producer's first extension.
    fn produce_bytes(&self, bytes: &[u8]) -> Result<Document> {
        let ext = self.supported_extensions().first().copied().unwrap_or("bin");
        let mut file = tempfile::Builder::new()
            .prefix("readorder-upload-")
            .suffix(&format!(".{}", ext))
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        self.produce(file.path())
    }

    /// Check if this producer supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for document producers.
pub struct ProducerRegistry {
    producers: HashMap<String, Arc<dyn DocumentProducer>>,
    by_name: HashMap<String, Arc<dyn DocumentProducer>>,
}

impl ProducerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            producers: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the JSON reader and the external converter.
    pub fn with_defaults(options: ProducerOptions) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DoclingJsonProducer::new()));
        registry.register(Arc::new(DoclingCommandProducer::new(options)));
        registry
    }

    /// Register a producer for all its supported extensions.
    pub fn register(&mut self, producer: Arc<dyn DocumentProducer>) {
        for ext in producer.supported_extensions() {
            self.producers.insert(ext.to_lowercase(), producer.clone());
        }
        self.by_name.insert(producer.name().to_lowercase(), producer);
    }

    /// Get a producer by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentProducer>> {
        self.producers.get(&ext.to_lowercase()).cloned()
    }

    /// Get a producer by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentProducer>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.producers.contains_key(&ext.to_lowercase())
    }

    /// All supported extensions.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.producers.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    /// Produce a document from a file.
    ///
    /// Dispatches on the extension, falling back to the file's magic bytes
    /// when the extension is missing or unknown.
    pub fn produce(&self, path: &Path) -> Result<Document> {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if self.supports(ext) => ext.to_string(),
            _ => detect_format_from_path(path)?.extension().to_string(),
        };
        let producer = self
            .get_by_extension(&ext)
            .ok_or_else(|| Error::NoProducer(ext.clone()))?;

        log::info!("Producing document from {} with {}", path.display(), producer.name());
        let mut doc = producer.produce(path)?;
        if doc.name.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                doc.name = stem.to_string();
            }
        }
        Ok(doc)
    }

    /// Produce a document from uploaded bytes.
    pub fn produce_bytes(&self, bytes: &[u8], file_name: Option<&str>) -> Result<Document> {
        let from_name = file_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .filter(|e| self.supports(e));
        let ext = match from_name {
            Some(ext) => ext.to_string(),
            None => detect_format_from_bytes(bytes)?.extension().to_string(),
        };
        let producer = self
            .get_by_extension(&ext)
            .ok_or_else(|| Error::NoProducer(ext.clone()))?;

        log::info!(
            "Producing document from {} uploaded bytes with {}",
            bytes.len(),
            producer.name()
        );
        let mut doc = producer.produce_bytes(bytes)?;
        if doc.name.is_empty() {
            if let Some(stem) = file_name.and_then(|n| Path::new(n).file_stem()).and_then(|s| s.to_str()) {
                doc.name = stem.to_string();
            }
        }
        Ok(doc)
    }
}

impl Default for ProducerRegistry {
    fn default() -> Self {
        Self::with_defaults(ProducerOptions::default())
    }
}
