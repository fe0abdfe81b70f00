//! Error types for readorder library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for readorder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Export stage that failed during the JSON/Markdown round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    /// Serializing the reconstructed document to interchange JSON.
    Serialize,
    /// Parsing the serialized JSON back into a document.
    Reparse,
    /// Rendering the re-parsed document to Markdown.
    Markdown,
}

impl std::fmt::Display for ExportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportStage::Serialize => "serialize",
            ExportStage::Reparse => "reparse",
            ExportStage::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

/// Error types that can occur while loading, editing or exporting documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The interchange JSON could not be read.
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is neither a PDF nor an interchange JSON document.
    #[error("Unknown file format: expected a PDF or a document JSON file")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// No producer is registered for the input.
    #[error("No document producer for extension: {0}")]
    NoProducer(String),

    /// The upstream layout converter failed on the input file.
    #[error("Upstream conversion failed for {}: {message}", path.display())]
    UpstreamParse {
        /// Input file handed to the converter
        path: PathBuf,
        /// Converter diagnostics
        message: String,
    },

    /// A state-dependent operation was invoked before any upload.
    #[error("No document loaded: upload a PDF first")]
    NoDocumentLoaded,

    /// Page number is out of range (zero-based page, page count).
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// One stage of the export round trip failed.
    #[error("Export failed during {stage}: {message}")]
    Export {
        /// Stage that failed
        stage: ExportStage,
        /// Underlying cause
        message: String,
    },

    /// Rendering error.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Session lock was poisoned by a panicking writer.
    #[error("Session lock poisoned")]
    LockPoisoned,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Json(_)
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::NoProducer(_)
        )
    }
}
