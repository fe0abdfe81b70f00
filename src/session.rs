//! The active document and its reading-order state.
//!
//! One [`Session`] holds everything derived from a single upload. The
//! [`SessionStore`] owns at most one session behind a read/write lock: loads
//! replace the session wholesale, saves mutate it, every other operation
//! reads it.

use crate::error::{Error, Result};
use crate::export::{export, Export, ExportOptions};
use crate::model::Document;
use crate::order::{build, reconstruct, seed, FlatIndex, OwnershipTables, ReadingOrderState, Reconstruction, SaveRequest};
use crate::render::{page_boxes, PageBox};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// File name of the order snapshot written after each save.
pub const SNAPSHOT_FILE: &str = "reading_order.json";

/// File name of the combined per-page order dump.
pub const ALL_ORDERS_FILE: &str = "all_reading_orders.json";

/// File name of one page's order dump.
pub fn page_order_file(page: u32) -> String {
    format!("reading_order_{}.json", page)
}

/// Write a client-supplied order payload verbatim as pretty JSON.
///
/// Page-scoped editors post their own order shape; it is stored, not
/// interpreted, and never touches the active session.
pub fn write_order_dump(dir: &Path, file_name: &str, payload: &serde_json::Value) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, serde_json::to_string_pretty(payload)?)?;
    log::debug!("Wrote order dump {}", path.display());
    Ok(path)
}

/// A loaded document with its index and editable state.
#[derive(Debug, Clone)]
pub struct Session {
    document: Document,
    index: FlatIndex,
    tables: OwnershipTables,
    state: ReadingOrderState,
    source: Option<PathBuf>,
    loaded_at: DateTime<Utc>,
}

impl Session {
    /// Build the index and seed the state for a freshly parsed document.
    pub fn new(document: Document) -> Self {
        let (index, tables) = build(&document);
        let state = seed(&index, &tables, &document);
        Self {
            document,
            index,
            tables,
            state,
            source: None,
            loaded_at: Utc::now(),
        }
    }

    /// Record the file the document was produced from.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// The original document, as parsed.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Flat index of the original document.
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Ownership tables of the original document.
    pub fn tables(&self) -> &OwnershipTables {
        &self.tables
    }

    /// Current reading order and text overrides.
    pub fn reading_order(&self) -> &ReadingOrderState {
        &self.state
    }

    /// Source file, when known.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// When the document was loaded.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.document.page_count()
    }

    /// Boxes of a zero-based page.
    pub fn page_boxes(&self, page: u32) -> Result<Vec<PageBox>> {
        page_boxes(&self.document, page)
    }

    /// Apply a save request to the state.
    pub fn apply_save(&mut self, request: SaveRequest) {
        let order_len = request.order.as_ref().map(Vec::len);
        let texts_len = request.texts.as_ref().map(IndexMap::len);
        self.state.apply_save(request);
        log::info!(
            "Saved reading order (order: {}, texts: {})",
            order_len.map_or_else(|| "unchanged".to_string(), |n| format!("{} ids", n)),
            texts_len.map_or_else(|| "unchanged".to_string(), |n| format!("{} overrides", n)),
        );
    }

    /// Rebuild the document from the current state.
    pub fn reconstruct(&self) -> Reconstruction {
        reconstruct(&self.state, &self.document, &self.tables)
    }

    /// Reconstruct and run the export pipeline.
    pub fn export(&self, options: &ExportOptions) -> Result<Export> {
        export(&self.reconstruct().document, options)
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            saved_at: Utc::now(),
            order: self.state.order.clone(),
            texts: self.state.text_overrides.clone(),
        }
    }
}

/// Durable copy of the reading-order state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Time of the save
    pub saved_at: DateTime<Utc>,
    /// Saved order
    pub order: Vec<String>,
    /// Saved text overrides
    pub texts: IndexMap<String, String>,
}

impl OrderSnapshot {
    /// Write the snapshot to `dir/reading_order.json`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(SNAPSHOT_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Read a snapshot back.
    pub fn read_from(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Save request restoring this snapshot.
    pub fn to_save_request(&self) -> SaveRequest {
        SaveRequest {
            order: Some(self.order.clone()),
            texts: Some(self.texts.clone()),
        }
    }
}

/// Holder of the single active session.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active session.
    pub fn load(&self, session: Session) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| Error::LockPoisoned)?;
        log::info!(
            "Loaded document '{}': {} pages, {} ordered identifiers",
            session.document.name,
            session.page_count(),
            session.index.len()
        );
        *guard = Some(session);
        Ok(())
    }

    /// Whether a document is loaded.
    pub fn is_loaded(&self) -> Result<bool> {
        let guard = self.inner.read().map_err(|_| Error::LockPoisoned)?;
        Ok(guard.is_some())
    }

    /// Drop the active session.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| Error::LockPoisoned)?;
        *guard = None;
        Ok(())
    }

    /// Run a read-only operation against the active session.
    pub fn read<R>(&self, f: impl FnOnce(&Session) -> Result<R>) -> Result<R> {
        let guard = self.inner.read().map_err(|_| Error::LockPoisoned)?;
        let session = guard.as_ref().ok_or(Error::NoDocumentLoaded)?;
        f(session)
    }

    /// Run a mutating operation against the active session.
    pub fn write<R>(&self, f: impl FnOnce(&mut Session) -> Result<R>) -> Result<R> {
        let mut guard = self.inner.write().map_err(|_| Error::LockPoisoned)?;
        let session = guard.as_mut().ok_or(Error::NoDocumentLoaded)?;
        f(session)
    }

    /// Apply a save and return the resulting snapshot.
    pub fn save(&self, request: SaveRequest) -> Result<OrderSnapshot> {
        self.write(|session| {
            session.apply_save(request);
            Ok(session.snapshot())
        })
    }

    /// Current reading order.
    pub fn reading_order(&self) -> Result<ReadingOrderState> {
        self.read(|session| Ok(session.reading_order().clone()))
    }

    /// Reconstruct and export the active document.
    pub fn export(&self, options: &ExportOptions) -> Result<Export> {
        self.read(|session| session.export(options))
    }
}
