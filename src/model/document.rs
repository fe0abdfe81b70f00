//! Document-level types.

use super::{GroupItem, Node, NodeKind, NodeRef, PictureItem, Size, TableData, TableItem, TextItem, TextLabel};
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Schema name written by the upstream converter.
pub const DOCUMENT_SCHEMA_NAME: &str = "DoclingDocument";

/// Schema version used for documents built in memory.
pub const DOCUMENT_SCHEMA_VERSION: &str = "1.3.0";

/// Identifier of the document root.
const BODY_REF: &str = "#/body";

/// A layout-analysed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Schema name
    #[serde(default = "default_schema_name")]
    pub schema_name: String,

    /// Schema version
    #[serde(default)]
    pub version: String,

    /// Document name (usually the source file stem)
    #[serde(default)]
    pub name: String,

    /// Root node; its children define the top-level order
    pub body: GroupItem,

    /// Group nodes
    #[serde(default)]
    pub groups: Vec<GroupItem>,

    /// Text nodes
    #[serde(default)]
    pub texts: Vec<TextItem>,

    /// Picture nodes
    #[serde(default)]
    pub pictures: Vec<PictureItem>,

    /// Table nodes
    #[serde(default)]
    pub tables: Vec<TableItem>,

    /// Page table keyed by page number
    #[serde(default)]
    pub pages: IndexMap<String, PageItem>,

    /// Unrecognised fields (`origin`, `furniture`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_schema_name() -> String {
    DOCUMENT_SCHEMA_NAME.to_string()
}

/// A page entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageItem {
    /// Page number (1-indexed)
    pub page_no: u32,

    /// Page size in points
    #[serde(default)]
    pub size: Size,

    /// Unrecognised fields (e.g. `image`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Create a new empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema_name: default_schema_name(),
            version: DOCUMENT_SCHEMA_VERSION.to_string(),
            name: name.into(),
            body: GroupItem::new(BODY_REF, "_root_", "unspecified"),
            groups: Vec::new(),
            texts: Vec::new(),
            pictures: Vec::new(),
            tables: Vec::new(),
            pages: IndexMap::new(),
            extra: Map::new(),
        }
    }

    /// Parse a document from interchange JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a document from interchange JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parse a document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a document from an interchange JSON file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Top-level references in document order.
    pub fn body_refs(&self) -> impl Iterator<Item = &str> {
        self.body.children.iter().map(NodeRef::id)
    }

    /// Resolve an identifier to its node.
    ///
    /// Pointer-style identifiers (`#/texts/3`) resolve directly; anything
    /// else falls back to a scan of every collection.
    pub fn node(&self, id: &str) -> Option<Node<'_>> {
        if let Some((kind, index)) = NodeKind::parse_pointer(id) {
            let direct = match kind {
                NodeKind::Text => self.texts.get(index).map(Node::Text),
                NodeKind::Picture => self.pictures.get(index).map(Node::Picture),
                NodeKind::Table => self.tables.get(index).map(Node::Table),
                NodeKind::Group => self.groups.get(index).map(Node::Group),
            };
            if let Some(node) = direct.filter(|n| n.self_ref() == id) {
                return Some(node);
            }
        }
        self.nodes().find(|n| n.self_ref() == id)
    }

    /// Whether the identifier names a node of this document.
    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Kind of the node with the given identifier.
    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind())
    }

    /// All nodes, collection by collection.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        self.texts
            .iter()
            .map(Node::Text)
            .chain(self.pictures.iter().map(Node::Picture))
            .chain(self.tables.iter().map(Node::Table))
            .chain(self.groups.iter().map(Node::Group))
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        let from_table = self.pages.values().map(|p| p.page_no).max().unwrap_or(0);
        let from_prov = self
            .nodes()
            .flat_map(|n| n.prov().iter().map(|p| p.page_no))
            .max()
            .unwrap_or(0);
        (self.pages.len() as u32).max(from_table).max(from_prov)
    }

    /// Check if the document has no content nodes.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.pictures.is_empty() && self.tables.is_empty()
    }

    /// Register a page.
    pub fn add_page(&mut self, page_no: u32, size: Size) {
        self.pages.insert(
            page_no.to_string(),
            PageItem {
                page_no,
                size,
                extra: Map::new(),
            },
        );
    }

    /// Add a text node and return its identifier.
    pub fn add_text(&mut self, label: TextLabel, text: impl Into<String>) -> String {
        let id = format!("#/texts/{}", self.texts.len());
        self.texts.push(TextItem::new(id.clone(), label, text));
        id
    }

    /// Add a picture node owning the given caption texts.
    pub fn add_picture(&mut self, captions: &[&str]) -> String {
        let id = format!("#/pictures/{}", self.pictures.len());
        let mut picture = PictureItem::new(id.clone());
        picture.captions = captions.iter().map(|c| NodeRef::new(*c)).collect();
        picture.children = picture.captions.clone();
        self.pictures.push(picture);
        self.adopt(&id, captions);
        id
    }

    /// Add a table node owning the given caption texts.
    pub fn add_table(&mut self, data: TableData, captions: &[&str]) -> String {
        let id = format!("#/tables/{}", self.tables.len());
        let mut table = TableItem::new(id.clone(), data);
        table.captions = captions.iter().map(|c| NodeRef::new(*c)).collect();
        table.children = table.captions.clone();
        self.tables.push(table);
        self.adopt(&id, captions);
        id
    }

    /// Add a group owning the given members.
    pub fn add_group(&mut self, label: &str, members: &[&str]) -> String {
        let id = format!("#/groups/{}", self.groups.len());
        let mut group = GroupItem::new(id.clone(), label, label);
        group.children = members.iter().map(|m| NodeRef::new(*m)).collect();
        self.groups.push(group);
        self.adopt(&id, members);
        id
    }

    /// Append a reference to the root's children.
    pub fn push_body(&mut self, id: &str) {
        self.body.children.push(NodeRef::new(id));
        self.set_parent(id, BODY_REF);
    }

    fn adopt(&mut self, parent: &str, members: &[&str]) {
        for member in members {
            self.set_parent(member, parent);
        }
    }

    fn set_parent(&mut self, id: &str, parent: &str) {
        let parent = Some(NodeRef::new(parent));
        if let Some(t) = self.texts.iter_mut().find(|t| t.self_ref == id) {
            t.parent = parent;
        } else if let Some(p) = self.pictures.iter_mut().find(|p| p.self_ref == id) {
            p.parent = parent;
        } else if let Some(t) = self.tables.iter_mut().find(|t| t.self_ref == id) {
            t.parent = parent;
        } else if let Some(g) = self.groups.iter_mut().find(|g| g.self_ref == id) {
            g.parent = parent;
        }
    }
}
