//! Document model types for the layout-analysed interchange format.
//!
//! The model mirrors the hierarchical JSON emitted by the upstream layout
//! converter: a `body` root whose children reference nodes stored in the
//! `texts`, `pictures`, `tables` and `groups` collections by identifier.
//! Fields the engine does not interpret are kept verbatim so that a
//! document survives a load/store cycle unchanged.

mod document;
mod node;
mod table;

pub use document::{Document, PageItem, DOCUMENT_SCHEMA_NAME, DOCUMENT_SCHEMA_VERSION};
pub use node::{
    BoundingBox, CoordOrigin, GroupItem, ImageRef, Node, NodeKind, NodeRef, PictureItem,
    Provenance, Size, TextItem, TextLabel,
};
pub use table::{TableCell, TableData, TableItem};
