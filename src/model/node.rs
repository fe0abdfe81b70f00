//! Node-level types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TableItem;

/// Reference to another node, serialized as `{"$ref": "#/texts/0"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Identifier of the referenced node
    #[serde(rename = "$ref")]
    pub cref: String,
}

impl NodeRef {
    /// Create a reference to the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self { cref: id.into() }
    }

    /// Identifier this reference points to.
    pub fn id(&self) -> &str {
        &self.cref
    }
}

/// Kind of a node, fixed by the collection it was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry of `texts`
    Text,
    /// Entry of `pictures`
    Picture,
    /// Entry of `tables`
    Table,
    /// Entry of `groups`
    Group,
}

impl NodeKind {
    /// Name of the document collection holding nodes of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            NodeKind::Text => "texts",
            NodeKind::Picture => "pictures",
            NodeKind::Table => "tables",
            NodeKind::Group => "groups",
        }
    }

    /// Split a pointer-style identifier (`#/tables/2`) into kind and slot.
    pub fn parse_pointer(id: &str) -> Option<(NodeKind, usize)> {
        let rest = id.strip_prefix("#/")?;
        let (collection, index) = rest.split_once('/')?;
        let kind = match collection {
            "texts" => NodeKind::Text,
            "pictures" => NodeKind::Picture,
            "tables" => NodeKind::Table,
            "groups" => NodeKind::Group,
            _ => return None,
        };
        index.parse().ok().map(|index| (kind, index))
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Text => "text",
            NodeKind::Picture => "picture",
            NodeKind::Table => "table",
            NodeKind::Group => "group",
        };
        f.write_str(name)
    }
}

/// A resolved node borrowed from a [`super::Document`].
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// Text node
    Text(&'a TextItem),
    /// Picture node
    Picture(&'a PictureItem),
    /// Table node
    Table(&'a TableItem),
    /// Group node
    Group(&'a GroupItem),
}

impl<'a> Node<'a> {
    /// Kind of the node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text(_) => NodeKind::Text,
            Node::Picture(_) => NodeKind::Picture,
            Node::Table(_) => NodeKind::Table,
            Node::Group(_) => NodeKind::Group,
        }
    }

    /// Identifier of the node.
    pub fn self_ref(&self) -> &'a str {
        match self {
            Node::Text(t) => &t.self_ref,
            Node::Picture(p) => &p.self_ref,
            Node::Table(t) => &t.self_ref,
            Node::Group(g) => &g.self_ref,
        }
    }

    /// Provenance entries (groups have none).
    pub fn prov(&self) -> &'a [Provenance] {
        match self {
            Node::Text(t) => &t.prov,
            Node::Picture(p) => &p.prov,
            Node::Table(t) => &t.prov,
            Node::Group(_) => &[],
        }
    }
}

/// Text label, kept as a closed set with a passthrough for unknown labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TextLabel {
    /// Document title
    Title,
    /// Section heading
    SectionHeader,
    /// Body paragraph
    #[default]
    Text,
    /// Member of a list
    ListItem,
    /// Picture or table caption
    Caption,
    /// Footnote
    Footnote,
    /// Running page header
    PageHeader,
    /// Running page footer
    PageFooter,
    /// Code block
    Code,
    /// Mathematical formula
    Formula,
    /// Any other label, preserved as-is
    Other(String),
}

impl TextLabel {
    /// Wire name of the label.
    pub fn as_str(&self) -> &str {
        match self {
            TextLabel::Title => "title",
            TextLabel::SectionHeader => "section_header",
            TextLabel::Text => "text",
            TextLabel::ListItem => "list_item",
            TextLabel::Caption => "caption",
            TextLabel::Footnote => "footnote",
            TextLabel::PageHeader => "page_header",
            TextLabel::PageFooter => "page_footer",
            TextLabel::Code => "code",
            TextLabel::Formula => "formula",
            TextLabel::Other(label) => label,
        }
    }

    /// Whether the label marks page furniture rather than body content.
    pub fn is_furniture(&self) -> bool {
        matches!(self, TextLabel::PageHeader | TextLabel::PageFooter)
    }
}

impl From<String> for TextLabel {
    fn from(label: String) -> Self {
        match label.as_str() {
            "title" => TextLabel::Title,
            "section_header" => TextLabel::SectionHeader,
            "text" | "paragraph" => TextLabel::Text,
            "list_item" => TextLabel::ListItem,
            "caption" => TextLabel::Caption,
            "footnote" => TextLabel::Footnote,
            "page_header" => TextLabel::PageHeader,
            "page_footer" => TextLabel::PageFooter,
            "code" => TextLabel::Code,
            "formula" => TextLabel::Formula,
            _ => TextLabel::Other(label),
        }
    }
}

impl From<TextLabel> for String {
    fn from(label: TextLabel) -> Self {
        match label {
            TextLabel::Other(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

/// Coordinate origin of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordOrigin {
    /// y grows downwards from the top edge
    #[serde(rename = "TOPLEFT")]
    TopLeft,
    /// y grows upwards from the bottom edge (PDF native)
    #[serde(rename = "BOTTOMLEFT")]
    BottomLeft,
}

/// Bounding box in page points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub l: f64,
    /// Top edge
    pub t: f64,
    /// Right edge
    pub r: f64,
    /// Bottom edge
    pub b: f64,
    /// Coordinate origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord_origin: Option<CoordOrigin>,
}

impl BoundingBox {
    /// Create a bottom-left-origin box.
    pub fn new(l: f64, t: f64, r: f64, b: f64) -> Self {
        Self {
            l,
            t,
            r,
            b,
            coord_origin: Some(CoordOrigin::BottomLeft),
        }
    }
}

/// Where a node occurs on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Page number (1-indexed)
    pub page_no: u32,
    /// Bounding box on that page
    pub bbox: BoundingBox,
    /// Unrecognised fields (e.g. `charspan`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Provenance {
    /// Create a provenance entry.
    pub fn new(page_no: u32, bbox: BoundingBox) -> Self {
        Self {
            page_no,
            bbox,
            extra: Map::new(),
        }
    }
}

/// Width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

/// A text node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    /// Identifier (`#/texts/N`)
    pub self_ref: String,
    /// Owning node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeRef>,
    /// Child references
    #[serde(default)]
    pub children: Vec<NodeRef>,
    /// Semantic label
    #[serde(default)]
    pub label: TextLabel,
    /// Page occurrences
    #[serde(default)]
    pub prov: Vec<Provenance>,
    /// Text content
    #[serde(default)]
    pub text: String,
    /// Heading level for section headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Whether a list item is numbered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumerated: Option<bool>,
    /// List marker (e.g. "1.")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextItem {
    /// Create a text node without provenance.
    pub fn new(self_ref: impl Into<String>, label: TextLabel, text: impl Into<String>) -> Self {
        Self {
            self_ref: self_ref.into(),
            parent: None,
            children: Vec::new(),
            label,
            prov: Vec::new(),
            text: text.into(),
            level: None,
            enumerated: None,
            marker: None,
            extra: Map::new(),
        }
    }
}

/// Embedded picture data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// MIME type of the image
    #[serde(default)]
    pub mimetype: String,
    /// Pixel dimensions
    #[serde(default)]
    pub size: Size,
    /// Image URI, usually a `data:` URI
    #[serde(default)]
    pub uri: String,
    /// Unrecognised fields (e.g. `dpi`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageRef {
    /// Whether the URI embeds the image bytes.
    pub fn is_data_uri(&self) -> bool {
        self.uri.starts_with("data:image")
    }
}

/// A picture node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureItem {
    /// Identifier (`#/pictures/N`)
    pub self_ref: String,
    /// Owning node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeRef>,
    /// Child references
    #[serde(default)]
    pub children: Vec<NodeRef>,
    /// Label
    #[serde(default = "default_picture_label")]
    pub label: String,
    /// Page occurrences
    #[serde(default)]
    pub prov: Vec<Provenance>,
    /// Caption references
    #[serde(default)]
    pub captions: Vec<NodeRef>,
    /// Embedded image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_picture_label() -> String {
    "picture".to_string()
}

impl PictureItem {
    /// Create a picture node without image data.
    pub fn new(self_ref: impl Into<String>) -> Self {
        Self {
            self_ref: self_ref.into(),
            parent: None,
            children: Vec::new(),
            label: default_picture_label(),
            prov: Vec::new(),
            captions: Vec::new(),
            image: None,
            extra: Map::new(),
        }
    }
}

/// A group node: a transparent container such as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupItem {
    /// Identifier (`#/groups/N`, or `#/body` for the root)
    pub self_ref: String,
    /// Owning node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeRef>,
    /// Member references in stored order
    #[serde(default)]
    pub children: Vec<NodeRef>,
    /// Group name
    #[serde(default)]
    pub name: String,
    /// Group label (`list`, `ordered_list`, `unspecified`, ...)
    #[serde(default = "default_group_label")]
    pub label: String,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_group_label() -> String {
    "unspecified".to_string()
}

impl GroupItem {
    /// Create an empty group.
    pub fn new(self_ref: impl Into<String>, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            self_ref: self_ref.into(),
            parent: None,
            children: Vec::new(),
            name: name.into(),
            label: label.into(),
            extra: Map::new(),
        }
    }

    /// Whether the group renders its members as list entries.
    pub fn is_list(&self) -> bool {
        matches!(self.label.as_str(), "list" | "ordered_list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ref_wire_format() {
        let r = NodeRef::new("#/texts/3");
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r##"{"$ref":"#/texts/3"}"##);
        let back: NodeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), "#/texts/3");
    }

    #[test]
    fn test_parse_pointer() {
        assert_eq!(
            NodeKind::parse_pointer("#/tables/2"),
            Some((NodeKind::Table, 2))
        );
        assert_eq!(
            NodeKind::parse_pointer("#/groups/0"),
            Some((NodeKind::Group, 0))
        );
        assert_eq!(NodeKind::parse_pointer("#/body"), None);
        assert_eq!(NodeKind::parse_pointer("#/texts/x"), None);
        assert_eq!(NodeKind::parse_pointer("texts/1"), None);
    }

    #[test]
    fn test_text_label_passthrough() {
        let label: TextLabel = "section_header".to_string().into();
        assert_eq!(label, TextLabel::SectionHeader);

        let label: TextLabel = "checkbox_selected".to_string().into();
        assert_eq!(label.as_str(), "checkbox_selected");
        let wire: String = label.into();
        assert_eq!(wire, "checkbox_selected");
    }

    #[test]
    fn test_text_item_keeps_unknown_fields() {
        let json = r##"{
            "self_ref": "#/texts/0",
            "parent": {"$ref": "#/body"},
            "children": [],
            "content_layer": "body",
            "label": "text",
            "prov": [{"page_no": 1, "bbox": {"l": 1.0, "t": 9.0, "r": 5.0, "b": 2.0, "coord_origin": "BOTTOMLEFT"}, "charspan": [0, 5]}],
            "orig": "Hello",
            "text": "Hello",
            "formatting": null
        }"##;
        let item: TextItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.label, TextLabel::Text);
        assert_eq!(item.prov[0].page_no, 1);
        assert_eq!(item.extra.get("orig"), Some(&Value::from("Hello")));
        assert!(item.extra.contains_key("formatting"));
        assert!(item.prov[0].extra.contains_key("charspan"));

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["content_layer"], "body");
        assert_eq!(out["prov"][0]["charspan"], serde_json::json!([0, 5]));
    }

    #[test]
    fn test_group_is_list() {
        assert!(GroupItem::new("#/groups/0", "list", "list").is_list());
        assert!(!GroupItem::new("#/groups/1", "group", "key_value_area").is_list());
    }
}
