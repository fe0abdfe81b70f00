//! Per-page bounding boxes for the editing UI.
//!
//! Boxes are listed texts first, then pictures, then tables, each in stored
//! order, with one box per provenance entry on the requested page.

use crate::error::{Error, Result};
use crate::model::{BoundingBox, Document, NodeKind, Node, Provenance, Size};
use serde::{Deserialize, Serialize};

use super::markdown::table_to_markdown;

/// Box edges in page points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxEdges {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl From<&BoundingBox> for BoxEdges {
    fn from(bbox: &BoundingBox) -> Self {
        Self {
            left: bbox.l,
            top: bbox.t,
            right: bbox.r,
            bottom: bbox.b,
        }
    }
}

/// Image metadata attached to picture boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// MIME type, `unknown` when the picture carries no image
    pub mimetype: String,
    /// Pixel dimensions, zero when unknown
    pub size: Size,
}

/// One block drawn over a page image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    /// Node identifier
    pub self_ref: String,

    /// Node kind
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Trimmed text, picture data URI or Markdown table
    pub content: String,

    /// Page number (1-indexed, as in provenance)
    pub page: u32,

    /// Box edges
    pub bbox: BoxEdges,

    /// Picture image metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,

    /// Picture caption texts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captions: Vec<String>,
}

/// Collect the boxes of a zero-based page.
pub fn page_boxes(doc: &Document, page: u32) -> Result<Vec<PageBox>> {
    let page_count = doc.page_count();
    if page >= page_count {
        return Err(Error::PageOutOfRange(page, page_count));
    }
    let page_no = page + 1;
    let on_page = |prov: &[Provenance]| -> Vec<BoxEdges> {
        prov.iter()
            .filter(|p| p.page_no == page_no)
            .map(|p| BoxEdges::from(&p.bbox))
            .collect()
    };

    let mut boxes = Vec::new();

    for item in &doc.texts {
        let content = item.text.trim();
        if content.is_empty() {
            continue;
        }
        for bbox in on_page(&item.prov) {
            boxes.push(PageBox {
                self_ref: item.self_ref.clone(),
                kind: NodeKind::Text,
                content: content.to_string(),
                page: page_no,
                bbox,
                metadata: None,
                captions: Vec::new(),
            });
        }
    }

    for item in &doc.pictures {
        let content = item
            .image
            .as_ref()
            .filter(|image| image.is_data_uri())
            .map(|image| image.uri.clone())
            .unwrap_or_default();
        let metadata = match &item.image {
            Some(image) => ImageMetadata {
                mimetype: image.mimetype.clone(),
                size: image.size,
            },
            None => ImageMetadata {
                mimetype: "unknown".to_string(),
                size: Size::default(),
            },
        };
        let captions: Vec<String> = item
            .captions
            .iter()
            .filter_map(|c| match doc.node(c.id()) {
                Some(Node::Text(text)) => Some(text.text.trim().to_string()),
                _ => None,
            })
            .collect();

        for bbox in on_page(&item.prov) {
            boxes.push(PageBox {
                self_ref: item.self_ref.clone(),
                kind: NodeKind::Picture,
                content: content.clone(),
                page: page_no,
                bbox,
                metadata: Some(metadata.clone()),
                captions: captions.clone(),
            });
        }
    }

    for item in &doc.tables {
        let edges = on_page(&item.prov);
        if edges.is_empty() {
            continue;
        }
        let content = table_to_markdown(&item.data);
        for bbox in edges {
            boxes.push(PageBox {
                self_ref: item.self_ref.clone(),
                kind: NodeKind::Table,
                content: content.clone(),
                page: page_no,
                bbox,
                metadata: None,
                captions: Vec::new(),
            });
        }
    }

    Ok(boxes)
}
