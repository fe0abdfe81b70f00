//! Flattening index builder.
//!
//! Produces a dense position for every identifier reachable from the root,
//! in pre-order: groups are transparent and expand to their members, while
//! pictures and tables are followed directly by their captions.
//!
//! Identifiers that an ownership table lists but that are never reached
//! through their owner (orphans) receive no position. They are reported by
//! [`FlatIndex::orphans`] and logged, never treated as an error.

use crate::model::{Document, NodeRef};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Container → owned identifier tables.
///
/// Every owned identifier belongs to exactly one container: when a malformed
/// document lists the same identifier under two owners, the first claim wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipTables {
    groups: IndexMap<String, Vec<String>>,
    picture_captions: IndexMap<String, Vec<String>>,
    table_captions: IndexMap<String, Vec<String>>,
    owner_of: IndexMap<String, String>,
}

impl OwnershipTables {
    /// Build the tables from a document's groups, pictures and tables.
    pub fn from_document(doc: &Document) -> Self {
        let mut tables = Self::default();

        for group in &doc.groups {
            let members = tables.claim(&group.self_ref, &group.children);
            tables.groups.insert(group.self_ref.clone(), members);
        }
        for picture in &doc.pictures {
            let captions = tables.claim(&picture.self_ref, &picture.captions);
            tables
                .picture_captions
                .insert(picture.self_ref.clone(), captions);
        }
        for table in &doc.tables {
            let captions = tables.claim(&table.self_ref, &table.captions);
            tables.table_captions.insert(table.self_ref.clone(), captions);
        }

        tables
    }

    fn claim(&mut self, owner: &str, refs: &[NodeRef]) -> Vec<String> {
        let mut claimed = Vec::with_capacity(refs.len());
        for r in refs {
            let id = r.id();
            // A container never owns itself.
            if id == owner {
                continue;
            }
            match self.owner_of.get(id) {
                Some(previous) => {
                    log::debug!("{} already owned by {}, ignoring claim by {}", id, previous, owner);
                }
                None => {
                    self.owner_of.insert(id.to_string(), owner.to_string());
                    claimed.push(id.to_string());
                }
            }
        }
        claimed
    }

    /// Members of a group, in stored order.
    pub fn group_members(&self, id: &str) -> Option<&[String]> {
        self.groups.get(id).map(Vec::as_slice)
    }

    /// Captions of a picture, in stored order.
    pub fn picture_captions(&self, id: &str) -> Option<&[String]> {
        self.picture_captions.get(id).map(Vec::as_slice)
    }

    /// Captions of a table, in stored order.
    pub fn table_captions(&self, id: &str) -> Option<&[String]> {
        self.table_captions.get(id).map(Vec::as_slice)
    }

    /// Captions of a picture or table.
    pub fn captions_of(&self, id: &str) -> Option<&[String]> {
        self.picture_captions(id).or_else(|| self.table_captions(id))
    }

    /// Whether any container owns the identifier.
    pub fn is_owned(&self, id: &str) -> bool {
        self.owner_of.contains_key(id)
    }

    /// Whether the identifier is a picture or table caption.
    pub fn is_caption(&self, id: &str) -> bool {
        self.owner_of
            .get(id)
            .is_some_and(|owner| !self.groups.contains_key(owner))
    }

    /// Container owning the identifier.
    pub fn owner(&self, id: &str) -> Option<&str> {
        self.owner_of.get(id).map(String::as_str)
    }

    /// All owned identifiers, in claim order.
    pub fn owned(&self) -> impl Iterator<Item = &str> {
        self.owner_of.keys().map(String::as_str)
    }

    /// Number of groups, captioned pictures and captioned tables.
    pub fn counts(&self) -> (usize, usize, usize) {
        let captioned = |t: &IndexMap<String, Vec<String>>| t.values().filter(|c| !c.is_empty()).count();
        (
            self.groups.len(),
            captioned(&self.picture_captions),
            captioned(&self.table_captions),
        )
    }
}

/// Identifier → dense position, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatIndex {
    ids: IndexSet<String>,
}

impl FlatIndex {
    /// Walk the root's children and assign positions.
    pub fn build(doc: &Document, tables: &OwnershipTables) -> Self {
        let mut walker = Walker {
            tables,
            index: FlatIndex::default(),
            expanded: HashSet::new(),
        };
        for id in doc.body_refs() {
            walker.visit(id);
        }
        walker.index
    }

    fn assign(&mut self, id: &str) {
        if !self.ids.contains(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Position of an identifier.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.get_index_of(id)
    }

    /// Whether the identifier has a position.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of positioned identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if nothing was positioned.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in position order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Identifiers in position order, owned.
    pub fn to_order(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    /// Owned identifiers that never received a position.
    pub fn orphans<'a>(&self, tables: &'a OwnershipTables) -> Vec<&'a str> {
        tables.owned().filter(|id| !self.contains(id)).collect()
    }
}

struct Walker<'a> {
    tables: &'a OwnershipTables,
    index: FlatIndex,
    expanded: HashSet<String>,
}

impl Walker<'_> {
    fn visit(&mut self, id: &str) {
        if let Some(members) = self.tables.group_members(id) {
            // Groups take no position; each is expanded at most once, which
            // also stops self-referencing groups.
            if self.expanded.insert(id.to_string()) {
                for member in members {
                    self.visit(member);
                }
            }
            return;
        }

        self.index.assign(id);
        if let Some(captions) = self.tables.captions_of(id) {
            for caption in captions {
                self.index.assign(caption);
            }
        }
    }
}

/// Build the flat index and ownership tables for a document.
pub fn build(doc: &Document) -> (FlatIndex, OwnershipTables) {
    let tables = OwnershipTables::from_document(doc);
    let index = FlatIndex::build(doc, &tables);

    let (groups, pictures, captioned_tables) = tables.counts();
    log::debug!(
        "Flattened {} identifiers ({} groups, {} captioned pictures, {} captioned tables)",
        index.len(),
        groups,
        pictures,
        captioned_tables
    );

    let orphans = index.orphans(&tables);
    if !orphans.is_empty() {
        log::warn!(
            "{} owned identifiers are unreachable from the body and were left out of the order: {:?}",
            orphans.len(),
            orphans
        );
    }

    (index, tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableData, TextLabel};
    use crate::order::fixtures::grouped_document;

    #[test]
    fn test_grouped_document_order() {
        let (doc, ids) = grouped_document();
        let (index, _) = build(&doc);
        assert_eq!(
            index.to_order(),
            vec![ids.t0, ids.t1, ids.t2, ids.p1, ids.c1]
        );
    }

    #[test]
    fn test_positions_are_dense() {
        let (doc, _) = grouped_document();
        let (index, _) = build(&doc);
        let mut positions: Vec<usize> = index.ids().filter_map(|id| index.position(id)).collect();
        positions.sort_unstable();
        assert_eq!(positions, (0..index.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_build_is_idempotent() {
        let (doc, _) = grouped_document();
        let (first, first_tables) = build(&doc);
        let (second, second_tables) = build(&doc);
        assert_eq!(first, second);
        assert_eq!(first_tables, second_tables);
    }

    #[test]
    fn test_group_has_no_position() {
        let (doc, ids) = grouped_document();
        let (index, tables) = build(&doc);
        assert!(!index.contains(&ids.g));
        assert_eq!(
            tables.group_members(&ids.g),
            Some(&[ids.t1.clone(), ids.t2.clone()][..])
        );
    }

    #[test]
    fn test_repeated_reference_keeps_first_position() {
        let mut doc = crate::model::Document::new("dup");
        let a = doc.add_text(TextLabel::Text, "a");
        let b = doc.add_text(TextLabel::Text, "b");
        doc.push_body(&a);
        doc.push_body(&b);
        doc.push_body(&a);

        let (index, _) = build(&doc);
        assert_eq!(index.to_order(), vec![a.clone(), b]);
        assert_eq!(index.position(&a), Some(0));
    }

    #[test]
    fn test_orphan_caption_is_dropped() {
        let mut doc = crate::model::Document::new("orphan");
        let body_text = doc.add_text(TextLabel::Text, "body");
        let caption = doc.add_text(TextLabel::Caption, "Table 1");
        let _table = doc.add_table(TableData::from_rows(&[vec!["x"]]), &[&caption]);
        doc.push_body(&body_text);

        let (index, tables) = build(&doc);
        assert_eq!(index.to_order(), vec![body_text]);
        assert_eq!(index.orphans(&tables), vec![caption.as_str()]);
    }

    #[test]
    fn test_table_captions_inline() {
        let mut doc = crate::model::Document::new("table");
        let caption = doc.add_text(TextLabel::Caption, "Table 1");
        let table = doc.add_table(TableData::from_rows(&[vec!["x"]]), &[&caption]);
        let after = doc.add_text(TextLabel::Text, "after");
        doc.push_body(&table);
        doc.push_body(&after);

        let (index, _) = build(&doc);
        assert_eq!(index.to_order(), vec![table, caption, after]);
    }

    #[test]
    fn test_nested_group_is_transparent() {
        let mut doc = crate::model::Document::new("nested");
        let a = doc.add_text(TextLabel::ListItem, "a");
        let b = doc.add_text(TextLabel::ListItem, "b");
        let inner = doc.add_group("list", &[&b]);
        let outer = doc.add_group("list", &[&a, &inner]);
        doc.push_body(&outer);

        let (index, tables) = build(&doc);
        assert_eq!(index.to_order(), vec![a, b]);
        assert!(tables.is_owned(&inner));
        assert!(!index.contains(&inner));
    }

    #[test]
    fn test_self_referencing_group_terminates() {
        let mut doc = crate::model::Document::new("cycle");
        let a = doc.add_text(TextLabel::Text, "a");
        let g = doc.add_group("list", &[&a]);
        doc.groups[0].children.push(NodeRef::new(g.as_str()));
        doc.push_body(&g);

        let (index, tables) = build(&doc);
        assert_eq!(index.to_order(), vec![a]);
        assert!(!tables.is_owned(&g));
    }

    #[test]
    fn test_ownership_is_exclusive() {
        let mut doc = crate::model::Document::new("shared");
        let caption = doc.add_text(TextLabel::Caption, "shared");
        let group = doc.add_group("list", &[&caption]);
        let picture = doc.add_picture(&[&caption]);
        doc.push_body(&group);
        doc.push_body(&picture);

        let tables = OwnershipTables::from_document(&doc);
        assert_eq!(tables.owner(&caption), Some(group.as_str()));
        assert_eq!(tables.picture_captions(&picture), Some(&[][..]));
        assert!(!tables.is_caption(&caption));
    }

    #[test]
    fn test_unknown_body_reference_is_positioned() {
        let mut doc = crate::model::Document::new("stale");
        doc.body.children.push(NodeRef::new("#/texts/99"));
        let (index, _) = build(&doc);
        assert_eq!(index.to_order(), vec!["#/texts/99".to_string()]);
    }
}
