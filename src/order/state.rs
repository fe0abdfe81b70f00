//! Reading-order state: the user-visible order and text overrides.

use super::flatten::{FlatIndex, OwnershipTables};
use crate::model::Document;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Mutable reading order of the active document.
///
/// Serialized as `{"refs": [...], "texts": {...}}`, the shape the editing UI
/// reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingOrderState {
    /// Identifiers in user-visible order, without duplicates
    #[serde(rename = "refs")]
    pub order: Vec<String>,

    /// Text identifier → replacement text
    #[serde(rename = "texts")]
    pub text_overrides: IndexMap<String, String>,
}

/// A save request; absent fields leave the corresponding part untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Replacement order; `refs` is accepted so a fetched state can be saved back
    #[serde(default, alias = "refs", skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<String>>,

    /// Text overrides to upsert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texts: Option<IndexMap<String, String>>,
}

impl SaveRequest {
    /// Create an empty save request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the order.
    pub fn with_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    /// Upsert one text override.
    pub fn with_text(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts
            .get_or_insert_with(IndexMap::new)
            .insert(id.into(), text.into());
        self
    }

    /// Check if the request changes nothing.
    pub fn is_empty(&self) -> bool {
        self.order.is_none() && self.texts.is_none()
    }
}

/// Seed the state from a freshly built index.
///
/// The order is the index in position order. Every text node that is not a
/// picture or table caption records its original text verbatim; the first
/// occurrence of a duplicated identifier wins.
pub fn seed(index: &FlatIndex, tables: &OwnershipTables, doc: &Document) -> ReadingOrderState {
    let mut text_overrides = IndexMap::with_capacity(doc.texts.len());
    for item in &doc.texts {
        if tables.is_caption(&item.self_ref) || text_overrides.contains_key(&item.self_ref) {
            continue;
        }
        text_overrides.insert(item.self_ref.clone(), item.text.clone());
    }

    ReadingOrderState {
        order: index.to_order(),
        text_overrides,
    }
}

impl ReadingOrderState {
    /// Apply a save: the order is replaced wholesale, texts are upserted.
    ///
    /// The new order is not checked against the document; stale identifiers
    /// are dropped when the document is reconstructed. Repeated identifiers
    /// keep their first occurrence.
    pub fn apply_save(&mut self, request: SaveRequest) {
        if let Some(order) = request.order {
            let unique: IndexSet<String> = order.into_iter().collect();
            self.order = unique.into_iter().collect();
        }
        if let Some(texts) = request.texts {
            self.text_overrides.extend(texts);
        }
    }

    /// Override for an identifier.
    pub fn text_for(&self, id: &str) -> Option<&str> {
        self.text_overrides.get(id).map(String::as_str)
    }

    /// Number of identifiers in the order.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the order is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::fixtures::grouped_document;
    use crate::order::flatten::build;

    #[test]
    fn test_seed_order_follows_index() {
        let (doc, ids) = grouped_document();
        let (index, tables) = build(&doc);
        let state = seed(&index, &tables, &doc);

        assert_eq!(
            state.order,
            vec![ids.t0, ids.t1, ids.t2, ids.p1, ids.c1]
        );
    }

    #[test]
    fn test_seed_excludes_captions() {
        let (doc, ids) = grouped_document();
        let (index, tables) = build(&doc);
        let state = seed(&index, &tables, &doc);

        assert_eq!(state.text_for(&ids.t0), Some("Opening paragraph."));
        assert_eq!(state.text_for(&ids.t1), Some("First point"));
        assert_eq!(state.text_for(&ids.c1), None);
        assert_eq!(state.text_overrides.len(), 3);
    }

    #[test]
    fn test_seed_keeps_text_verbatim() {
        let mut doc = Document::new("ws");
        let id = doc.add_text(crate::model::TextLabel::Text, "  padded  ");
        doc.push_body(&id);
        let (index, tables) = build(&doc);

        let state = seed(&index, &tables, &doc);
        assert_eq!(state.text_for(&id), Some("  padded  "));
    }

    #[test]
    fn test_save_replaces_order_and_upserts_texts() {
        let (doc, ids) = grouped_document();
        let (index, tables) = build(&doc);
        let mut state = seed(&index, &tables, &doc);

        state.apply_save(
            SaveRequest::new()
                .with_order([ids.p1.as_str(), ids.t0.as_str()])
                .with_text(&ids.t0, "Edited.")
                .with_text("#/texts/404", "unknown"),
        );

        assert_eq!(state.order, vec![ids.p1.clone(), ids.t0.clone()]);
        assert_eq!(state.text_for(&ids.t0), Some("Edited."));
        assert_eq!(state.text_for(&ids.t1), Some("First point"));
        assert_eq!(state.text_for("#/texts/404"), Some("unknown"));
    }

    #[test]
    fn test_save_is_idempotent() {
        let (doc, ids) = grouped_document();
        let (index, tables) = build(&doc);
        let request = SaveRequest::new()
            .with_order([ids.t2.as_str(), ids.t0.as_str()])
            .with_text(&ids.t2, "Changed");

        let mut once = seed(&index, &tables, &doc);
        once.apply_save(request.clone());
        let mut twice = once.clone();
        twice.apply_save(request);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_save_changes_nothing() {
        let (doc, _) = grouped_document();
        let (index, tables) = build(&doc);
        let before = seed(&index, &tables, &doc);
        let mut after = before.clone();

        let request = SaveRequest::new();
        assert!(request.is_empty());
        after.apply_save(request);
        assert_eq!(before, after);
    }

    #[test]
    fn test_save_drops_repeated_ids() {
        let mut state = ReadingOrderState::default();
        state.apply_save(SaveRequest::new().with_order(["a", "b", "a"]));
        assert_eq!(state.order, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_state_wire_format() {
        let mut state = ReadingOrderState::default();
        state.apply_save(
            SaveRequest::new()
                .with_order(["#/texts/0"])
                .with_text("#/texts/0", "x"),
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"refs": ["#/texts/0"], "texts": {"#/texts/0": "x"}})
        );
    }

    #[test]
    fn test_save_request_from_json() {
        let request: SaveRequest =
            serde_json::from_str(r##"{"texts": {"#/texts/1": "y"}}"##).unwrap();
        assert!(request.order.is_none());
        assert_eq!(request.texts.unwrap()["#/texts/1"], "y");
    }
}
