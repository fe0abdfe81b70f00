//! Integration tests for reading-order reconciliation.

use readorder::model::TableData;
use readorder::order::{build, pruned_order, reconstruct, seed};
use readorder::{Document, NodeKind, ReadingOrderState, SaveRequest, Session, TextLabel};

/// Body `[T0, G, P1]` with `G = [T1, T2]` and `P1` captioned by `C1`.
fn grouped() -> (Document, [String; 6]) {
    let mut doc = Document::new("grouped");
    let t0 = doc.add_text(TextLabel::Text, "Intro");
    let t1 = doc.add_text(TextLabel::ListItem, "one");
    let t2 = doc.add_text(TextLabel::ListItem, "two");
    let c1 = doc.add_text(TextLabel::Caption, "Figure 1");
    let g = doc.add_group("list", &[&t1, &t2]);
    let p1 = doc.add_picture(&[&c1]);
    doc.push_body(&t0);
    doc.push_body(&g);
    doc.push_body(&p1);
    (doc, [t0, t1, t2, c1, g, p1])
}

#[test]
fn test_flat_and_pruned_order() {
    let (doc, [t0, t1, t2, c1, g, p1]) = grouped();
    let (index, tables) = build(&doc);

    assert_eq!(index.to_order(), vec![t0.clone(), t1.clone(), t2.clone(), p1.clone(), c1.clone()]);
    assert_eq!(index.position(&g), None);
    assert_eq!(index.position(&c1), Some(4));

    let state = seed(&index, &tables, &doc);
    assert_eq!(pruned_order(&state, &doc, &tables), vec![t0, p1]);
}

#[test]
fn test_table_captions_follow_table() {
    let mut doc = Document::new("tables");
    let intro = doc.add_text(TextLabel::Text, "Intro");
    let cap = doc.add_text(TextLabel::Caption, "Table 1");
    let table = doc.add_table(TableData::from_rows(&[vec!["a", "b"]]), &[&cap]);
    doc.push_body(&intro);
    doc.push_body(&table);

    let (index, tables) = build(&doc);
    assert_eq!(index.to_order(), vec![intro, table.clone(), cap.clone()]);
    assert_eq!(tables.table_captions(&table), Some(&[cap][..]));
    assert_eq!(doc.kind_of(&table), Some(NodeKind::Table));
}

#[test]
fn test_reorder_and_edit_scenario() {
    let (doc, [t0, _, _, c1, _, p1]) = grouped();
    let mut session = Session::new(doc);

    session.apply_save(
        SaveRequest::new()
            .with_order([p1.as_str(), c1.as_str(), t0.as_str()])
            .with_text(&t0, "Edited intro"),
    );
    let rebuilt = session.reconstruct();

    assert_eq!(
        rebuilt.document.body_refs().collect::<Vec<_>>(),
        vec![p1.as_str(), t0.as_str()]
    );
    assert_eq!(rebuilt.document.texts[0].text, "Edited intro");
    assert_eq!(rebuilt.report.pruned, 1);
    assert!(rebuilt.report.is_clean());

    // The parsed document is never mutated.
    assert_eq!(session.document().texts[0].text, "Intro");
}

#[test]
fn test_stale_identifier_is_dropped() {
    let (doc, [t0, ..]) = grouped();
    let rebuilt = readorder::apply_edits(
        &doc,
        SaveRequest::new().with_order(["#/texts/99", t0.as_str()]),
    );

    assert_eq!(rebuilt.document.body_refs().collect::<Vec<_>>(), vec![t0.as_str()]);
    assert_eq!(rebuilt.report.stale, vec!["#/texts/99".to_string()]);
}

#[test]
fn test_text_only_save_keeps_order() {
    let (doc, [t0, _, _, _, _, p1]) = grouped();
    let mut session = Session::new(doc);
    let before = session.reading_order().order.clone();

    session.apply_save(SaveRequest::new().with_text(&t0, "Changed"));
    assert_eq!(session.reading_order().order, before);

    let rebuilt = session.reconstruct();
    assert_eq!(
        rebuilt.document.body_refs().collect::<Vec<_>>(),
        vec![t0.as_str(), p1.as_str()]
    );
}

#[test]
fn test_empty_document() {
    let doc = Document::new("empty");
    let state = readorder::reading_order(&doc);
    assert_eq!(state, ReadingOrderState::default());

    let (_, tables) = build(&doc);
    let rebuilt = reconstruct(&state, &doc, &tables);
    assert_eq!(rebuilt.document.body_refs().count(), 0);
}

#[test]
fn test_rebuild_from_json_input() {
    let json = r##"{
        "name": "from-json",
        "body": {"self_ref": "#/body", "children": [
            {"$ref": "#/texts/0"}, {"$ref": "#/groups/0"}
        ]},
        "groups": [{"self_ref": "#/groups/0", "label": "list", "name": "list",
                    "children": [{"$ref": "#/texts/1"}]}],
        "texts": [
            {"self_ref": "#/texts/0", "label": "text", "text": "Lead"},
            {"self_ref": "#/texts/1", "label": "list_item", "text": "item"}
        ]
    }"##;
    let doc = readorder::load_json(json).unwrap();
    let state = readorder::reading_order(&doc);
    assert_eq!(state.order, vec!["#/texts/0", "#/texts/1"]);

    let rebuilt = readorder::apply_edits(&doc, SaveRequest::new());
    assert_eq!(rebuilt.document.body_refs().collect::<Vec<_>>(), vec!["#/texts/0"]);
}
