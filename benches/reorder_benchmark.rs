//! Benchmarks for reading-order reconciliation.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic documents with lists, captioned pictures
//! and captioned tables.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use readorder::model::TableData;
use readorder::order::{build, reconstruct, seed};
use readorder::{export, Document, ExportOptions, SaveRequest, TextLabel};

/// Creates a document with `sections` repetitions of heading, paragraph,
/// three-item list, captioned picture and captioned table.
fn create_test_document(sections: usize) -> Document {
    let mut doc = Document::new("bench");

    for i in 0..sections {
        let heading = doc.add_text(TextLabel::SectionHeader, format!("Section {}", i + 1));
        let para = doc.add_text(
            TextLabel::Text,
            format!("Paragraph {} with some representative body text for rendering.", i),
        );
        let items: Vec<String> = (0..3)
            .map(|j| doc.add_text(TextLabel::ListItem, format!("Item {}.{}", i, j)))
            .collect();
        let item_refs: Vec<&str> = items.iter().map(String::as_str).collect();
        let list = doc.add_group("list", &item_refs);

        let fig_caption = doc.add_text(TextLabel::Caption, format!("Figure {}", i + 1));
        let picture = doc.add_picture(&[&fig_caption]);

        let table_caption = doc.add_text(TextLabel::Caption, format!("Table {}", i + 1));
        let table = doc.add_table(
            TableData::from_rows(&[
                vec!["Name".to_string(), "Value".to_string()],
                vec![format!("row {}", i), i.to_string()],
            ]),
            &[&table_caption],
        );

        for id in [&heading, &para, &list, &picture, &table] {
            doc.push_body(id);
        }
    }

    doc
}

/// Reverses the flat order and edits every tenth identifier.
fn create_edits(doc: &Document) -> SaveRequest {
    let state = readorder::reading_order(doc);
    let mut request = SaveRequest::new().with_order(state.order.iter().rev().cloned());
    for id in state.text_overrides.keys().step_by(10) {
        request = request.with_text(id, "Edited text");
    }
    request
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for sections in [10, 100, 1000] {
        let doc = create_test_document(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &doc, |b, doc| {
            b.iter(|| {
                let (index, tables) = build(black_box(doc));
                seed(&index, &tables, doc)
            })
        });
    }

    group.finish();
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");

    for sections in [10, 100, 1000] {
        let doc = create_test_document(sections);
        let (index, tables) = build(&doc);
        let mut state = seed(&index, &tables, &doc);
        state.apply_save(create_edits(&doc));

        group.bench_with_input(BenchmarkId::from_parameter(sections), &doc, |b, doc| {
            b.iter(|| reconstruct(black_box(&state), doc, &tables))
        });
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let doc = create_test_document(100);
    let rebuilt = readorder::apply_edits(&doc, create_edits(&doc)).document;
    let options = ExportOptions::default();

    c.bench_function("export_100_sections", |b| {
        b.iter(|| export(black_box(&rebuilt), &options))
    });
}

criterion_group!(benches, bench_flatten, bench_reconstruct, bench_export);
criterion_main!(benches);
