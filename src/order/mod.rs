//! Reading-order reconciliation.
//!
//! The engine turns the hierarchical document into a flat, editable list of
//! identifiers and back:
//!
//! 1. [`flatten`] walks the root's children once, expanding groups and
//!    inlining picture/table captions after their owner, and records which
//!    container owns which identifiers.
//! 2. [`state`] holds the user-visible order and the text overrides, seeded
//!    from the flat index and changed only by explicit saves.
//! 3. [`reconstruct`] prunes owned identifiers from the saved order, rebuilds
//!    the root's children and substitutes edited text.

pub mod flatten;
pub mod reconstruct;
pub mod state;

pub use flatten::{build, FlatIndex, OwnershipTables};
pub use reconstruct::{pruned_order, reconstruct, ReconstructReport, Reconstruction};
pub use state::{seed, ReadingOrderState, SaveRequest};

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::{Document, TextLabel};

    /// Identifiers of the reference document.
    pub struct Ids {
        pub t0: String,
        pub t1: String,
        pub t2: String,
        pub c1: String,
        pub g: String,
        pub p1: String,
    }

    /// Body `[T0, G, P1]` where `G = [T1, T2]` and `P1` is captioned by `C1`.
    pub fn grouped_document() -> (Document, Ids) {
        let mut doc = Document::new("fixture");
        let t0 = doc.add_text(TextLabel::Text, "Opening paragraph.");
        let t1 = doc.add_text(TextLabel::ListItem, "First point");
        let t2 = doc.add_text(TextLabel::ListItem, "Second point");
        let c1 = doc.add_text(TextLabel::Caption, "Figure 1: A chart.");
        let g = doc.add_group("list", &[&t1, &t2]);
        let p1 = doc.add_picture(&[&c1]);
        doc.push_body(&t0);
        doc.push_body(&g);
        doc.push_body(&p1);
        (
            doc,
            Ids {
                t0,
                t1,
                t2,
                c1,
                g,
                p1,
            },
        )
    }
}
