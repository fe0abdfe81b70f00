//! Document reconstruction from a saved reading order.
//!
//! The output is a full copy of the input document where only the root's
//! children and the `text` of overridden text nodes differ.

use super::flatten::OwnershipTables;
use super::state::ReadingOrderState;
use crate::model::{Document, NodeRef};
use std::collections::HashSet;

/// What reconstruction dropped or changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructReport {
    /// Identifiers absent from the document, in order of appearance
    pub stale: Vec<String>,
    /// Repeated identifiers skipped after their first occurrence
    pub duplicates: Vec<String>,
    /// Identifiers removed because a group, picture or table owns them
    pub pruned: usize,
    /// Text nodes whose content changed
    pub substituted: usize,
    /// Override keys that name no text node
    pub unknown_overrides: Vec<String>,
}

impl ReconstructReport {
    /// Check if reconstruction dropped nothing unexpected.
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty() && self.duplicates.is_empty() && self.unknown_overrides.is_empty()
    }
}

/// A reconstructed document with its report.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// Export-ready document
    pub document: Document,
    /// Dropped and substituted entries
    pub report: ReconstructReport,
}

/// The saved order minus owned, stale and repeated identifiers.
pub fn pruned_order(
    state: &ReadingOrderState,
    doc: &Document,
    tables: &OwnershipTables,
) -> Vec<String> {
    prune(state, doc, tables, &mut ReconstructReport::default())
}

fn prune(
    state: &ReadingOrderState,
    doc: &Document,
    tables: &OwnershipTables,
    report: &mut ReconstructReport,
) -> Vec<String> {
    let mut seen = HashSet::with_capacity(state.order.len());
    let mut pruned = Vec::with_capacity(state.order.len());

    for id in &state.order {
        if tables.is_owned(id) {
            report.pruned += 1;
        } else if !doc.contains(id) {
            report.stale.push(id.clone());
        } else if !seen.insert(id.as_str()) {
            report.duplicates.push(id.clone());
        } else {
            pruned.push(id.clone());
        }
    }
    pruned
}

/// Build an export-ready copy of `doc` from the saved state.
pub fn reconstruct(
    state: &ReadingOrderState,
    doc: &Document,
    tables: &OwnershipTables,
) -> Reconstruction {
    let mut report = ReconstructReport::default();
    let order = prune(state, doc, tables, &mut report);

    let mut document = doc.clone();
    document.body.children = order.into_iter().map(NodeRef::new).collect();

    let mut matched = HashSet::with_capacity(state.text_overrides.len());
    for item in &mut document.texts {
        if let Some(text) = state.text_overrides.get(&item.self_ref) {
            matched.insert(item.self_ref.as_str());
            if item.text != *text {
                item.text.clone_from(text);
                report.substituted += 1;
            }
        }
    }
    report.unknown_overrides = state
        .text_overrides
        .keys()
        .filter(|id| !matched.contains(id.as_str()))
        .cloned()
        .collect();

    if !report.stale.is_empty() {
        log::warn!(
            "Dropped {} stale identifiers from the saved order: {:?}",
            report.stale.len(),
            report.stale
        );
    }
    if !report.duplicates.is_empty() {
        log::warn!("Skipped repeated identifiers: {:?}", report.duplicates);
    }
    if !report.unknown_overrides.is_empty() {
        log::debug!(
            "{} text overrides name no text node",
            report.unknown_overrides.len()
        );
    }
    log::debug!(
        "Reconstructed {} root children ({} owned pruned, {} texts substituted)",
        document.body.children.len(),
        report.pruned,
        report.substituted
    );

    Reconstruction { document, report }
}
