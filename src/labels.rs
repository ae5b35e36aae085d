//! Human-readable labels for controlled-vocabulary facets.
//!
//! Several facets come back from the server as raw codes (`eng`, MARC
//! genre URIs, scanning agent ids). The label tables live in
//! `assets/facet_labels.json`, embedded at build time and parsed once on
//! first use. Columns whose names match a table get their codes replaced;
//! anything without a mapping passes through.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::frame::Frame;

static LABELS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

/// Facet name -> code -> display label tables.
pub fn facet_labels() -> &'static HashMap<String, HashMap<String, String>> {
    LABELS.get_or_init(|| {
        // The asset ships with the crate; a parse failure is a build
        // defect, so an empty table set is the safe degraded answer.
        serde_json::from_str(include_str!("../assets/facet_labels.json")).unwrap_or_default()
    })
}

/// Replace codes with display labels in every column backed by a table.
pub fn relabel(frame: &mut Frame) {
    let tables = facet_labels();
    let facet_columns: Vec<String> = frame
        .columns()
        .iter()
        .filter(|c| tables.contains_key(*c))
        .cloned()
        .collect();
    for column in facet_columns {
        if let Some(labels) = tables.get(&column) {
            frame.replace_in_column(&column, labels);
        }
    }
}
