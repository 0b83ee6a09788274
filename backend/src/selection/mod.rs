//! Resolving selected column names to source positions.
//!
//! Output order always follows the source header, never the order in
//! which names were picked. When a name occurs more than once in the
//! header only its first occurrence is exported.
//!
//! The catalog helpers ([`display_order`], [`filter_columns`]) only serve
//! presentation and have no effect on what gets exported.

use std::collections::HashSet;

use crate::error::{SelectionError, SelectionResult};
use crate::models::{ColumnIndex, ColumnName, IndexMapping, SelectionSet};

/// Build the index mapping for `selected` over `header`.
///
/// Fails with [`SelectionError::SelectionEmpty`] for an empty selection and
/// with [`SelectionError::SelectionStale`] if any selected name is absent
/// from the header.
pub fn resolve<S: AsRef<str>>(header: &[S], selected: &SelectionSet) -> SelectionResult<IndexMapping> {
    if selected.is_empty() {
        return Err(SelectionError::SelectionEmpty);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(selected.len());
    let mut columns = Vec::with_capacity(selected.len());

    for (index, name) in header.iter().map(AsRef::<str>::as_ref).enumerate() {
        if selected.contains(name) && seen.insert(name) {
            columns.push(ColumnIndex {
                name: name.to_string(),
                index,
            });
        }
    }

    let missing: Vec<String> = selected
        .iter()
        .filter(|name| !seen.contains(name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(SelectionError::SelectionStale { missing });
    }

    Ok(IndexMapping::new(columns))
}

/// Header names for browsing: case-insensitive alphabetical, duplicates collapsed.
pub fn display_order<S: AsRef<str>>(header: &[S]) -> Vec<ColumnName> {
    let mut columns: Vec<ColumnName> = header.iter().map(|s| s.as_ref().to_string()).collect();
    columns.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    columns.dedup();
    columns
}

/// Keep the columns whose name contains `query`, ignoring case.
pub fn filter_columns<S: AsRef<str>>(columns: &[S], query: &str) -> Vec<ColumnName> {
    let needle = query.to_lowercase();
    columns
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|name| name.to_lowercase().contains(&needle))
        .map(str::to_string)
        .collect()
}
