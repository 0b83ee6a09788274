//! Domain models shared by the pipeline stages.
//!
//! - [`SelectionSet`] - column names chosen for export
//! - [`IndexMapping`] - ordered (name, source position) pairs built per export
//! - [`ExportOptions`] / [`OutputFormat`] - how the destination is written
//! - [`ExportSummary`] / [`SourceInfo`] - what the pipeline reports back

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::encoding::Encoding;

/// A column name exactly as it appears in the header row.
pub type ColumnName = String;

// =============================================================================
// Selection
// =============================================================================

/// Names chosen by the user. Order of insertion carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<ColumnName>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every column of `header`.
    pub fn all<S: AsRef<str>>(header: &[S]) -> Self {
        header.iter().map(|s| s.as_ref().to_string()).collect()
    }

    pub fn insert(&mut self, name: impl Into<ColumnName>) -> bool {
        self.0.insert(name.into())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<ColumnName>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Index Mapping
// =============================================================================

/// One selected column and its zero-based position in the source header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnIndex {
    pub name: ColumnName,
    pub index: usize,
}

/// Selected columns in source-header order.
///
/// Non-empty and free of duplicate names once built by
/// [`crate::selection::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexMapping {
    columns: Vec<ColumnIndex>,
}

impl IndexMapping {
    pub(crate) fn new(columns: Vec<ColumnIndex>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnIndex] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().map(|c| c.index)
    }

    /// Largest source position referenced; a row needs more fields than this.
    pub fn max_index(&self) -> Option<usize> {
        self.indices().max()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// =============================================================================
// Export Options
// =============================================================================

/// File format of the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// UTF-8 with byte-order mark, comma separated, minimal quoting.
    #[default]
    Csv,
    /// UTF-8 JSON array of objects keyed by column name.
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Options for an export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Destination format
    pub format: OutputFormat,

    /// Split data rows into parts of at most this many rows (0 or None = single file)
    pub rows_per_file: Option<usize>,

    /// Stage output in a temporary file and move it into place on success
    pub atomic: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Csv,
            rows_per_file: None,
            atomic: true,
        }
    }
}

impl ExportOptions {
    /// Effective part size, with 0 meaning no split.
    pub(crate) fn split_size(&self) -> Option<usize> {
        self.rows_per_file.filter(|&n| n > 0)
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Data rows written, header rows excluded
    pub rows_written: u64,

    /// Files written, in part order
    pub outputs: Vec<PathBuf>,

    /// Encoding the source was read with
    pub source_encoding: Encoding,

    /// Exported column names, in output order
    pub columns: Vec<ColumnName>,
}

/// What `inspect` knows about a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub encoding: Encoding,
    pub columns: Vec<ColumnName>,
}
