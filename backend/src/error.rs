//! Error types for the column export pipeline.
//!
//! Each stage has its own error enum and converts upward with `From`,
//! so `?` works across stage boundaries:
//!
//! - [`LoadError`] - reading and decoding the source file
//! - [`SelectionError`] - resolving selected names against the header
//! - [`TransformError`] - projecting rows and writing the destination
//! - [`ExportError`] - top-level error returned by [`crate::export`]
//!
//! Every error maps onto exactly one [`ErrorCategory`], which is what a
//! UI layer switches on to render a message.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::encoding::Encoding;

// =============================================================================
// Categories
// =============================================================================

/// Outcome categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    FileNotReadable,
    NoDecodableEncoding,
    EmptyFile,
    SelectionEmpty,
    SelectionStale,
    MalformedRow,
    DestinationNotWritable,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::FileNotReadable => "file_not_readable",
            ErrorCategory::NoDecodableEncoding => "no_decodable_encoding",
            ErrorCategory::EmptyFile => "empty_file",
            ErrorCategory::SelectionEmpty => "selection_empty",
            ErrorCategory::SelectionStale => "selection_stale",
            ErrorCategory::MalformedRow => "malformed_row",
            ErrorCategory::DestinationNotWritable => "destination_not_writable",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while detecting the encoding of a source file or reading its header.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Missing, unreadable, or a directory.
    #[error("cannot read {path}: {source}")]
    FileNotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes do not decode under the given encoding.
    #[error("{path} cannot be decoded as {encoding}")]
    NoDecodableEncoding { path: PathBuf, encoding: Encoding },

    /// The file decodes but holds no header record.
    #[error("{path} is empty (no header row)")]
    EmptyFile { path: PathBuf },
}

impl LoadError {
    pub(crate) fn not_readable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::FileNotReadable {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LoadError::FileNotReadable { .. } => ErrorCategory::FileNotReadable,
            LoadError::NoDecodableEncoding { .. } => ErrorCategory::NoDecodableEncoding,
            LoadError::EmptyFile { .. } => ErrorCategory::EmptyFile,
        }
    }
}

// =============================================================================
// Selection Errors
// =============================================================================

/// Errors while resolving a selection against a header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// No column was selected.
    #[error("no column selected")]
    SelectionEmpty,

    /// Selected names that the header no longer contains.
    #[error("selected columns not found in header: {}", .missing.join(", "))]
    SelectionStale { missing: Vec<String> },
}

impl SelectionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SelectionError::SelectionEmpty => ErrorCategory::SelectionEmpty,
            SelectionError::SelectionStale { .. } => ErrorCategory::SelectionStale,
        }
    }
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors while streaming rows into the destination.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The source could not be re-read for the export pass.
    #[error(transparent)]
    Source(#[from] LoadError),

    /// A data row is too short for the selected columns.
    #[error("{path}: data row {row} (line {line}) has {found} fields, {required} required")]
    MalformedRow {
        path: PathBuf,
        /// 1-based data row number, header excluded.
        row: u64,
        /// 1-based physical line where the record starts.
        line: u64,
        /// Fields needed to reach the last selected column.
        required: usize,
        found: usize,
    },

    /// The destination cannot be created, written, or moved into place.
    #[error("cannot write {path}: {source}")]
    DestinationNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransformError {
    pub(crate) fn not_writable(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        TransformError::DestinationNotWritable {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TransformError::Source(e) => e.category(),
            TransformError::MalformedRow { .. } => ErrorCategory::MalformedRow,
            TransformError::DestinationNotWritable { .. } => ErrorCategory::DestinationNotWritable,
        }
    }
}

// =============================================================================
// Export Errors (top-level)
// =============================================================================

/// Top-level error of [`crate::export`].
///
/// Short-circuits on the first failing stage.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ExportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExportError::Load(e) => e.category(),
            ExportError::Selection(e) => e.category(),
            ExportError::Transform(e) => e.category(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for selection resolution.
pub type SelectionResult<T> = Result<T, SelectionError>;

/// Result type for the transform stage.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
