//! # Colsplit - export a chosen subset of CSV columns
//!
//! Colsplit reads a CSV file of unknown encoding, lists its columns, and
//! writes a new UTF-8 CSV containing only the selected ones, rows in their
//! original order.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│  Encoding   │────▶│   Header    │────▶│  Selection  │
//! │ (any of 5)  │     │ (trial dec) │     │  (1st rec)  │     │ (src order) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    ▼
//!                                         ┌─────────────┐     ┌─────────────┐
//!                                         │  UTF-8 BOM  │◀────│  Transform  │
//!                                         │  CSV / JSON │     │ (projection)│
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use colsplit::{export, load, SelectionSet};
//! use std::path::Path;
//!
//! let columns = load(Path::new("people.csv"))?;
//! let selected: SelectionSet = ["email", "id"].into_iter().collect();
//! let rows = export(Path::new("people.csv"), &selected, Path::new("out.csv"))?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Categorized error types
//! - [`encoding`] - Encoding detection by trial decoding
//! - [`parser`] - Source decoding and header reading
//! - [`models`] - Selection, index mapping, options, reports
//! - [`selection`] - Name-to-index resolution and column catalog helpers
//! - [`transform`] - Row projection, output writers, and the pipeline

// Core modules
pub mod error;
pub mod models;

// Reading
pub mod encoding;
pub mod parser;

// Selection
pub mod selection;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ErrorCategory,
    ExportError,
    ExportResult,
    LoadError,
    LoadResult,
    SelectionError,
    TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ColumnIndex,
    ColumnName,
    ExportOptions,
    ExportSummary,
    IndexMapping,
    OutputFormat,
    SelectionSet,
    SourceInfo,
};

// =============================================================================
// Re-exports - Components
// =============================================================================

pub use encoding::{detect, detect_bytes, Encoding, CANDIDATES, OUTPUT_ENCODING};
pub use parser::{read_header, SourceText};
pub use selection::{display_order, filter_columns, resolve};
pub use transform::{transform, transform_text};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    default_output_path,
    export,
    export_with_options,
    inspect,
    load,
};
