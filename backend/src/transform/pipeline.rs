//! High-level pipeline API: load a file's columns, export a selection.
//!
//! These are the only two operations a UI needs. Both take the source
//! path explicitly and keep no state between calls: `export` re-detects
//! the encoding and re-reads the header, so a file edited after `load`
//! is judged by its current content.
//!
//! # Example
//!
//! ```rust,ignore
//! use colsplit::{load, export, SelectionSet};
//! use std::path::Path;
//!
//! let source = Path::new("people.csv");
//! let columns = load(source)?;
//! println!("Columns: {}", columns.join(", "));
//!
//! let selected: SelectionSet = ["email", "id"].into_iter().collect();
//! let rows = export(source, &selected, Path::new("selected_people.csv"))?;
//! println!("Exported {} rows", rows);
//! ```

use std::path::{Path, PathBuf};

use crate::error::{ExportResult, LoadResult};
use crate::models::{ColumnName, ExportOptions, ExportSummary, SelectionSet, SourceInfo};
use crate::parser::SourceText;
use crate::selection::resolve;
use crate::transform::transform_text;

/// Prefix of the default destination file name.
const DEFAULT_OUTPUT_PREFIX: &str = "selected_";

/// Column names of `path`, in source order.
pub fn load(path: &Path) -> LoadResult<Vec<ColumnName>> {
    Ok(inspect(path)?.columns)
}

/// Detected encoding and header of `path`.
pub fn inspect(path: &Path) -> LoadResult<SourceInfo> {
    let text = SourceText::open(path)?;
    let encoding = text.encoding();
    let columns = text.header()?;

    tracing::info!(
        path = %path.display(),
        encoding = %encoding,
        columns = columns.len(),
        "loaded header"
    );

    Ok(SourceInfo {
        path: path.to_path_buf(),
        encoding,
        columns,
    })
}

/// Export `selected` columns of `path` to `destination` as UTF-8 CSV.
///
/// Returns the number of data rows written.
pub fn export(path: &Path, selected: &SelectionSet, destination: &Path) -> ExportResult<u64> {
    Ok(export_with_options(path, selected, destination, &ExportOptions::default())?.rows_written)
}

/// Export with explicit output options.
pub fn export_with_options(
    path: &Path,
    selected: &SelectionSet,
    destination: &Path,
    options: &ExportOptions,
) -> ExportResult<ExportSummary> {
    let result = run_export(path, selected, destination, options);

    match &result {
        Ok(summary) => tracing::info!(
            path = %path.display(),
            destination = %destination.display(),
            encoding = %summary.source_encoding,
            rows = summary.rows_written,
            files = summary.outputs.len(),
            "export finished"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            destination = %destination.display(),
            category = %e.category(),
            error = %e,
            "export failed"
        ),
    }

    result
}

fn run_export(
    path: &Path,
    selected: &SelectionSet,
    destination: &Path,
    options: &ExportOptions,
) -> ExportResult<ExportSummary> {
    // Detection and both passes share one read of the file.
    let text = SourceText::open(path)?;
    let header = text.header()?;
    let mapping = resolve(&header, selected)?;

    tracing::debug!(
        columns = ?mapping.names().collect::<Vec<_>>(),
        "resolved selection"
    );

    Ok(transform_text(&text, &mapping, destination, options)?)
}

/// Default destination for `source`: `selected_<file name>` in the same directory.
pub fn default_output_path(source: &Path) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export.csv".to_string());
    source.with_file_name(format!("{}{}", DEFAULT_OUTPUT_PREFIX, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Encoding;
    use crate::error::{ErrorCategory, ExportError};
    use std::fs;

    const BOM: &[u8] = b"\xEF\xBB\xBF";

    fn selection(names: &[&str]) -> SelectionSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_load_returns_source_order() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("people.csv");
        fs::write(&src, "id,name,email\n1,Alice,a@x.org\n").unwrap();

        assert_eq!(load(&src).unwrap(), vec!["id", "name", "email"]);
    }

    #[test]
    fn test_inspect_reports_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("latin.csv");
        // "Prénom"
        fs::write(&src, [0x50u8, 0x72, 0xE9, 0x6E, 0x6F, 0x6D, 0x0A]).unwrap();

        let info = inspect(&src).unwrap();
        assert_eq!(info.encoding, Encoding::Windows1252);
        assert_eq!(info.columns, vec!["Prénom"]);
    }

    #[test]
    fn test_load_errors_are_categorized() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        assert_eq!(load(&missing).unwrap_err().category(), ErrorCategory::FileNotReadable);

        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "").unwrap();
        assert_eq!(load(&empty).unwrap_err().category(), ErrorCategory::EmptyFile);
    }

    #[test]
    fn test_full_selection_reproduces_data() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("data.csv");
        let dest = dir.path().join("copy.csv");
        let content = "id,name,note\r\n1,Alice,\"x, y\"\r\n2,Bob,plain\r\n";
        fs::write(&src, content).unwrap();

        let header = load(&src).unwrap();
        let rows = export(&src, &SelectionSet::all(&header), &dest).unwrap();

        assert_eq!(rows, 2);
        let bytes = fs::read(&dest).unwrap();
        assert!(bytes.starts_with(BOM));
        assert_eq!(&bytes[BOM.len()..], content.as_bytes());
    }

    #[test]
    fn test_export_selection_order_is_irrelevant() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("people.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "id,name,email\n1,Alice,a@x.org\n2,Bob,b@x.org\n3,Carol,c@x.org\n").unwrap();

        let rows = export(&src, &selection(&["email", "id"]), &dest).unwrap();
        assert_eq!(rows, 3);

        let text = fs::read_to_string(&dest).unwrap();
        assert_eq!(
            text,
            "\u{feff}id,email\r\n1,a@x.org\r\n2,b@x.org\r\n3,c@x.org\r\n"
        );
    }

    #[test]
    fn test_export_rereads_header() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("people.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "id,name,email\n1,Alice,a@x.org\n").unwrap();
        let header = load(&src).unwrap();

        // The file loses a column between load and export.
        fs::write(&src, "id,name\n1,Alice\n").unwrap();
        let err = export(&src, &SelectionSet::all(&header), &dest).unwrap_err();

        assert!(matches!(err, ExportError::Selection(_)));
        assert_eq!(err.category(), ErrorCategory::SelectionStale);
        assert!(!dest.exists());
    }

    #[test]
    fn test_export_empty_selection() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.csv");
        fs::write(&src, "a\n1\n").unwrap();

        let err = export(&src, &SelectionSet::new(), &dir.path().join("out.csv")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::SelectionEmpty);
    }

    #[test]
    fn test_export_malformed_row() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "a,b\n1,2\n3\n").unwrap();

        let err = export(&src, &selection(&["b"]), &dest).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedRow);
        assert!(err.to_string().contains("data row 2"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_export_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.csv");
        fs::write(&src, "a\n1\n").unwrap();

        let dest = dir.path().join("missing-dir").join("out.csv");
        let err = export(&src, &selection(&["a"]), &dest).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::DestinationNotWritable);
    }

    #[test]
    fn test_export_split_summary() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("nums.csv");
        let dest = dir.path().join("nums_out.csv");
        fs::write(&src, "n,sq\n1,1\n2,4\n3,9\n4,16\n5,25\n").unwrap();

        let options = ExportOptions {
            rows_per_file: Some(2),
            ..ExportOptions::default()
        };
        let summary = export_with_options(&src, &selection(&["sq"]), &dest, &options).unwrap();

        assert_eq!(summary.rows_written, 5);
        assert_eq!(summary.columns, vec!["sq"]);
        assert_eq!(
            summary.outputs,
            vec![
                dir.path().join("nums_out_part1.csv"),
                dir.path().join("nums_out_part2.csv"),
                dir.path().join("nums_out_part3.csv"),
            ]
        );
        let last = fs::read_to_string(&summary.outputs[2]).unwrap();
        assert_eq!(last, "\u{feff}sq\r\n25\r\n");
    }

    #[test]
    fn test_export_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("gaps.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "a,b\n1,2\n\n3,4\n").unwrap();

        let rows = export(&src, &selection(&["b"]), &dest).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "\u{feff}b\r\n2\r\n4\r\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_export_mode_matches_plain_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "a,b\n1,2\n").unwrap();

        export(&src, &selection(&["b"]), &dest).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&dest), mode(&src));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/people.csv")),
            PathBuf::from("/data/selected_people.csv")
        );
        assert_eq!(
            default_output_path(Path::new("people.csv")),
            PathBuf::from("selected_people.csv")
        );
    }
}
