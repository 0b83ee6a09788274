//! Projection of source rows onto the selected columns.
//!
//! - [`transform`] / [`transform_text`]: stream the data records of a
//!   source into the destination, one projected record at a time
//! - [`writer`]: output formats and destination file handling
//! - [`pipeline`]: the `load` / `export` entry points

pub mod pipeline;
pub mod writer;

use std::path::Path;

use csv::StringRecord;

use crate::encoding::Encoding;
use crate::error::{LoadError, TransformError, TransformResult};
use crate::models::{ExportOptions, ExportSummary, IndexMapping};
use crate::parser::SourceText;

pub use pipeline::*;
pub use writer::{part_path, OutputSet, RecordSink};

/// Decode `source` under `encoding` and write its projection to `destination`.
pub fn transform(
    source: &Path,
    encoding: Encoding,
    mapping: &IndexMapping,
    destination: &Path,
    options: &ExportOptions,
) -> TransformResult<ExportSummary> {
    let text = SourceText::read(source, encoding)?;
    transform_text(&text, mapping, destination, options)
}

/// Write the projection of already-decoded source text.
///
/// The first record is the source header and is replaced by the mapping's
/// names. A data row too short for the mapping aborts the whole export;
/// nothing is moved into place in that case (unless `atomic` is off, which
/// leaves the destination incomplete).
pub fn transform_text(
    text: &SourceText,
    mapping: &IndexMapping,
    destination: &Path,
    options: &ExportOptions,
) -> TransformResult<ExportSummary> {
    let mut reader = text.csv_reader();
    let mut record = StringRecord::new();

    let has_header = reader
        .read_record(&mut record)
        .map_err(|e| text.parse_error(e))?;
    if !has_header {
        return Err(LoadError::EmptyFile {
            path: text.path().to_path_buf(),
        }
        .into());
    }

    let names: Vec<String> = mapping.names().map(str::to_string).collect();
    let required = mapping.max_index().map_or(0, |max| max + 1);
    let indices: Vec<usize> = mapping.indices().collect();

    let mut output = OutputSet::create(destination, options, names.clone())?;
    let mut rows_written: u64 = 0;

    while reader
        .read_record(&mut record)
        .map_err(|e| text.parse_error(e))?
    {
        if record.len() < required {
            return Err(TransformError::MalformedRow {
                path: text.path().to_path_buf(),
                row: rows_written + 1,
                line: record.position().map_or(0, |p| p.line()),
                required,
                found: record.len(),
            });
        }

        let fields: Vec<&str> = indices.iter().map(|&i| &record[i]).collect();
        output.write_row(&fields)?;
        rows_written += 1;
    }

    let outputs = output.finish()?;
    Ok(ExportSummary {
        rows_written,
        outputs,
        source_encoding: text.encoding(),
        columns: names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutputFormat, SelectionSet};
    use crate::selection::resolve;
    use std::fs;

    const BOM: &[u8] = b"\xEF\xBB\xBF";

    fn read_output(path: &Path) -> Vec<Vec<String>> {
        let bytes = fs::read(path).unwrap();
        assert!(bytes.starts_with(BOM));
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&bytes[BOM.len()..]);
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    fn mapping_for(header: &[&str], selected: &[&str]) -> IndexMapping {
        let selected: SelectionSet = selected.iter().copied().collect();
        resolve(header, &selected).unwrap()
    }

    #[test]
    fn test_projection_in_source_order() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("people.csv");
        let dest = dir.path().join("out.csv");
        fs::write(
            &src,
            "id,name,email\n1,Alice,alice@example.org\n2,Bob,bob@example.org\n3,\"Carol, Jr.\",carol@example.org\n",
        )
        .unwrap();

        let mapping = mapping_for(&["id", "name", "email"], &["email", "id"]);
        let summary = transform(&src, Encoding::Utf8, &mapping, &dest, &ExportOptions::default()).unwrap();

        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.outputs, vec![dest.clone()]);
        assert_eq!(
            read_output(&dest),
            vec![
                vec!["id", "email"],
                vec!["1", "alice@example.org"],
                vec!["2", "bob@example.org"],
                vec!["3", "carol@example.org"],
            ]
        );
    }

    #[test]
    fn test_quoted_fields_survive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("notes.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "id,note\n1,\"a, b\"\n2,\"say \"\"hi\"\"\"\n3,\"two\nlines\"\n").unwrap();

        let mapping = mapping_for(&["id", "note"], &["note"]);
        transform(&src, Encoding::Utf8, &mapping, &dest, &ExportOptions::default()).unwrap();

        assert_eq!(
            read_output(&dest),
            vec![
                vec!["note"],
                vec!["a, b"],
                vec!["say \"hi\""],
                vec!["two\nlines"],
            ]
        );
    }

    #[test]
    fn test_windows_1252_source_becomes_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("latin.csv");
        let dest = dir.path().join("out.csv");
        // "ville\nMontréal\n"
        let bytes: Vec<u8> = [&b"ville\nMontr"[..], &[0xE9u8][..], &b"al\n"[..]].concat();
        fs::write(&src, bytes).unwrap();

        let mapping = mapping_for(&["ville"], &["ville"]);
        transform(&src, Encoding::Windows1252, &mapping, &dest, &ExportOptions::default()).unwrap();

        assert_eq!(read_output(&dest), vec![vec!["ville"], vec!["Montréal"]]);
    }

    #[test]
    fn test_short_row_aborts_and_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "a,b,c\n1,2,3\n4,5\n6,7,8\n").unwrap();

        let mapping = mapping_for(&["a", "b", "c"], &["a", "c"]);
        let err = transform(&src, Encoding::Utf8, &mapping, &dest, &ExportOptions::default()).unwrap_err();

        match err {
            TransformError::MalformedRow {
                row,
                line,
                required,
                found,
                ..
            } => {
                assert_eq!(row, 2);
                assert_eq!(line, 3);
                assert_eq!(required, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_short_row_beyond_mapping_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("ragged.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "a,b,c\n1,2,3\n4\n5,6,7,8\n").unwrap();

        let mapping = mapping_for(&["a", "b", "c"], &["a"]);
        let summary = transform(&src, Encoding::Utf8, &mapping, &dest, &ExportOptions::default()).unwrap();

        assert_eq!(summary.rows_written, 3);
        assert_eq!(read_output(&dest), vec![vec!["a"], vec!["1"], vec!["4"], vec!["5"]]);
    }

    #[test]
    fn test_existing_destination_untouched_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "a,b\n1\n").unwrap();
        fs::write(&dest, "previous export").unwrap();

        let mapping = mapping_for(&["a", "b"], &["b"]);
        assert!(transform(&src, Encoding::Utf8, &mapping, &dest, &ExportOptions::default()).is_err());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "previous export");
    }

    #[test]
    fn test_header_only_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("header.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "a,b\n").unwrap();

        let mapping = mapping_for(&["a", "b"], &["b"]);
        let summary = transform(&src, Encoding::Utf8, &mapping, &dest, &ExportOptions::default()).unwrap();

        assert_eq!(summary.rows_written, 0);
        assert_eq!(read_output(&dest), vec![vec!["b"]]);
    }

    #[test]
    fn test_empty_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("empty.csv");
        fs::write(&src, "").unwrap();

        let mapping = mapping_for(&["a"], &["a"]);
        let err = transform(&src, Encoding::Utf8, &mapping, &dir.path().join("out.csv"), &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, TransformError::Source(LoadError::EmptyFile { .. })));
    }

    #[test]
    fn test_json_format() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("people.csv");
        let dest = dir.path().join("out.json");
        fs::write(&src, "id,name,email\n1,Alice,a@x.org\n").unwrap();

        let options = ExportOptions {
            format: OutputFormat::Json,
            ..ExportOptions::default()
        };
        let mapping = mapping_for(&["id", "name", "email"], &["name", "id"]);
        transform(&src, Encoding::Utf8, &mapping, &dest, &options).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&dest).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([{ "id": "1", "name": "Alice" }]));
    }

    #[test]
    fn test_in_place_write() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.csv");
        let dest = dir.path().join("out.csv");
        fs::write(&src, "x,y\n1,2\n").unwrap();

        let options = ExportOptions {
            atomic: false,
            ..ExportOptions::default()
        };
        let mapping = mapping_for(&["x", "y"], &["y"]);
        transform(&src, Encoding::Utf8, &mapping, &dest, &options).unwrap();
        assert_eq!(read_output(&dest), vec![vec!["y"], vec!["2"]]);
    }
}
