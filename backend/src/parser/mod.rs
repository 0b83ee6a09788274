//! Decoding a source file and reading its header record.
//!
//! The CSV dialect is fixed: comma delimiter, double-quote quoting with
//! doubled quotes as escapes. Quoted fields may span physical lines.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::encoding::{detect_or_default, read_source, Encoding};
use crate::error::{LoadError, LoadResult};

/// A source file decoded into text under a known encoding.
#[derive(Debug, Clone)]
pub struct SourceText {
    path: PathBuf,
    encoding: Encoding,
    text: String,
}

impl SourceText {
    /// Read `path` and decode it completely under `encoding`.
    ///
    /// A leading byte-order mark is dropped for the UTF-8 family so that it
    /// never ends up inside the first column name.
    pub fn read(path: &Path, encoding: Encoding) -> LoadResult<Self> {
        let bytes = read_source(path)?;
        Self::decode(path, encoding, &bytes)
    }

    /// Read `path` once, detect its encoding from those bytes and decode them.
    pub fn open(path: &Path) -> LoadResult<Self> {
        let bytes = read_source(path)?;
        let encoding = detect_or_default(path, &bytes);
        Self::decode(path, encoding, &bytes)
    }

    fn decode(path: &Path, encoding: Encoding, bytes: &[u8]) -> LoadResult<Self> {
        let text = encoding
            .decode(bytes)
            .ok_or_else(|| LoadError::NoDecodableEncoding {
                path: path.to_path_buf(),
                encoding,
            })?;

        let text = match text {
            Cow::Borrowed(s) => s.to_string(),
            Cow::Owned(s) => s,
        };
        let text = if encoding.is_utf8_family() {
            match text.strip_prefix('\u{feff}') {
                Some(rest) => rest.to_string(),
                None => text,
            }
        } else {
            text
        };

        Ok(Self {
            path: path.to_path_buf(),
            encoding,
            text,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// A CSV reader over the decoded text, header included as a plain record.
    pub fn csv_reader(&self) -> csv::Reader<&[u8]> {
        csv_reader_builder().from_reader(self.text.as_bytes())
    }

    /// The first record, or [`LoadError::EmptyFile`] when there is none.
    pub fn header(&self) -> LoadResult<Vec<String>> {
        let mut reader = self.csv_reader();
        let mut record = StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(true) => Ok(record.iter().map(str::to_string).collect()),
            Ok(false) => Err(LoadError::EmptyFile {
                path: self.path.clone(),
            }),
            Err(e) => Err(self.parse_error(e)),
        }
    }

    /// Map a CSV codec failure onto the load taxonomy.
    pub(crate) fn parse_error(&self, err: csv::Error) -> LoadError {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => LoadError::not_readable(&self.path, source),
            // The reader only sees already-decoded text, so anything else is an
            // encoding mismatch between detection and the bytes on disk.
            _ => LoadError::NoDecodableEncoding {
                path: self.path.clone(),
                encoding: self.encoding,
            },
        }
    }
}

/// Reader settings shared by header and data passes.
///
/// Rows may have differing lengths; short rows are reported by the
/// transformer with their row number instead of as a codec error.
pub(crate) fn csv_reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(b',')
        .quote(b'"')
        .double_quote(true)
        .has_headers(false)
        .flexible(true);
    builder
}

/// Read the header of `path` under `encoding`.
pub fn read_header(path: &Path, encoding: Encoding) -> LoadResult<Vec<String>> {
    SourceText::read(path, encoding)?.header()
}
