//! Destination writers for projected records.
//!
//! A [`RecordSink`] encodes records in one output format. An [`OutputSet`]
//! owns the destination file(s): it stages them in temporary files next to
//! the destination, rotates to a new part when a split size is reached,
//! and moves everything into place in [`OutputSet::finish`]. Dropping an
//! unfinished `OutputSet` removes the staged files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::{Map, Value};
use tempfile::{Builder, NamedTempFile, TempPath};

use crate::error::{TransformError, TransformResult};
use crate::models::{ExportOptions, OutputFormat};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// =============================================================================
// Record Sinks
// =============================================================================

/// Encodes a header plus data records into `W`.
pub enum RecordSink<W: Write> {
    Csv(csv::Writer<W>),
    Json {
        out: W,
        names: Vec<String>,
        rows: u64,
    },
}

impl<W: Write> RecordSink<W> {
    /// Start a sink and write the header (CSV) or the opening bracket (JSON).
    pub fn begin(format: OutputFormat, mut out: W, names: &[String]) -> io::Result<Self> {
        match format {
            OutputFormat::Csv => {
                out.write_all(UTF8_BOM)?;
                let mut writer = WriterBuilder::new()
                    .delimiter(b',')
                    .quote(b'"')
                    .quote_style(QuoteStyle::Necessary)
                    .terminator(Terminator::CRLF)
                    .from_writer(out);
                writer.write_record(names)?;
                Ok(RecordSink::Csv(writer))
            }
            OutputFormat::Json => {
                out.write_all(b"[")?;
                Ok(RecordSink::Json {
                    out,
                    names: names.to_vec(),
                    rows: 0,
                })
            }
        }
    }

    pub fn write_row(&mut self, fields: &[&str]) -> io::Result<()> {
        match self {
            RecordSink::Csv(writer) => writer.write_record(fields).map_err(io::Error::from),
            RecordSink::Json { out, names, rows } => {
                let object: Map<String, Value> = names
                    .iter()
                    .zip(fields)
                    .map(|(name, field)| (name.clone(), Value::String(field.to_string())))
                    .collect();
                let separator: &[u8] = if *rows == 0 { b"\n  " } else { b",\n  " };
                out.write_all(separator)?;
                serde_json::to_writer(&mut *out, &object)?;
                *rows += 1;
                Ok(())
            }
        }
    }

    /// Flush everything and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            RecordSink::Csv(writer) => {
                let mut out = writer.into_inner().map_err(|e| e.into_error())?;
                out.flush()?;
                Ok(out)
            }
            RecordSink::Json { mut out, rows, .. } => {
                let closing: &[u8] = if rows == 0 { b"]\n" } else { b"\n]\n" };
                out.write_all(closing)?;
                out.flush()?;
                Ok(out)
            }
        }
    }
}

// =============================================================================
// Output Set
// =============================================================================

/// One destination file being written.
struct Part {
    sink: RecordSink<BufWriter<File>>,
    /// Set while the file lives under a temporary name.
    staged: Option<TempPath>,
    rows: u64,
}

/// All files produced by one export.
pub struct OutputSet {
    destination: PathBuf,
    format: OutputFormat,
    split: Option<usize>,
    atomic: bool,
    names: Vec<String>,
    current: Part,
    /// Closed parts, still under their staged names.
    closed: Vec<Option<TempPath>>,
}

impl OutputSet {
    /// Open the first output file and write the header.
    pub fn create(destination: &Path, options: &ExportOptions, names: Vec<String>) -> TransformResult<Self> {
        let split = options.split_size();
        // Part names are only known at the end, so splits always stage.
        let atomic = options.atomic || split.is_some();
        let current = open_part(destination, options.format, atomic, &names)?;
        Ok(Self {
            destination: destination.to_path_buf(),
            format: options.format,
            split,
            atomic,
            names,
            current,
            closed: Vec::new(),
        })
    }

    pub fn write_row(&mut self, fields: &[&str]) -> TransformResult<()> {
        if let Some(limit) = self.split {
            if self.current.rows >= limit as u64 {
                self.rotate()?;
            }
        }

        self.current
            .sink
            .write_row(fields)
            .map_err(|e| TransformError::not_writable(&self.destination, e))?;
        self.current.rows += 1;
        Ok(())
    }

    /// Close the last part and move every part to its final name.
    pub fn finish(self) -> TransformResult<Vec<PathBuf>> {
        let Self {
            destination,
            current,
            mut closed,
            ..
        } = self;
        closed.push(close_part(&destination, current)?);

        let count = closed.len();
        let mut outputs = Vec::with_capacity(count);
        for (k, staged) in closed.into_iter().enumerate() {
            let target = if count == 1 {
                destination.clone()
            } else {
                part_path(&destination, k + 1)
            };
            if let Some(staged) = staged {
                staged
                    .persist(&target)
                    .map_err(|e| TransformError::not_writable(&target, e))?;
            }
            outputs.push(target);
        }
        Ok(outputs)
    }

    fn rotate(&mut self) -> TransformResult<()> {
        let next = open_part(&self.destination, self.format, self.atomic, &self.names)?;
        let done = std::mem::replace(&mut self.current, next);
        self.closed.push(close_part(&self.destination, done)?);
        Ok(())
    }
}

fn open_part(destination: &Path, format: OutputFormat, atomic: bool, names: &[String]) -> TransformResult<Part> {
    let (file, staged) = if atomic {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let (file, path) = staging_file(dir, destination)
            .map_err(|e| TransformError::not_writable(destination, e))?
            .into_parts();
        (file, Some(path))
    } else {
        let file = File::create(destination).map_err(|e| TransformError::not_writable(destination, e))?;
        (file, None)
    };

    let sink = RecordSink::begin(format, BufWriter::new(file), names)
        .map_err(|e| TransformError::not_writable(destination, e))?;
    Ok(Part { sink, staged, rows: 0 })
}

/// A temp file in `dir` that ends up with the mode a plain create would give.
///
/// An existing destination keeps its own permissions when it is replaced.
fn staging_file(dir: &Path, destination: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".colsplit-");
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        // Subject to the umask, like `File::create`.
        builder.permissions(Permissions::from_mode(0o666));
    }

    let file = builder.tempfile_in(dir)?;
    if let Ok(existing) = fs::metadata(destination) {
        file.as_file().set_permissions(existing.permissions())?;
    }
    Ok(file)
}

fn close_part(destination: &Path, part: Part) -> TransformResult<Option<TempPath>> {
    part.sink
        .finish()
        .map_err(|e| TransformError::not_writable(destination, e))?;
    Ok(part.staged)
}

/// `<stem>_part<k>.<ext>` next to `destination`.
pub fn part_path(destination: &Path, k: usize) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let name = match destination.extension() {
        Some(ext) => format!("{}_part{}.{}", stem, k, ext.to_string_lossy()),
        None => format!("{}_part{}", stem, k),
    };
    destination.with_file_name(name)
}
