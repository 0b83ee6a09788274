//! Source encoding detection by exhaustive trial decoding.
//!
//! Candidates are tried in a fixed order and the first one that decodes
//! the *whole* file without error wins. ISO-8859-1 accepts any byte
//! sequence, so in practice detection always succeeds; the earlier
//! candidates exist so that stricter, more standard encodings are
//! preferred whenever they fit.
//!
//! # Example
//! ```ignore
//! use colsplit::encoding::{detect_bytes, Encoding};
//!
//! assert_eq!(detect_bytes(b"id,name\n1,Alice\n"), Some(Encoding::Utf8));
//! assert_eq!(detect_bytes(&[0x63, 0x61, 0x66, 0xE9]), Some(Encoding::Windows1252));
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

use crate::error::{LoadError, LoadResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Bytes with no character assigned in Windows-1252.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// A text encoding the pipeline can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    Utf8,
    Utf8Bom,
    Windows1252,
    Iso88591,
    Ascii,
}

/// Candidates in detection order.
pub const CANDIDATES: [Encoding; 5] = [
    Encoding::Utf8,
    Encoding::Utf8Bom,
    Encoding::Windows1252,
    Encoding::Iso88591,
    Encoding::Ascii,
];

/// Encoding used for every exported CSV file.
pub const OUTPUT_ENCODING: Encoding = Encoding::Utf8Bom;

impl Encoding {
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf8Bom => "utf-8-sig",
            Encoding::Windows1252 => "windows-1252",
            Encoding::Iso88591 => "iso-8859-1",
            Encoding::Ascii => "us-ascii",
        }
    }

    /// Decode `bytes` completely, or return `None` on the first invalid sequence.
    ///
    /// A leading UTF-8 byte-order mark is kept by `Utf8` (as U+FEFF) and
    /// stripped by `Utf8Bom`.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            Encoding::Utf8 => encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes),
            Encoding::Utf8Bom => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(body)
            }
            Encoding::Windows1252 => {
                // encoding_rs follows WHATWG and maps the undefined bytes to C1 controls.
                if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
                    return None;
                }
                encoding_rs::WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
            }
            // encoding_rs aliases latin1 to windows-1252, so map bytes to code points directly.
            Encoding::Iso88591 => Some(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
            Encoding::Ascii => {
                if bytes.is_ascii() {
                    std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
                } else {
                    None
                }
            }
        }
    }

    /// Whether this is UTF-8 with or without a byte-order mark.
    pub fn is_utf8_family(&self) -> bool {
        matches!(self, Encoding::Utf8 | Encoding::Utf8Bom)
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Return the first candidate that decodes all of `bytes`.
pub fn detect_bytes(bytes: &[u8]) -> Option<Encoding> {
    CANDIDATES.into_iter().find(|encoding| {
        let ok = encoding.decode(bytes).is_some();
        tracing::debug!(encoding = %encoding, ok, "trial decode");
        ok
    })
}

/// Detect the encoding of the file at `path`.
///
/// Falls back to UTF-8 when no candidate fits; the failure then surfaces
/// as [`LoadError::NoDecodableEncoding`] when the file is actually read.
pub fn detect(path: &Path) -> LoadResult<Encoding> {
    let bytes = read_source(path)?;
    Ok(detect_or_default(path, &bytes))
}

/// [`detect_bytes`] with the UTF-8 fallback, for bytes already read from `path`.
pub(crate) fn detect_or_default(path: &Path, bytes: &[u8]) -> Encoding {
    detect_bytes(bytes).unwrap_or_else(|| {
        tracing::warn!(path = %path.display(), "no candidate encoding fits, assuming utf-8");
        Encoding::Utf8
    })
}

/// Read the raw bytes of a source file.
pub(crate) fn read_source(path: &Path) -> LoadResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| LoadError::not_readable(path, e))
}
