//! Codec for the delimited-text inputs of the NVG catalog mirror.
//!
//! Three inputs are understood: the main catalog table (one row per archived
//! file), the author-alias table (alias name → real name) and the
//! cross-reference table (path → external id). All have a header row, which
//! is skipped. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use nvg_csv::{SourceEncoding, read_catalog};
//!
//! let input = "Action,File Path,Size,TITLE\n,games/arcade/x.zip,1024,Xevious\n";
//! let catalog = read_catalog(input.as_bytes(), SourceEncoding::Utf8).unwrap();
//! println!("{} files", catalog.len());
//! ```

pub mod error;
mod parse;

use std::{collections::BTreeMap, fs::File, io::Read, path::Path};

pub use error::{Error, Result};
use nvg_core::record::Catalog;
use serde::Deserialize;

// ─── Encodings ───────────────────────────────────────────────────────────────

/// The character encoding of an input file. Older catalog files are Latin-1,
/// newer ones UTF-8; the caller has to know which.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEncoding {
  #[default]
  Latin1,
  Utf8,
}

impl SourceEncoding {
  pub(crate) fn encoding(self) -> &'static encoding_rs::Encoding {
    match self {
      // WHATWG maps ISO-8859-1 onto windows-1252, a strict superset.
      Self::Latin1 => encoding_rs::WINDOWS_1252,
      Self::Utf8 => encoding_rs::UTF_8,
    }
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Decode the main catalog table into records keyed by path.
pub fn read_catalog(reader: impl Read, encoding: SourceEncoding) -> Result<Catalog> {
  parse::catalog(reader, encoding)
}

/// Decode the author-alias table into an `alias → real name` mapping.
pub fn read_author_aliases(
  reader: impl Read,
  encoding: SourceEncoding,
) -> Result<BTreeMap<String, String>> {
  parse::author_aliases(reader, encoding)
}

/// Decode the cross-reference table into a `path → external id` mapping.
///
/// A blank id maps to `None` (unknown) and `0` to `Some(0)` (confirmed
/// absent). Negative or non-numeric ids are reported and treated as unknown.
pub fn read_cross_references(
  reader: impl Read,
  encoding: SourceEncoding,
) -> Result<BTreeMap<String, Option<u32>>> {
  parse::cross_references(reader, encoding)
}

pub fn read_catalog_path(
  path: impl AsRef<Path>,
  encoding: SourceEncoding,
) -> Result<Catalog> {
  read_catalog(open(path.as_ref())?, encoding)
}

pub fn read_author_aliases_path(
  path: impl AsRef<Path>,
  encoding: SourceEncoding,
) -> Result<BTreeMap<String, String>> {
  read_author_aliases(open(path.as_ref())?, encoding)
}

pub fn read_cross_references_path(
  path: impl AsRef<Path>,
  encoding: SourceEncoding,
) -> Result<BTreeMap<String, Option<u32>>> {
  read_cross_references(open(path.as_ref())?, encoding)
}

fn open(path: &Path) -> Result<File> {
  File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })
}
