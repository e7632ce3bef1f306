//! Encoding and decoding helpers between the domain types and the plain
//! column representations stored in SQLite.
//!
//! Dates are stored as ISO-8601 `YYYY-MM-DD` strings, language lists as a
//! compact JSON array and author roles by their catalog spelling. Integer
//! ids come back from SQLite as `i64` and are range-checked into the typed
//! aliases.

use chrono::NaiveDate;
use nvg_core::catalog::{
  Attribution, AuthorId, AuthorRole, CategoryId, CategoryKind, FileEntry,
  FileId, MemoryRequired, StoredFile,
};

use crate::{Error, Result};

// ─── Ids ─────────────────────────────────────────────────────────────────────

fn checked<T: TryFrom<i64>>(kind: &'static str, value: i64) -> Result<T> {
  T::try_from(value)
    .map_err(|_| nvg_core::Error::IdOutOfRange { kind, value }.into())
}

pub fn decode_file_id(value: i64) -> Result<FileId> { checked("file", value) }

pub fn decode_author_id(value: i64) -> Result<AuthorId> {
  checked("author", value)
}

pub fn decode_category_id(kind: CategoryKind, value: i64) -> Result<CategoryId> {
  match kind {
    CategoryKind::FileType => checked("file type", value),
    CategoryKind::PublicationType => checked("publication type", value),
  }
}

// ─── Category tables ─────────────────────────────────────────────────────────

pub fn category_table(kind: CategoryKind) -> &'static str {
  match kind {
    CategoryKind::FileType => "file_types",
    CategoryKind::PublicationType => "publication_types",
  }
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Languages ───────────────────────────────────────────────────────────────

pub fn encode_languages(codes: &[String]) -> Result<String> {
  Ok(serde_json::to_string(codes)?)
}

pub fn decode_languages(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── MemoryRequired ──────────────────────────────────────────────────────────

pub fn decode_memory(value: i64) -> Result<MemoryRequired> {
  let kilobytes = u16::try_from(value).map_err(|_| Error::InvalidValue {
    column: "memory_required",
    value:  value.to_string(),
  })?;
  Ok(MemoryRequired::try_from(kilobytes)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// The column values of a `files` row, ready to bind as parameters.
pub struct EncodedFile {
  pub filepath:            String,
  pub size:                i64,
  pub title:               Option<String>,
  pub company:             Option<String>,
  pub year:                Option<i32>,
  pub languages:           String,
  pub type_id:             Option<CategoryId>,
  pub subtype:             Option<String>,
  pub title_screen:        Option<String>,
  pub cheat_mode:          Option<String>,
  pub protected:           Option<String>,
  pub problems:            Option<String>,
  pub upload_date:         Option<String>,
  pub uploader:            Option<String>,
  pub comments:            Option<String>,
  pub original_title:      Option<String>,
  pub publication_type_id: Option<CategoryId>,
  pub publisher_code:      Option<String>,
  pub barcode:             Option<String>,
  pub dl_code:             Option<String>,
  pub memory_required:     Option<u16>,
  pub protection:          Option<String>,
  pub run_command:         Option<String>,
  pub external_id:         Option<u32>,
}

impl EncodedFile {
  pub fn new(entry: FileEntry) -> Result<Self> {
    let size = i64::try_from(entry.size).map_err(|_| Error::InvalidValue {
      column: "size",
      value:  entry.size.to_string(),
    })?;

    Ok(Self {
      languages: encode_languages(&entry.languages)?,
      filepath: entry.path,
      size,
      title: entry.title,
      company: entry.company,
      year: entry.year,
      type_id: entry.type_id,
      subtype: entry.subtype,
      title_screen: entry.title_screen,
      cheat_mode: entry.cheat_mode,
      protected: entry.protected,
      problems: entry.problems,
      upload_date: entry.upload_date.map(encode_date),
      uploader: entry.uploader,
      comments: entry.comments,
      original_title: entry.original_title,
      publication_type_id: entry.publication_type_id,
      publisher_code: entry.publisher_code,
      barcode: entry.barcode,
      dl_code: entry.download_code,
      memory_required: entry.memory_required.map(MemoryRequired::kilobytes),
      protection: entry.protection,
      run_command: entry.run_command,
      external_id: entry.external_id,
    })
  }
}

/// Column list shared by every `files` SELECT, in [`RawFile`] field order.
pub const FILE_COLUMNS: &str = "file_id, filepath, size, title, company, year, \
  languages, type_id, subtype, title_screen, cheat_mode, protected, problems, \
  upload_date, uploader, comments, original_title, publication_type_id, \
  publisher_code, barcode, dl_code, memory_required, protection, run_command, \
  external_id";

/// Raw values read directly from a `files` row.
pub struct RawFile {
  pub file_id:             i64,
  pub filepath:            String,
  pub size:                i64,
  pub title:               Option<String>,
  pub company:             Option<String>,
  pub year:                Option<i32>,
  pub languages:           String,
  pub type_id:             Option<i64>,
  pub subtype:             Option<String>,
  pub title_screen:        Option<String>,
  pub cheat_mode:          Option<String>,
  pub protected:           Option<String>,
  pub problems:            Option<String>,
  pub upload_date:         Option<String>,
  pub uploader:            Option<String>,
  pub comments:            Option<String>,
  pub original_title:      Option<String>,
  pub publication_type_id: Option<i64>,
  pub publisher_code:      Option<String>,
  pub barcode:             Option<String>,
  pub dl_code:             Option<String>,
  pub memory_required:     Option<i64>,
  pub protection:          Option<String>,
  pub run_command:         Option<String>,
  pub external_id:         Option<i64>,
}

impl RawFile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      file_id:             row.get(0)?,
      filepath:            row.get(1)?,
      size:                row.get(2)?,
      title:               row.get(3)?,
      company:             row.get(4)?,
      year:                row.get(5)?,
      languages:           row.get(6)?,
      type_id:             row.get(7)?,
      subtype:             row.get(8)?,
      title_screen:        row.get(9)?,
      cheat_mode:          row.get(10)?,
      protected:           row.get(11)?,
      problems:            row.get(12)?,
      upload_date:         row.get(13)?,
      uploader:            row.get(14)?,
      comments:            row.get(15)?,
      original_title:      row.get(16)?,
      publication_type_id: row.get(17)?,
      publisher_code:      row.get(18)?,
      barcode:             row.get(19)?,
      dl_code:             row.get(20)?,
      memory_required:     row.get(21)?,
      protection:          row.get(22)?,
      run_command:         row.get(23)?,
      external_id:         row.get(24)?,
    })
  }

  pub fn into_stored(self) -> Result<StoredFile> {
    let size = u64::try_from(self.size).map_err(|_| Error::InvalidValue {
      column: "size",
      value:  self.size.to_string(),
    })?;
    let external_id = self
      .external_id
      .map(|v| {
        u32::try_from(v).map_err(|_| Error::InvalidValue {
          column: "external_id",
          value:  v.to_string(),
        })
      })
      .transpose()?;

    let entry = FileEntry {
      path: self.filepath,
      size,
      title: self.title,
      company: self.company,
      year: self.year,
      languages: decode_languages(&self.languages)?,
      type_id: self
        .type_id
        .map(|v| decode_category_id(CategoryKind::FileType, v))
        .transpose()?,
      subtype: self.subtype,
      title_screen: self.title_screen,
      cheat_mode: self.cheat_mode,
      protected: self.protected,
      problems: self.problems,
      upload_date: self.upload_date.as_deref().map(decode_date).transpose()?,
      uploader: self.uploader,
      comments: self.comments,
      original_title: self.original_title,
      publication_type_id: self
        .publication_type_id
        .map(|v| decode_category_id(CategoryKind::PublicationType, v))
        .transpose()?,
      publisher_code: self.publisher_code,
      barcode: self.barcode,
      download_code: self.dl_code,
      memory_required: self.memory_required.map(decode_memory).transpose()?,
      protection: self.protection,
      run_command: self.run_command,
      external_id,
    };

    Ok(StoredFile { id: decode_file_id(self.file_id)?, entry })
  }
}

/// Raw values read directly from a `file_authors` row.
pub struct RawAttribution {
  pub file_id:      i64,
  pub author_id:    i64,
  pub author_role:  String,
  pub author_index: i64,
}

impl RawAttribution {
  pub fn into_attribution(self) -> Result<Attribution> {
    let position = u16::try_from(self.author_index).map_err(|_| Error::InvalidValue {
      column: "author_index",
      value:  self.author_index.to_string(),
    })?;
    Ok(Attribution {
      file_id: decode_file_id(self.file_id)?,
      author_id: decode_author_id(self.author_id)?,
      role: AuthorRole::parse(&self.author_role)?,
      position,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_use_iso_format() {
    let date = NaiveDate::from_ymd_opt(2003, 2, 1).unwrap();
    assert_eq!(encode_date(date), "2003-02-01");
    assert_eq!(decode_date("2003-02-01").unwrap(), date);
    assert!(decode_date("01/02/2003").is_err());
  }

  #[test]
  fn category_ids_are_range_checked() {
    assert_eq!(decode_category_id(CategoryKind::FileType, 255).unwrap(), 255);
    let err = decode_category_id(CategoryKind::PublicationType, 256).unwrap_err();
    assert!(matches!(
      err,
      Error::Core(nvg_core::Error::IdOutOfRange { kind: "publication type", value: 256 })
    ));
  }

  #[test]
  fn memory_rejects_unknown_sizes() {
    assert_eq!(decode_memory(64).unwrap(), MemoryRequired::K64);
    assert!(matches!(decode_memory(96), Err(Error::Core(_))));
    assert!(matches!(decode_memory(-1), Err(Error::InvalidValue { .. })));
  }
}
