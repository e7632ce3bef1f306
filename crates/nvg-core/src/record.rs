//! Raw catalog records, as decoded from the delimited-text input and before
//! any normalisation.

use std::collections::BTreeMap;

use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

/// The columns of the main catalog file, in file order. The string form is
/// the header spelling.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  EnumCount,
  EnumIter,
  IntoStaticStr,
)]
pub enum Column {
  #[strum(serialize = "Action")]
  Action,
  #[strum(serialize = "File Path")]
  Path,
  #[strum(serialize = "Size")]
  Size,
  #[strum(serialize = "TITLE")]
  Title,
  #[strum(serialize = "COMPANY")]
  Company,
  #[strum(serialize = "YEAR")]
  Year,
  #[strum(serialize = "LANGUAGE")]
  Language,
  #[strum(serialize = "TYPE")]
  Type,
  #[strum(serialize = "SUBTYPE")]
  Subtype,
  #[strum(serialize = "TITLE SCREEN")]
  TitleScreen,
  #[strum(serialize = "CHEAT MODE")]
  CheatMode,
  #[strum(serialize = "PROTECTED")]
  Protected,
  #[strum(serialize = "PROBLEMS")]
  Problems,
  #[strum(serialize = "Upload Date")]
  UploadDate,
  #[strum(serialize = "Uploader")]
  Uploader,
  #[strum(serialize = "COMMENTS")]
  Comments,
  #[strum(serialize = "ALSO KNOWN AS")]
  AlsoKnownAs,
  #[strum(serialize = "ORIGINAL TITLE")]
  OriginalTitle,
  #[strum(serialize = "PUBLISHER")]
  Publisher,
  #[strum(serialize = "RE-RELEASED BY")]
  ReReleasedBy,
  #[strum(serialize = "PUBLICATION")]
  Publication,
  #[strum(serialize = "PUBLISHER CODE")]
  PublisherCode,
  #[strum(serialize = "BARCODE")]
  Barcode,
  #[strum(serialize = "DL CODE")]
  DownloadCode,
  #[strum(serialize = "CRACKER")]
  Cracker,
  #[strum(serialize = "DEVELOPER")]
  Developer,
  #[strum(serialize = "AUTHOR")]
  Author,
  #[strum(serialize = "DESIGNER")]
  Designer,
  #[strum(serialize = "ARTIST")]
  Artist,
  #[strum(serialize = "MUSICIAN")]
  Musician,
  #[strum(serialize = "MEMORY REQUIRED")]
  MemoryRequired,
  #[strum(serialize = "PROTECTION")]
  Protection,
  #[strum(serialize = "RUN COMMAND")]
  RunCommand,
}

impl Column {
  pub fn header(self) -> &'static str { self.into() }

  /// The column at zero-based position `index` in a catalog row.
  pub fn at(index: usize) -> Option<Self> { Self::iter().nth(index) }
}

/// Number of columns in a complete catalog row.
pub const CATALOG_COLUMNS: usize = Column::COUNT;

/// One catalog row. Only the path and size are mandatory; every other column
/// is present only when the row had a non-empty value for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
  pub path:   String,
  pub size:   u64,
  pub fields: BTreeMap<Column, String>,
}

impl RawRecord {
  pub fn new(path: impl Into<String>, size: u64) -> Self {
    Self { path: path.into(), size, fields: BTreeMap::new() }
  }

  /// Builder-style setter, mostly useful in tests.
  pub fn with(mut self, column: Column, value: impl Into<String>) -> Self {
    self.fields.insert(column, value.into());
    self
  }

  /// The value of `column`, or `None` when the row left it empty.
  pub fn get(&self, column: Column) -> Option<&str> {
    self.fields.get(&column).map(String::as_str)
  }
}

/// A decoded catalog, keyed by archive path.
pub type Catalog = BTreeMap<String, RawRecord>;
