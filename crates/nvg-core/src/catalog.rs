//! Catalog entities: the typed, normalised shape of everything the
//! reconciliation mirrors into the store.
//!
//! A [`FileEntry`] is keyed by its archive path. Its multi-valued attributes
//! (author attributions and title aliases) live in their own tables and are
//! modelled separately as [`Attribution`] and [`TitleAlias`].

use chrono::NaiveDate;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result, record::Column};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned identifier of a [`FileEntry`]; permanent once assigned.
pub type FileId = u32;

/// Identifier of an [`Author`].
pub type AuthorId = u16;

/// Identifier of a [`Category`]; valid values are `1..=255`.
pub type CategoryId = u8;

// ─── Memory requirement ──────────────────────────────────────────────────────

/// The amount of RAM a program needs. Only three values occur on the
/// machines the archive covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRequired {
  K64,
  K128,
  K256,
}

impl MemoryRequired {
  pub fn kilobytes(self) -> u16 {
    match self {
      Self::K64 => 64,
      Self::K128 => 128,
      Self::K256 => 256,
    }
  }
}

impl TryFrom<u16> for MemoryRequired {
  type Error = Error;

  fn try_from(kilobytes: u16) -> Result<Self> {
    match kilobytes {
      64 => Ok(Self::K64),
      128 => Ok(Self::K128),
      256 => Ok(Self::K256),
      other => Err(Error::InvalidMemory(other)),
    }
  }
}

// ─── Author roles ────────────────────────────────────────────────────────────

/// The capacity in which an author is credited on a file.
///
/// The string form is the catalog column spelling, which is also what the
/// store persists.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
pub enum AuthorRole {
  #[strum(serialize = "PUBLISHER")]
  Publisher,
  #[strum(serialize = "RE-RELEASED BY")]
  ReReleasedBy,
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
}

impl AuthorRole {
  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse the stored spelling of a role.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::UnknownAuthorRole(s.to_owned()))
  }

  /// The catalog column holding this role's comma-separated name list.
  pub fn column(self) -> Column {
    match self {
      Self::Publisher => Column::Publisher,
      Self::ReReleasedBy => Column::ReReleasedBy,
      Self::Cracker => Column::Cracker,
      Self::Developer => Column::Developer,
      Self::Author => Column::Author,
      Self::Designer => Column::Designer,
      Self::Artist => Column::Artist,
      Self::Musician => Column::Musician,
    }
  }
}

// ─── Categories ──────────────────────────────────────────────────────────────

/// The two open vocabularies a [`FileEntry`] references by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CategoryKind {
  #[strum(serialize = "file type")]
  FileType,
  #[strum(serialize = "publication type")]
  PublicationType,
}

impl CategoryKind {
  /// The catalog column the vocabulary is drawn from.
  pub fn column(self) -> Column {
    match self {
      Self::FileType => Column::Type,
      Self::PublicationType => Column::Publication,
    }
  }
}

/// A row of a category vocabulary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
  pub id:          CategoryId,
  pub description: String,
}

// ─── Authors ─────────────────────────────────────────────────────────────────

/// A named author identity. Authors are never deleted; only the alias link
/// changes over time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
  pub id:       AuthorId,
  pub name:     String,
  /// The author this name is an alias of. Never equal to `id`.
  pub alias_of: Option<AuthorId>,
}

// ─── Languages ───────────────────────────────────────────────────────────────

/// An IETF-style language tag and its human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
  pub code: String,
  pub name: String,
}

// ─── FileEntry ───────────────────────────────────────────────────────────────

/// One archived file, fully normalised.
///
/// Equality compares every column, which is what decides whether a stored
/// row needs rewriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
  pub path:                String,
  pub size:                u64,
  pub title:               Option<String>,
  pub company:             Option<String>,
  pub year:                Option<i32>,
  /// Language codes in catalog order, without duplicates. Empty means the
  /// languages are unknown.
  pub languages:           Vec<String>,
  pub type_id:             Option<CategoryId>,
  pub subtype:             Option<String>,
  pub title_screen:        Option<String>,
  pub cheat_mode:          Option<String>,
  pub protected:           Option<String>,
  pub problems:            Option<String>,
  pub upload_date:         Option<NaiveDate>,
  pub uploader:            Option<String>,
  pub comments:            Option<String>,
  pub original_title:      Option<String>,
  pub publication_type_id: Option<CategoryId>,
  pub publisher_code:      Option<String>,
  pub barcode:             Option<String>,
  pub download_code:       Option<String>,
  pub memory_required:     Option<MemoryRequired>,
  pub protection:          Option<String>,
  pub run_command:         Option<String>,
  /// Cross-reference into an external catalog. `None` is unknown;
  /// `Some(0)` means the file is confirmed to have no counterpart.
  pub external_id:         Option<u32>,
}

impl FileEntry {
  /// An entry with only the required attributes set.
  pub fn new(path: impl Into<String>, size: u64) -> Self {
    Self { path: path.into(), size, ..Self::default() }
  }
}

/// A [`FileEntry`] together with the id the store assigned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
  pub id:    FileId,
  pub entry: FileEntry,
}

// ─── Multi-valued associations ───────────────────────────────────────────────

/// One credited author of a file. `position` orders the authors within a
/// `(file_id, role)` group, starting at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
  pub file_id:   FileId,
  pub author_id: AuthorId,
  pub role:      AuthorRole,
  pub position:  u16,
}

/// An alternative title a file is also known by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleAlias {
  pub file_id: FileId,
  pub title:   String,
}
