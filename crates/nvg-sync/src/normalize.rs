//! Record normaliser: [`RawRecord`] → [`NormalizedRecord`].
//!
//! Pure with respect to its inputs. Recoverable field problems are logged
//! and the field dropped; an author name with no id is fatal.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use nvg_core::{
  catalog::{AuthorId, AuthorRole, CategoryId, CategoryKind, FileEntry, MemoryRequired},
  record::{Catalog, Column, RawRecord},
};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::{Error, Result, resolve::name_order};

// ─── Sentinels and corrections ───────────────────────────────────────────────

/// Marks a field as unknown in the uploader and comments columns.
const UNKNOWN: &str = "?";

/// Marks a field as not applicable in the type through problems columns.
const NOT_APPLICABLE: &str = "-";

pub fn is_not_applicable(value: &str) -> bool { value == NOT_APPLICABLE }

/// File types that were historically spelled more than one way.
const FILE_TYPE_CORRECTIONS: &[(&str, &str)] = &[
  ("Games compilation", "Compilation"),
  ("Sport game", "Sports game"),
  ("Util", "Utility"),
  ("UTILITY", "Utility"),
  ("Utilities", "Utility"),
];

/// Publication types have no known misspellings yet.
const PUBLICATION_TYPE_CORRECTIONS: &[(&str, &str)] = &[];

/// The canonical spelling of a category description.
pub fn correct_category(kind: CategoryKind, value: &str) -> &str {
  let table = match kind {
    CategoryKind::FileType => FILE_TYPE_CORRECTIONS,
    CategoryKind::PublicationType => PUBLICATION_TYPE_CORRECTIONS,
  };
  table
    .iter()
    .find(|(wrong, _)| *wrong == value)
    .map_or(value, |(_, right)| *right)
}

/// Split a comma-separated name list, trimming each name and skipping
/// empty ones.
pub fn split_names(value: &str) -> impl Iterator<Item = &str> {
  value.split(',').map(str::trim).filter(|name| !name.is_empty())
}

// ─── Vocabulary ──────────────────────────────────────────────────────────────

/// The resolved name → id maps a record is normalised against.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary<'a> {
  pub file_types:        &'a BTreeMap<String, CategoryId>,
  pub publication_types: &'a BTreeMap<String, CategoryId>,
  pub authors:           &'a BTreeMap<String, AuthorId>,
  /// Catalog language name → code.
  pub languages:         &'a BTreeMap<String, String>,
}

impl Vocabulary<'_> {
  fn categories(&self, kind: CategoryKind) -> &BTreeMap<String, CategoryId> {
    match kind {
      CategoryKind::FileType => self.file_types,
      CategoryKind::PublicationType => self.publication_types,
    }
  }
}

// ─── Normalised record ───────────────────────────────────────────────────────

/// A catalog row in canonical form, with its multi-valued attributes split
/// out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
  pub entry:         FileEntry,
  /// Credited authors per role, in catalog order. Roles with no names are
  /// absent.
  pub authors:       BTreeMap<AuthorRole, Vec<AuthorId>>,
  /// Alternative titles, sorted case-insensitively.
  pub title_aliases: Vec<String>,
}

/// Normalise every record of `catalog`.
///
/// `external_ids` is the cross-reference table, or `None` when it was not
/// available, in which case every entry's `external_id` is left unknown.
pub fn normalize_all(
  catalog: &Catalog,
  vocabulary: Vocabulary<'_>,
  external_ids: Option<&BTreeMap<String, Option<u32>>>,
) -> Result<BTreeMap<String, NormalizedRecord>> {
  catalog
    .iter()
    .map(|(path, raw)| {
      let external_id = external_ids.and_then(|ids| ids.get(path).copied().flatten());
      Ok((path.clone(), normalize(raw, vocabulary, external_id)?))
    })
    .collect()
}

/// Normalise a single record.
pub fn normalize(
  raw: &RawRecord,
  vocabulary: Vocabulary<'_>,
  external_id: Option<u32>,
) -> Result<NormalizedRecord> {
  let path = raw.path.as_str();
  let text = |column| raw.get(column).map(str::to_owned);
  let applicable = |column| {
    raw
      .get(column)
      .filter(|v| !is_not_applicable(v))
      .map(str::to_owned)
  };
  let known = |column| raw.get(column).filter(|v| *v != UNKNOWN).map(str::to_owned);

  let entry = FileEntry {
    path: raw.path.clone(),
    size: raw.size,
    title: text(Column::Title),
    company: text(Column::Company),
    year: raw.get(Column::Year).and_then(parse_year),
    languages: raw
      .get(Column::Language)
      .map(|v| parse_languages(path, v, vocabulary.languages))
      .unwrap_or_default(),
    type_id: category(raw, CategoryKind::FileType, vocabulary)?,
    subtype: applicable(Column::Subtype),
    title_screen: applicable(Column::TitleScreen),
    cheat_mode: applicable(Column::CheatMode),
    protected: applicable(Column::Protected),
    problems: applicable(Column::Problems),
    upload_date: raw
      .get(Column::UploadDate)
      .and_then(|v| parse_upload_date(path, v)),
    uploader: known(Column::Uploader),
    comments: known(Column::Comments),
    original_title: text(Column::OriginalTitle),
    publication_type_id: category(raw, CategoryKind::PublicationType, vocabulary)?,
    publisher_code: text(Column::PublisherCode),
    barcode: text(Column::Barcode),
    download_code: text(Column::DownloadCode),
    memory_required: raw
      .get(Column::MemoryRequired)
      .and_then(|v| parse_memory(path, v)),
    protection: text(Column::Protection),
    run_command: text(Column::RunCommand),
    external_id,
  };

  let mut authors = BTreeMap::new();
  for role in AuthorRole::iter() {
    let Some(value) = raw.get(role.column()) else {
      continue;
    };
    let ids = author_ids(path, role, value, vocabulary.authors)?;
    if !ids.is_empty() {
      authors.insert(role, ids);
    }
  }

  let title_aliases = raw
    .get(Column::AlsoKnownAs)
    .map(parse_title_aliases)
    .unwrap_or_default();

  Ok(NormalizedRecord { entry, authors, title_aliases })
}

// ─── Field parsers ───────────────────────────────────────────────────────────

/// Years such as `19??` are unknown, not malformed.
fn parse_year(value: &str) -> Option<i32> { value.parse().ok() }

/// `dd/mm/yyyy`, or `?` for unknown.
fn parse_upload_date(path: &str, value: &str) -> Option<NaiveDate> {
  if value == UNKNOWN {
    return None;
  }

  let bytes = value.as_bytes();
  let shaped = bytes.len() == 10
    && bytes.iter().enumerate().all(|(i, b)| match i {
      2 | 5 => *b == b'/',
      _ => b.is_ascii_digit(),
    });

  match shaped
    .then(|| NaiveDate::parse_from_str(value, "%d/%m/%Y").ok())
    .flatten()
  {
    Some(date) => Some(date),
    None => {
      warn!(path, value, "ignoring malformed upload date");
      None
    }
  }
}

/// `<digits>K`, limited to the sizes the machines shipped with.
fn parse_memory(path: &str, value: &str) -> Option<MemoryRequired> {
  let memory = value
    .strip_suffix('K')
    .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    .and_then(|digits| digits.parse::<u16>().ok())
    .and_then(|kilobytes| MemoryRequired::try_from(kilobytes).ok());

  if memory.is_none() {
    warn!(path, value, "ignoring invalid memory requirement");
  }
  memory
}

/// Map language names to codes, keeping catalog order and dropping repeats.
fn parse_languages(
  path: &str,
  value: &str,
  codes: &BTreeMap<String, String>,
) -> Vec<String> {
  let mut languages: Vec<String> = Vec::new();
  for name in split_names(value) {
    match codes.get(name) {
      Some(code) if !languages.contains(code) => languages.push(code.clone()),
      Some(_) => {}
      None => debug!(path, language = name, "no code for language"),
    }
  }
  languages
}

/// Split on `;`, since titles may themselves contain commas.
fn parse_title_aliases(value: &str) -> Vec<String> {
  let mut titles: Vec<String> = value
    .split(';')
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect();
  titles.sort_by(|a, b| name_order(a, b));
  titles
}

fn category(
  raw: &RawRecord,
  kind: CategoryKind,
  vocabulary: Vocabulary<'_>,
) -> Result<Option<CategoryId>> {
  let Some(value) = raw.get(kind.column()) else {
    return Ok(None);
  };
  if kind == CategoryKind::FileType && is_not_applicable(value) {
    return Ok(None);
  }

  let description = correct_category(kind, value);
  vocabulary
    .categories(kind)
    .get(description)
    .copied()
    .map(Some)
    .ok_or_else(|| Error::UnregisteredCategory {
      kind,
      description: description.to_owned(),
    })
}

fn author_ids(
  path: &str,
  role: AuthorRole,
  value: &str,
  authors: &BTreeMap<String, AuthorId>,
) -> Result<Vec<AuthorId>> {
  let mut ids = Vec::new();
  for name in split_names(value) {
    let id = *authors.get(name).ok_or_else(|| nvg_core::Error::UnmappedAuthor {
      path: path.to_owned(),
      role,
      name: name.to_owned(),
    })?;
    if ids.contains(&id) {
      warn!(path, role = %role, name, "author credited twice in one role; keeping the first");
      continue;
    }
    ids.push(id);
  }
  Ok(ids)
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Maps {
    file_types:        BTreeMap<String, CategoryId>,
    publication_types: BTreeMap<String, CategoryId>,
    authors:           BTreeMap<String, AuthorId>,
    languages:         BTreeMap<String, String>,
  }

  impl Maps {
    fn new() -> Self {
      let owned = |pairs: &[(&str, &str)]| {
        pairs
          .iter()
          .map(|(a, b)| (a.to_string(), b.to_string()))
          .collect()
      };
      Self {
        file_types:        BTreeMap::from([
          ("Arcade game".to_string(), 1),
          ("Utility".to_string(), 2),
        ]),
        publication_types: BTreeMap::from([("Commercial".to_string(), 1)]),
        authors:           BTreeMap::from([
          ("Alice".to_string(), 1),
          ("Bob".to_string(), 2),
          ("Carol".to_string(), 3),
        ]),
        languages:         owned(&[("English", "en"), ("French", "fr")]),
      }
    }

    fn vocabulary(&self) -> Vocabulary<'_> {
      Vocabulary {
        file_types:        &self.file_types,
        publication_types: &self.publication_types,
        authors:           &self.authors,
        languages:         &self.languages,
      }
    }
  }

  fn record() -> RawRecord { RawRecord::new("games/x.zip", 1024) }

  #[test]
  fn typed_fields_are_parsed() {
    let maps = Maps::new();
    let raw = record()
      .with(Column::Year, "1987")
      .with(Column::UploadDate, "01/02/2003")
      .with(Column::MemoryRequired, "128K")
      .with(Column::Type, "Util")
      .with(Column::Publication, "Commercial");

    let entry = normalize(&raw, maps.vocabulary(), Some(42)).unwrap().entry;
    assert_eq!(entry.year, Some(1987));
    assert_eq!(entry.upload_date, NaiveDate::from_ymd_opt(2003, 2, 1));
    assert_eq!(entry.memory_required, Some(MemoryRequired::K128));
    assert_eq!(entry.type_id, Some(2));
    assert_eq!(entry.publication_type_id, Some(1));
    assert_eq!(entry.external_id, Some(42));
  }

  #[test]
  fn malformed_fields_are_dropped() {
    let maps = Maps::new();
    let raw = record()
      .with(Column::Year, "19??")
      .with(Column::UploadDate, "1/2/2003")
      .with(Column::MemoryRequired, "512K");

    let entry = normalize(&raw, maps.vocabulary(), None).unwrap().entry;
    assert_eq!(entry.year, None);
    assert_eq!(entry.upload_date, None);
    assert_eq!(entry.memory_required, None);
    assert_eq!(parse_upload_date("x", "31/02/2003"), None);
    assert_eq!(parse_memory("x", "64"), None);
  }

  #[test]
  fn sentinels_become_absent() {
    let maps = Maps::new();
    let raw = record()
      .with(Column::Type, "-")
      .with(Column::Subtype, "-")
      .with(Column::Problems, "-")
      .with(Column::CheatMode, "Yes")
      .with(Column::Uploader, "?")
      .with(Column::Comments, "?")
      .with(Column::UploadDate, "?")
      // Only the designated columns use sentinels.
      .with(Column::Title, "?");

    let entry = normalize(&raw, maps.vocabulary(), None).unwrap().entry;
    assert_eq!(entry.type_id, None);
    assert_eq!(entry.subtype, None);
    assert_eq!(entry.problems, None);
    assert_eq!(entry.cheat_mode.as_deref(), Some("Yes"));
    assert_eq!(entry.uploader, None);
    assert_eq!(entry.comments, None);
    assert_eq!(entry.upload_date, None);
    assert_eq!(entry.title.as_deref(), Some("?"));
  }

  #[test]
  fn languages_map_through_the_vocabulary() {
    let maps = Maps::new();
    let raw = record().with(Column::Language, "French, Klingon, English, French");
    let entry = normalize(&raw, maps.vocabulary(), None).unwrap().entry;
    assert_eq!(entry.languages, ["fr", "en"]);

    let raw = record().with(Column::Language, "Klingon");
    let entry = normalize(&raw, maps.vocabulary(), None).unwrap().entry;
    assert!(entry.languages.is_empty());
  }

  #[test]
  fn authors_keep_catalog_order() {
    let maps = Maps::new();
    let raw = record()
      .with(Column::Author, "Bob, Alice ,Carol")
      .with(Column::Publisher, "Carol");

    let normalized = normalize(&raw, maps.vocabulary(), None).unwrap();
    assert_eq!(normalized.authors[&AuthorRole::Author], [2, 1, 3]);
    assert_eq!(normalized.authors[&AuthorRole::Publisher], [3]);
    assert!(!normalized.authors.contains_key(&AuthorRole::Musician));
  }

  #[test]
  fn unmapped_author_is_fatal() {
    let maps = Maps::new();
    let raw = record().with(Column::Author, "Alice, Mallory");
    let err = normalize(&raw, maps.vocabulary(), None).unwrap_err();
    assert!(matches!(
      err,
      Error::Core(nvg_core::Error::UnmappedAuthor { role: AuthorRole::Author, ref name, .. })
        if name == "Mallory"
    ));
  }

  #[test]
  fn title_aliases_split_on_semicolons() {
    let maps = Maps::new();
    let raw = record().with(Column::AlsoKnownAs, "zaxxon; Xevious, the game ;;Astro");
    let normalized = normalize(&raw, maps.vocabulary(), None).unwrap();
    assert_eq!(normalized.title_aliases, ["Astro", "Xevious, the game", "zaxxon"]);
  }

  #[test]
  fn missing_cross_reference_is_unknown() {
    let maps = Maps::new();
    let catalog = Catalog::from([("games/x.zip".to_string(), record())]);
    let ids = BTreeMap::from([("other.zip".to_string(), Some(7))]);

    let normalized = normalize_all(&catalog, maps.vocabulary(), Some(&ids)).unwrap();
    assert_eq!(normalized["games/x.zip"].entry.external_id, None);
  }
}
