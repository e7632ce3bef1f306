//! Name → id assignment for the category vocabularies and author identities.
//!
//! Everything here is pure: the caller registers the planned names with the
//! store and folds the returned ids back into the map.

use std::{
  cmp::Ordering,
  collections::{BTreeMap, BTreeSet},
};

use nvg_core::{
  catalog::{AuthorRole, CategoryKind},
  record::Catalog,
};
use strum::IntoEnumIterator;

use crate::normalize::{correct_category, is_not_applicable, split_names};

/// Whether the run starts from an empty store or reconciles a populated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
  /// The store was just recreated: ids are assigned explicitly, `1..=N` in
  /// case-insensitive name order, so a rebuild is reproducible.
  Build,
  /// Existing ids are kept; new names are numbered by the store.
  Incremental,
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// Case-insensitive name order. Names that differ only in case stay distinct
/// and fall back to exact comparison so the order is total.
pub fn name_order(a: &str, b: &str) -> Ordering {
  a.to_lowercase()
    .cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}

// ─── Observed names ──────────────────────────────────────────────────────────

/// Every distinct (corrected) description of `kind` used by the catalog.
pub fn category_names(catalog: &Catalog, kind: CategoryKind) -> BTreeSet<String> {
  catalog
    .values()
    .filter_map(|raw| raw.get(kind.column()))
    .filter(|value| !(kind == CategoryKind::FileType && is_not_applicable(value)))
    .map(|value| correct_category(kind, value).to_owned())
    .collect()
}

/// Every distinct author name used by a role column, plus both sides of the
/// alias mapping.
pub fn author_names(
  catalog: &Catalog,
  aliases: &BTreeMap<String, String>,
) -> BTreeSet<String> {
  let mut names: BTreeSet<String> = catalog
    .values()
    .flat_map(|raw| {
      AuthorRole::iter()
        .filter_map(move |role| raw.get(role.column()))
        .flat_map(split_names)
    })
    .map(str::to_owned)
    .collect();

  for (alias, real) in aliases {
    names.insert(alias.clone());
    names.insert(real.clone());
  }
  names
}

// ─── Id plans ────────────────────────────────────────────────────────────────

/// The names a vocabulary table must gain, and the id to force for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPlan<Id> {
  /// Names already stored, with their ids.
  pub known: BTreeMap<String, Id>,
  /// Names to register, in registration order. `None` lets the store pick.
  pub new:   Vec<(Option<Id>, String)>,
}

impl<Id> IdPlan<Id> {
  pub fn is_empty(&self) -> bool { self.new.is_empty() }
}

/// Plan the registration of every `observed` name not yet in `existing`.
///
/// An existing entry is reused only on an exact match; a name differing in
/// case is a new entry.
pub fn plan_ids<Id>(
  mode: SyncMode,
  existing: BTreeMap<String, Id>,
  observed: &BTreeSet<String>,
  kind: &'static str,
) -> nvg_core::Result<IdPlan<Id>>
where
  Id: TryFrom<usize> + Copy,
{
  let mut fresh: Vec<&String> =
    observed.iter().filter(|n| !existing.contains_key(*n)).collect();
  fresh.sort_by(|a, b| name_order(a, b));

  let new = match mode {
    SyncMode::Build => fresh
      .into_iter()
      .enumerate()
      .map(|(index, name)| {
        let number = index + 1;
        let id = Id::try_from(number).map_err(|_| nvg_core::Error::IdOutOfRange {
          kind,
          value: i64::try_from(number).unwrap_or(i64::MAX),
        })?;
        Ok((Some(id), name.clone()))
      })
      .collect::<nvg_core::Result<Vec<_>>>()?,
    SyncMode::Incremental => {
      fresh.into_iter().map(|name| (None, name.clone())).collect()
    }
  };

  Ok(IdPlan { known: existing, new })
}
