//! Diff pipeline: normalised records + store snapshot → [`SyncPlan`].
//!
//! Computes the file deletions, updates and inserts, and the per-file
//! changes to author attributions and title aliases, needed to make the
//! store mirror the catalog. Nothing here touches the store; applying the
//! plan is [`crate::sync`]'s job.

use std::collections::{BTreeMap, BTreeSet};

use nvg_core::catalog::{AuthorId, AuthorRole, FileEntry, FileId, StoredFile};
use strum::IntoEnumIterator;

use crate::{normalize::NormalizedRecord, resolve::SyncMode, snapshot::Snapshot};

// ─── Change classification ───────────────────────────────────────────────────

/// How a multi-valued attribute group changes. A changed group is always
/// replaced whole, never patched position by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange<T> {
  Insert(T),
  Delete,
  Replace(T),
}

/// Compare a desired group with the stored one. `None` means no change.
pub fn classify<T: PartialEq>(desired: Option<T>, stored: Option<&T>) -> Option<ListChange<T>> {
  match (desired, stored) {
    (None, None) => None,
    (Some(d), None) => Some(ListChange::Insert(d)),
    (None, Some(_)) => Some(ListChange::Delete),
    (Some(d), Some(s)) if d == *s => None,
    (Some(d), Some(_)) => Some(ListChange::Replace(d)),
  }
}

// ─── Plan ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
  pub id:   FileId,
  pub path: String,
}

/// The attribution change for one `(file, role)` group. Files are named by
/// path because inserted files have no id until the insert batch has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionChange {
  pub path:   String,
  pub role:   AuthorRole,
  pub change: ListChange<Vec<AuthorId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleAliasChange {
  pub path:   String,
  pub change: ListChange<BTreeSet<String>>,
}

/// Every mutation one run applies to the file tables, batched per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
  pub deletions:     Vec<Deletion>,
  /// Stored rows whose content differs, carrying the full desired row.
  pub updates:       Vec<StoredFile>,
  /// New rows; the id is forced in build mode.
  pub inserts:       Vec<(Option<FileId>, FileEntry)>,
  pub attributions:  Vec<AttributionChange>,
  pub title_aliases: Vec<TitleAliasChange>,
}

impl SyncPlan {
  pub fn is_empty(&self) -> bool {
    self.deletions.is_empty()
      && self.updates.is_empty()
      && self.inserts.is_empty()
      && self.attributions.is_empty()
      && self.title_aliases.is_empty()
  }
}

#[derive(Debug, Clone, Copy)]
pub struct DiffOptions {
  pub mode:              SyncMode,
  /// Keep each stored `external_id` instead of the desired one; set when
  /// the cross-reference input was unavailable this run.
  pub keep_external_ids: bool,
}

/// Compute the plan that converges `snapshot` onto `desired`.
pub fn plan(
  desired: &BTreeMap<String, NormalizedRecord>,
  snapshot: &Snapshot,
  options: DiffOptions,
) -> nvg_core::Result<SyncPlan> {
  let mut plan = SyncPlan::default();

  for (path, stored) in &snapshot.files {
    if !desired.contains_key(path) {
      plan.deletions.push(Deletion { id: stored.id, path: path.clone() });
    }
  }

  for (path, record) in desired {
    let stored = snapshot.files.get(path);
    let mut entry = record.entry.clone();

    match stored {
      Some(stored) => {
        if options.keep_external_ids {
          entry.external_id = stored.entry.external_id;
        }
        if entry != stored.entry {
          plan.updates.push(StoredFile { id: stored.id, entry });
        }
      }
      None => {
        let id = match options.mode {
          SyncMode::Build => Some(next_file_id(plan.inserts.len())?),
          SyncMode::Incremental => None,
        };
        plan.inserts.push((id, entry));
      }
    }

    let stored_id = stored.map(|s| s.id);

    for role in AuthorRole::iter() {
      let wanted = record.authors.get(&role).cloned();
      let current = stored_id.and_then(|id| snapshot.attributions.get(&(id, role)));
      if let Some(change) = classify(wanted, current) {
        plan.attributions.push(AttributionChange { path: path.clone(), role, change });
      }
    }

    let wanted: BTreeSet<String> = record.title_aliases.iter().cloned().collect();
    let wanted = (!wanted.is_empty()).then_some(wanted);
    let current = stored_id.and_then(|id| snapshot.title_aliases.get(&id));
    if let Some(change) = classify(wanted, current) {
      plan.title_aliases.push(TitleAliasChange { path: path.clone(), change });
    }
  }

  Ok(plan)
}

/// Build-mode ids number inserted files from 1 in path order.
fn next_file_id(inserted: usize) -> nvg_core::Result<FileId> {
  let number = inserted + 1;
  FileId::try_from(number).map_err(|_| nvg_core::Error::IdOutOfRange {
    kind:  "file",
    value: i64::try_from(number).unwrap_or(i64::MAX),
  })
}
