//! The current state of the store, regrouped for diffing.

use std::collections::{BTreeMap, BTreeSet};

use nvg_core::{
  catalog::{AuthorId, AuthorRole, FileId, StoredFile},
  store::CatalogStore,
};

use crate::{Result, error::store_err};

/// Stored files keyed by path, with their multi-valued attributes grouped
/// the way the diff compares them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
  pub files:         BTreeMap<String, StoredFile>,
  /// Author ids per `(file, role)`, ordered by position.
  pub attributions:  BTreeMap<(FileId, AuthorRole), Vec<AuthorId>>,
  pub title_aliases: BTreeMap<FileId, BTreeSet<String>>,
}

impl Snapshot {
  pub async fn load<S: CatalogStore>(store: &S) -> Result<Self> {
    let files = store
      .list_files()
      .await
      .map_err(store_err)?
      .into_iter()
      .map(|file| (file.entry.path.clone(), file))
      .collect();

    let mut attributions: BTreeMap<_, Vec<AuthorId>> = BTreeMap::new();
    // Listed by file, role and position, so pushing keeps the order.
    for a in store.list_attributions().await.map_err(store_err)? {
      attributions.entry((a.file_id, a.role)).or_default().push(a.author_id);
    }

    let mut title_aliases: BTreeMap<_, BTreeSet<String>> = BTreeMap::new();
    for alias in store.list_title_aliases().await.map_err(store_err)? {
      title_aliases.entry(alias.file_id).or_default().insert(alias.title);
    }

    Ok(Self { files, attributions, title_aliases })
  }
}
