//! Run orchestration: plan each stage, then apply it to the store one
//! table batch per transaction.
//!
//! A failed batch is rolled back and aborts the run. Batches already
//! committed stay committed; since every stage diffs against what is
//! stored, re-running with the same inputs picks up where the failed run
//! stopped.

use std::{collections::BTreeMap, future::Future};

use nvg_core::{
  catalog::{Attribution, AuthorId, AuthorRole, CategoryId, CategoryKind, FileId, TitleAlias},
  store::CatalogStore,
};
use tracing::{debug, error, info};

use crate::{
  Error, Result,
  alias::{AliasChange, plan_aliases},
  config::SyncConfig,
  diff::{self, DiffOptions, ListChange, SyncPlan},
  error::store_err,
  languages::{LanguagePlan, plan_languages},
  normalize::{Vocabulary, normalize_all},
  resolve::{IdPlan, SyncMode, author_names, category_names, plan_ids},
  snapshot::Snapshot,
  source::Inputs,
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// What a run changed. All zero and empty for a run that found the store
/// already in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
  pub languages_added:       usize,
  pub languages_renamed:     usize,
  pub languages_removed:     usize,
  pub categories_added:      usize,
  pub authors_added:         usize,
  pub alias_changes:         Vec<AliasChange>,
  pub files_deleted:         usize,
  pub files_updated:         usize,
  pub files_inserted:        usize,
  /// `(file, role)` groups inserted, replaced or deleted.
  pub attribution_groups:    usize,
  /// Per-file title alias sets inserted, replaced or deleted.
  pub title_alias_groups:    usize,
}

impl SyncReport {
  /// True when the run issued no writes at all.
  pub fn is_unchanged(&self) -> bool { *self == Self::default() }
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// Run `work` inside a store transaction, committing on success and rolling
/// back on failure.
async fn in_transaction<S, T, F>(store: &S, batch: &'static str, work: F) -> Result<T>
where
  S: CatalogStore,
  F: Future<Output = Result<T>>,
{
  debug!(batch, "begin");
  store.begin().await.map_err(store_err)?;

  match work.await {
    Ok(value) => match store.commit().await {
      Ok(()) => {
        debug!(batch, "commit");
        Ok(value)
      }
      Err(e) => {
        rollback(store, batch).await;
        Err(store_err(e))
      }
    },
    Err(e) => {
      rollback(store, batch).await;
      Err(e)
    }
  }
}

async fn rollback<S: CatalogStore>(store: &S, batch: &'static str) {
  if let Err(e) = store.rollback().await {
    error!(batch, error = %e, "rollback failed");
  }
}

// ─── Run ─────────────────────────────────────────────────────────────────────

/// Reconcile `store` with `inputs`.
///
/// In [`SyncMode::Build`] the schema is recreated first, destroying all
/// stored data.
pub async fn run<S: CatalogStore>(
  store: &S,
  inputs: &Inputs,
  config: &SyncConfig,
  mode: SyncMode,
) -> Result<SyncReport> {
  let mut report = SyncReport::default();

  if mode == SyncMode::Build {
    info!("recreating schema");
    store.recreate_schema().await.map_err(store_err)?;
  }

  let languages = widen_languages(store, config, &mut report).await?;

  let file_types =
    register_categories(store, inputs, CategoryKind::FileType, mode, &mut report).await?;
  let publication_types =
    register_categories(store, inputs, CategoryKind::PublicationType, mode, &mut report).await?;
  let authors = register_authors(store, inputs, mode, &mut report).await?;

  report.alias_changes = apply_aliases(store, &inputs.author_aliases).await?;

  let codes = config.language_codes();
  let vocabulary = Vocabulary {
    file_types:        &file_types,
    publication_types: &publication_types,
    authors:           &authors,
    languages:         &codes,
  };
  // Pure; an unmapped author stops the run before any file row is written.
  let desired = normalize_all(&inputs.catalog, vocabulary, inputs.cross_references.as_ref())?;

  let snapshot = Snapshot::load(store).await?;
  let plan = diff::plan(&desired, &snapshot, DiffOptions {
    mode,
    keep_external_ids: inputs.cross_references.is_none(),
  })?;
  apply_plan(store, &snapshot, plan, &mut report).await?;

  narrow_languages(store, languages, &mut report).await?;

  info!(
    files_inserted = report.files_inserted,
    files_updated = report.files_updated,
    files_deleted = report.files_deleted,
    attribution_groups = report.attribution_groups,
    title_alias_groups = report.title_alias_groups,
    authors_added = report.authors_added,
    alias_changes = report.alias_changes.len(),
    "sync complete"
  );
  Ok(report)
}

// ─── Languages ───────────────────────────────────────────────────────────────

/// Widen the constraint and add or rename vocabulary rows. Returns the plan
/// so the removals can be applied after the file sync.
async fn widen_languages<S: CatalogStore>(
  store: &S,
  config: &SyncConfig,
  report: &mut SyncReport,
) -> Result<LanguagePlan> {
  let stored = store.list_languages().await.map_err(store_err)?;
  let constraint = store.language_constraint().await.map_err(store_err)?;
  let mut plan = plan_languages(&config.language_vocabulary(), &stored, &constraint)?;

  if let Some(widened) = plan.widen.take() {
    debug!(codes = widened.len(), "widening language constraint");
    store.alter_language_constraint(widened).await.map_err(store_err)?;
  }

  if !plan.inserts.is_empty() || !plan.renames.is_empty() {
    let inserts = std::mem::take(&mut plan.inserts);
    let renames = std::mem::take(&mut plan.renames);
    report.languages_added = inserts.len();
    report.languages_renamed = renames.len();

    in_transaction(store, "language_codes", async {
      for language in inserts {
        info!(code = %language.code, name = %language.name, "adding language");
        store.insert_language(language).await.map_err(store_err)?;
      }
      for language in renames {
        info!(code = %language.code, name = %language.name, "renaming language");
        store.rename_language(language).await.map_err(store_err)?;
      }
      Ok::<_, Error>(())
    })
    .await?;
  }

  Ok(plan)
}

async fn narrow_languages<S: CatalogStore>(
  store: &S,
  plan: LanguagePlan,
  report: &mut SyncReport,
) -> Result<()> {
  if let Some(narrowed) = plan.narrow {
    debug!(codes = narrowed.len(), "narrowing language constraint");
    store.alter_language_constraint(narrowed).await.map_err(store_err)?;
  }

  if !plan.removals.is_empty() {
    report.languages_removed = plan.removals.len();
    in_transaction(store, "language_codes", async {
      for code in plan.removals {
        info!(code = %code, "removing language");
        store.delete_language(code).await.map_err(store_err)?;
      }
      Ok::<_, Error>(())
    })
    .await?;
  }
  Ok(())
}

// ─── Vocabulary registration ─────────────────────────────────────────────────

async fn register_categories<S: CatalogStore>(
  store: &S,
  inputs: &Inputs,
  kind: CategoryKind,
  mode: SyncMode,
  report: &mut SyncReport,
) -> Result<BTreeMap<String, CategoryId>> {
  let existing = store
    .list_categories(kind)
    .await
    .map_err(store_err)?
    .into_iter()
    .map(|c| (c.description, c.id))
    .collect();
  let observed = category_names(&inputs.catalog, kind);
  let label = match kind {
    CategoryKind::FileType => "file type",
    CategoryKind::PublicationType => "publication type",
  };
  let IdPlan { mut known, new } = plan_ids(mode, existing, &observed, label)?;

  if !new.is_empty() {
    report.categories_added += new.len();
    let batch = match kind {
      CategoryKind::FileType => "file_types",
      CategoryKind::PublicationType => "publication_types",
    };
    in_transaction(store, batch, async {
      for (id, description) in new {
        let id = store
          .insert_category(kind, id, description.clone())
          .await
          .map_err(store_err)?;
        debug!(%kind, id, description = %description, "registered");
        known.insert(description, id);
      }
      Ok::<_, Error>(())
    })
    .await?;
  }

  Ok(known)
}

async fn register_authors<S: CatalogStore>(
  store: &S,
  inputs: &Inputs,
  mode: SyncMode,
  report: &mut SyncReport,
) -> Result<BTreeMap<String, AuthorId>> {
  let existing = store
    .list_authors()
    .await
    .map_err(store_err)?
    .into_iter()
    .map(|a| (a.name, a.id))
    .collect();
  let observed = author_names(&inputs.catalog, &inputs.author_aliases);
  let IdPlan { mut known, new } = plan_ids(mode, existing, &observed, "author")?;

  if !new.is_empty() {
    report.authors_added = new.len();
    in_transaction(store, "authors", async {
      for (id, name) in new {
        let id = store.insert_author(id, name.clone()).await.map_err(store_err)?;
        debug!(id, name = %name, "registered author");
        known.insert(name, id);
      }
      Ok::<_, Error>(())
    })
    .await?;
  }

  Ok(known)
}

async fn apply_aliases<S: CatalogStore>(
  store: &S,
  mapping: &BTreeMap<String, String>,
) -> Result<Vec<AliasChange>> {
  let authors = store.list_authors().await.map_err(store_err)?;
  let updates = plan_aliases(&authors, mapping);
  if updates.is_empty() {
    return Ok(Vec::new());
  }

  in_transaction(store, "author_aliases", async {
    let mut changes = Vec::with_capacity(updates.len());
    for update in updates {
      store
        .set_author_alias(update.author_id, update.alias_of)
        .await
        .map_err(store_err)?;
      info!("{}", update.change);
      changes.push(update.change);
    }
    Ok::<_, Error>(changes)
  })
  .await
}

// ─── File tables ─────────────────────────────────────────────────────────────

async fn apply_plan<S: CatalogStore>(
  store: &S,
  snapshot: &Snapshot,
  plan: SyncPlan,
  report: &mut SyncReport,
) -> Result<()> {
  let SyncPlan { deletions, updates, inserts, attributions, title_aliases } = plan;
  let mut ids: BTreeMap<String, FileId> = snapshot
    .files
    .iter()
    .map(|(path, stored)| (path.clone(), stored.id))
    .collect();

  if !deletions.is_empty() {
    report.files_deleted = deletions.len();
    in_transaction(store, "files (delete)", async {
      for deletion in deletions {
        // Dependents first: the schema does not cascade.
        store.delete_attributions(deletion.id, None).await.map_err(store_err)?;
        store.delete_title_aliases(deletion.id).await.map_err(store_err)?;
        store.delete_file(deletion.id).await.map_err(store_err)?;
        info!(path = %deletion.path, "deleted file");
      }
      Ok::<_, Error>(())
    })
    .await?;
  }

  if !updates.is_empty() {
    report.files_updated = updates.len();
    in_transaction(store, "files (update)", async {
      for file in updates {
        debug!(path = %file.entry.path, "updating file");
        store.update_file(file.id, file.entry).await.map_err(store_err)?;
      }
      Ok::<_, Error>(())
    })
    .await?;
  }

  if !inserts.is_empty() {
    report.files_inserted = inserts.len();
    in_transaction(store, "files (insert)", async {
      for (id, entry) in inserts {
        let path = entry.path.clone();
        let id = store.insert_file(id, entry).await.map_err(store_err)?;
        debug!(path = %path, id, "inserted file");
        ids.insert(path, id);
      }
      Ok::<_, Error>(())
    })
    .await?;
  }

  let file_id = |path: &str| ids.get(path).copied().ok_or_else(|| Error::MissingFileId(path.to_owned()));

  if !attributions.is_empty() {
    report.attribution_groups = attributions.len();
    in_transaction(store, "file_authors", async {
      for change in attributions {
        let id = file_id(&change.path)?;
        match change.change {
          ListChange::Delete => {
            store.delete_attributions(id, Some(change.role)).await.map_err(store_err)?;
          }
          ListChange::Replace(authors) => {
            store.delete_attributions(id, Some(change.role)).await.map_err(store_err)?;
            insert_attributions(store, id, change.role, authors).await?;
          }
          ListChange::Insert(authors) => {
            insert_attributions(store, id, change.role, authors).await?;
          }
        }
      }
      Ok::<_, Error>(())
    })
    .await?;
  }

  if !title_aliases.is_empty() {
    report.title_alias_groups = title_aliases.len();
    in_transaction(store, "title_aliases", async {
      for change in title_aliases {
        let id = file_id(&change.path)?;
        let titles = match change.change {
          ListChange::Delete => {
            store.delete_title_aliases(id).await.map_err(store_err)?;
            continue;
          }
          ListChange::Replace(titles) => {
            store.delete_title_aliases(id).await.map_err(store_err)?;
            titles
          }
          ListChange::Insert(titles) => titles,
        };
        for title in titles {
          store
            .insert_title_alias(TitleAlias { file_id: id, title })
            .await
            .map_err(store_err)?;
        }
      }
      Ok::<_, Error>(())
    })
    .await?;
  }

  Ok(())
}

async fn insert_attributions<S: CatalogStore>(
  store: &S,
  file_id: FileId,
  role: AuthorRole,
  authors: Vec<AuthorId>,
) -> Result<()> {
  for (position, author_id) in authors.into_iter().enumerate() {
    let position = u16::try_from(position).map_err(|_| nvg_core::Error::IdOutOfRange {
      kind:  "author position",
      value: i64::try_from(position).unwrap_or(i64::MAX),
    })?;
    store
      .insert_attribution(Attribution { file_id, author_id, role, position })
      .await
      .map_err(store_err)?;
  }
  Ok(())
}
