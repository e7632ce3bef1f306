//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `nvg-store-sqlite`).
//! The sync engine depends on this abstraction only and never issues raw
//! queries itself, so a backend can be swapped without touching the diff
//! logic.

use std::{collections::BTreeSet, future::Future};

use crate::catalog::{
  Attribution, Author, AuthorId, AuthorRole, Category, CategoryId,
  CategoryKind, FileEntry, FileId, Language, StoredFile, TitleAlias,
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a relational mirror of the catalog.
///
/// Writes are only valid between [`begin`](Self::begin) and
/// [`commit`](Self::commit) / [`rollback`](Self::rollback), with the single
/// exception of [`alter_language_constraint`](Self::alter_language_constraint),
/// which is atomic on its own and must not be called inside a transaction.
///
/// Wherever an id parameter is an `Option`, `None` lets the store allocate
/// the next id and `Some` forces a specific one.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Transactions ──────────────────────────────────────────────────────

  fn begin(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn commit(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn rollback(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Drop every table and recreate an empty schema. Destroys all data.
  fn recreate_schema(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn list_files(
    &self,
  ) -> impl Future<Output = Result<Vec<StoredFile>, Self::Error>> + Send + '_;

  /// All attributions, ordered by file, role and position.
  fn list_attributions(
    &self,
  ) -> impl Future<Output = Result<Vec<Attribution>, Self::Error>> + Send + '_;

  fn list_title_aliases(
    &self,
  ) -> impl Future<Output = Result<Vec<TitleAlias>, Self::Error>> + Send + '_;

  fn list_authors(
    &self,
  ) -> impl Future<Output = Result<Vec<Author>, Self::Error>> + Send + '_;

  fn list_categories(
    &self,
    kind: CategoryKind,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  fn list_languages(
    &self,
  ) -> impl Future<Output = Result<Vec<Language>, Self::Error>> + Send + '_;

  /// The set of language codes a file's `languages` attribute may contain.
  fn language_constraint(
    &self,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + '_;

  // ── Vocabulary writes ─────────────────────────────────────────────────

  fn insert_category(
    &self,
    kind: CategoryKind,
    id: Option<CategoryId>,
    description: String,
  ) -> impl Future<Output = Result<CategoryId, Self::Error>> + Send + '_;

  fn insert_author(
    &self,
    id: Option<AuthorId>,
    name: String,
  ) -> impl Future<Output = Result<AuthorId, Self::Error>> + Send + '_;

  /// Point `id` at `alias_of`, or clear the link with `None`.
  fn set_author_alias(
    &self,
    id: AuthorId,
    alias_of: Option<AuthorId>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn insert_language(
    &self,
    language: Language,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Change the human-readable name of an existing code.
  fn rename_language(
    &self,
    language: Language,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_language(
    &self,
    code: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the permitted set of language codes.
  ///
  /// Fails if the set is larger than
  /// [`MAX_LANGUAGE_CODES`](crate::language::MAX_LANGUAGE_CODES), if a code
  /// being removed is still used by a file, or if a transaction is open.
  fn alter_language_constraint(
    &self,
    allowed: BTreeSet<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── File writes ───────────────────────────────────────────────────────

  fn insert_file(
    &self,
    id: Option<FileId>,
    entry: FileEntry,
  ) -> impl Future<Output = Result<FileId, Self::Error>> + Send + '_;

  /// Rewrite every column of an existing file row.
  fn update_file(
    &self,
    id: FileId,
    entry: FileEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete the file row only. Attributions and title aliases referencing
  /// it must already be gone.
  fn delete_file(
    &self,
    id: FileId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Association writes ────────────────────────────────────────────────

  fn insert_attribution(
    &self,
    attribution: Attribution,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a file's attributions, restricted to one role if given.
  fn delete_attributions(
    &self,
    file_id: FileId,
    role: Option<AuthorRole>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn insert_title_alias(
    &self,
    alias: TitleAlias,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_title_aliases(
    &self,
    file_id: FileId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
