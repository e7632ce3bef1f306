//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use nvg_core::{
  catalog::{
    Attribution, AuthorRole, CategoryKind, FileEntry, Language, MemoryRequired,
    TitleAlias,
  },
  store::CatalogStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn codes(list: &[&str]) -> BTreeSet<String> {
  list.iter().map(|c| c.to_string()).collect()
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn categories_auto_number_after_forced_ids() {
  let s = store().await;

  let forced = s
    .insert_category(CategoryKind::FileType, Some(5), "Arcade game".into())
    .await
    .unwrap();
  assert_eq!(forced, 5);

  let next = s
    .insert_category(CategoryKind::FileType, None, "Utility".into())
    .await
    .unwrap();
  assert_eq!(next, 6);

  // The two vocabularies are independent tables.
  let publication = s
    .insert_category(CategoryKind::PublicationType, None, "Commercial".into())
    .await
    .unwrap();
  assert_eq!(publication, 1);

  let types = s.list_categories(CategoryKind::FileType).await.unwrap();
  let names: Vec<_> = types.iter().map(|c| c.description.as_str()).collect();
  assert_eq!(names, ["Arcade game", "Utility"]);
}

#[tokio::test]
async fn category_ids_stop_at_255() {
  let s = store().await;
  s.insert_category(CategoryKind::FileType, Some(255), "Last".into())
    .await
    .unwrap();

  let err = s
    .insert_category(CategoryKind::FileType, None, "Overflow".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));
}

#[tokio::test]
async fn duplicate_category_description_is_rejected() {
  let s = store().await;
  s.insert_category(CategoryKind::FileType, None, "Utility".into())
    .await
    .unwrap();
  assert!(
    s.insert_category(CategoryKind::FileType, None, "Utility".into())
      .await
      .is_err()
  );
}

// ─── Authors ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn author_alias_links_set_and_clear() {
  let s = store().await;
  let alice = s.insert_author(None, "Alice".into()).await.unwrap();
  let al = s.insert_author(None, "Al".into()).await.unwrap();

  s.set_author_alias(al, Some(alice)).await.unwrap();
  let authors = s.list_authors().await.unwrap();
  assert_eq!(authors[1].alias_of, Some(alice));

  s.set_author_alias(al, None).await.unwrap();
  let authors = s.list_authors().await.unwrap();
  assert_eq!(authors.len(), 2);
  assert_eq!(authors[1].alias_of, None);
}

#[tokio::test]
async fn author_cannot_alias_itself() {
  let s = store().await;
  let alice = s.insert_author(None, "Alice".into()).await.unwrap();
  assert!(s.set_author_alias(alice, Some(alice)).await.is_err());
}

#[tokio::test]
async fn alias_of_unknown_author_is_not_found() {
  let s = store().await;
  let err = s.set_author_alias(42, None).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { table: "authors", .. }));
}

// ─── Files ───────────────────────────────────────────────────────────────────

fn full_entry(type_id: u8) -> FileEntry {
  FileEntry {
    title: Some("Xevious".into()),
    company: Some("US Gold".into()),
    year: Some(1987),
    languages: vec!["en".into(), "fr".into()],
    type_id: Some(type_id),
    subtype: Some("Shoot-em-up".into()),
    upload_date: NaiveDate::from_ymd_opt(2003, 2, 1),
    uploader: Some("John".into()),
    memory_required: Some(MemoryRequired::K128),
    run_command: Some("RUN\"XEVIOUS".into()),
    external_id: Some(0),
    ..FileEntry::new("games/arcade/xevious.zip", 20480)
  }
}

#[tokio::test]
async fn file_roundtrips_every_column() {
  let s = store().await;
  s.alter_language_constraint(codes(&["en", "fr"])).await.unwrap();
  let type_id = s
    .insert_category(CategoryKind::FileType, None, "Arcade game".into())
    .await
    .unwrap();

  let entry = full_entry(type_id);
  let id = s.insert_file(None, entry.clone()).await.unwrap();

  let files = s.list_files().await.unwrap();
  assert_eq!(files.len(), 1);
  assert_eq!(files[0].id, id);
  assert_eq!(files[0].entry, entry);
}

#[tokio::test]
async fn update_rewrites_the_row() {
  let s = store().await;
  let id = s
    .insert_file(Some(7), FileEntry::new("a.zip", 1))
    .await
    .unwrap();
  assert_eq!(id, 7);

  let mut entry = FileEntry::new("a.zip", 2);
  entry.title = Some("Renamed".into());
  s.update_file(id, entry.clone()).await.unwrap();

  assert_eq!(s.list_files().await.unwrap()[0].entry, entry);

  let err = s.update_file(99, entry).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { table: "files", .. }));
}

#[tokio::test]
async fn unpermitted_language_is_rejected() {
  let s = store().await;
  s.alter_language_constraint(codes(&["en"])).await.unwrap();

  let mut entry = FileEntry::new("a.zip", 1);
  entry.languages = vec!["en".into(), "xx".into()];
  assert!(s.insert_file(None, entry.clone()).await.is_err());

  let id = s.insert_file(None, FileEntry::new("a.zip", 1)).await.unwrap();
  assert!(s.update_file(id, entry).await.is_err());
}

#[tokio::test]
async fn delete_requires_dependents_gone() {
  let s = store().await;
  let author = s.insert_author(None, "Alice".into()).await.unwrap();
  let id = s.insert_file(None, FileEntry::new("a.zip", 1)).await.unwrap();
  s.insert_attribution(Attribution {
    file_id:   id,
    author_id: author,
    role:      AuthorRole::Author,
    position:  0,
  })
  .await
  .unwrap();
  s.insert_title_alias(TitleAlias { file_id: id, title: "X".into() })
    .await
    .unwrap();

  assert!(s.delete_file(id).await.is_err());

  s.delete_attributions(id, None).await.unwrap();
  s.delete_title_aliases(id).await.unwrap();
  s.delete_file(id).await.unwrap();
  assert!(s.list_files().await.unwrap().is_empty());
}

// ─── Associations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn attributions_list_in_role_then_position_order() {
  let s = store().await;
  let bob = s.insert_author(None, "Bob".into()).await.unwrap();
  let alice = s.insert_author(None, "Alice".into()).await.unwrap();
  let id = s.insert_file(None, FileEntry::new("a.zip", 1)).await.unwrap();

  for (author_id, role, position) in [
    (alice, AuthorRole::Author, 1),
    (bob, AuthorRole::Author, 0),
    (alice, AuthorRole::Publisher, 0),
  ] {
    s.insert_attribution(Attribution { file_id: id, author_id, role, position })
      .await
      .unwrap();
  }

  let listed: Vec<_> = s
    .list_attributions()
    .await
    .unwrap()
    .into_iter()
    .map(|a| (a.role, a.author_id))
    .collect();
  assert_eq!(listed, [
    (AuthorRole::Publisher, alice),
    (AuthorRole::Author, bob),
    (AuthorRole::Author, alice),
  ]);

  s.delete_attributions(id, Some(AuthorRole::Author)).await.unwrap();
  let remaining = s.list_attributions().await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].role, AuthorRole::Publisher);
}

#[tokio::test]
async fn duplicate_position_is_rejected() {
  let s = store().await;
  let bob = s.insert_author(None, "Bob".into()).await.unwrap();
  let alice = s.insert_author(None, "Alice".into()).await.unwrap();
  let id = s.insert_file(None, FileEntry::new("a.zip", 1)).await.unwrap();

  let at = |author_id| Attribution {
    file_id: id,
    author_id,
    role: AuthorRole::Artist,
    position: 0,
  };
  s.insert_attribution(at(bob)).await.unwrap();
  assert!(s.insert_attribution(at(alice)).await.is_err());
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn rollback_discards_writes() {
  let s = store().await;
  s.begin().await.unwrap();
  s.insert_author(None, "Alice".into()).await.unwrap();
  s.rollback().await.unwrap();
  assert!(s.list_authors().await.unwrap().is_empty());

  s.begin().await.unwrap();
  s.insert_author(None, "Bob".into()).await.unwrap();
  s.commit().await.unwrap();
  assert_eq!(s.list_authors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn recreate_schema_empties_every_table() {
  let s = store().await;
  s.alter_language_constraint(codes(&["en"])).await.unwrap();
  s.insert_author(None, "Alice".into()).await.unwrap();
  s.insert_file(None, FileEntry::new("a.zip", 1)).await.unwrap();

  s.recreate_schema().await.unwrap();

  assert!(s.list_files().await.unwrap().is_empty());
  assert!(s.list_authors().await.unwrap().is_empty());
  assert!(s.language_constraint().await.unwrap().is_empty());
}

// ─── Languages ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn language_vocabulary_insert_rename_delete() {
  let s = store().await;
  s.insert_language(Language { code: "en".into(), name: "English".into() })
    .await
    .unwrap();
  s.rename_language(Language { code: "en".into(), name: "English (UK)".into() })
    .await
    .unwrap();
  assert_eq!(s.list_languages().await.unwrap()[0].name, "English (UK)");

  s.delete_language("en".into()).await.unwrap();
  assert!(s.list_languages().await.unwrap().is_empty());
  assert!(s.delete_language("en".into()).await.is_err());
}

#[tokio::test]
async fn constraint_rejects_more_than_64_codes() {
  let s = store().await;
  s.alter_language_constraint(codes(&["en"])).await.unwrap();

  let too_many: BTreeSet<String> = (0..65).map(|i| format!("x{i}")).collect();
  let err = s.alter_language_constraint(too_many).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(nvg_core::Error::LanguageLimit { count: 65, max: 64 })
  ));
  assert_eq!(s.language_constraint().await.unwrap(), codes(&["en"]));
}

#[tokio::test]
async fn constraint_cannot_drop_codes_in_use() {
  let s = store().await;
  s.alter_language_constraint(codes(&["en", "fr"])).await.unwrap();
  let mut entry = FileEntry::new("a.zip", 1);
  entry.languages = vec!["fr".into()];
  s.insert_file(None, entry).await.unwrap();

  let err = s.alter_language_constraint(codes(&["en"])).await.unwrap_err();
  assert!(matches!(err, Error::LanguageInUse(ref c) if c == &["fr".to_string()]));
  assert_eq!(s.language_constraint().await.unwrap(), codes(&["en", "fr"]));

  s.alter_language_constraint(codes(&["fr"])).await.unwrap();
  assert_eq!(s.language_constraint().await.unwrap(), codes(&["fr"]));
}

#[tokio::test]
async fn constraint_refuses_to_nest_in_a_transaction() {
  let s = store().await;
  s.begin().await.unwrap();
  let err = s.alter_language_constraint(codes(&["en"])).await.unwrap_err();
  assert!(matches!(err, Error::TransactionOpen));
  s.rollback().await.unwrap();
}
