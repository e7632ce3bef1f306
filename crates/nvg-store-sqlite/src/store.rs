//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::{collections::BTreeSet, path::Path};

use nvg_core::{
  catalog::{
    Attribution, Author, AuthorId, AuthorRole, Category, CategoryId,
    CategoryKind, FileEntry, FileId, Language, StoredFile, TitleAlias,
  },
  language::MAX_LANGUAGE_CODES,
  store::CatalogStore,
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{
    EncodedFile, FILE_COLUMNS, RawAttribution, RawFile, category_table,
    decode_author_id, decode_category_id, decode_file_id,
  },
  schema::{DROP_SCHEMA, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Clones share
/// the connection and therefore any open transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Transactions ──────────────────────────────────────────────────────────

  async fn begin(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn commit(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("COMMIT")?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn rollback(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("ROLLBACK")?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn recreate_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DROP_SCHEMA)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_files(&self) -> Result<Vec<StoredFile>> {
    let raws: Vec<RawFile> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {FILE_COLUMNS} FROM files ORDER BY file_id"))?;
        let rows = stmt
          .query_map([], RawFile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFile::into_stored).collect()
  }

  async fn list_attributions(&self) -> Result<Vec<Attribution>> {
    let raws: Vec<RawAttribution> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT file_id, author_id, author_role, author_index
           FROM file_authors
           ORDER BY file_id, author_role, author_index",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawAttribution {
              file_id:      row.get(0)?,
              author_id:    row.get(1)?,
              author_role:  row.get(2)?,
              author_index: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut attributions = raws
      .into_iter()
      .map(RawAttribution::into_attribution)
      .collect::<Result<Vec<_>>>()?;
    // SQL orders roles by spelling; callers expect declaration order.
    attributions.sort_by_key(|a| (a.file_id, a.role, a.position));
    Ok(attributions)
  }

  async fn list_title_aliases(&self) -> Result<Vec<TitleAlias>> {
    let raws: Vec<(i64, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT file_id, title FROM title_aliases ORDER BY file_id, title")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(file_id, title)| Ok(TitleAlias { file_id: decode_file_id(file_id)?, title }))
      .collect()
  }

  async fn list_authors(&self) -> Result<Vec<Author>> {
    let raws: Vec<(i64, String, Option<i64>)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT author_id, name, alias_of_author_id FROM authors ORDER BY author_id",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, name, alias_of)| {
        Ok(Author {
          id: decode_author_id(id)?,
          name,
          alias_of: alias_of.map(decode_author_id).transpose()?,
        })
      })
      .collect()
  }

  async fn list_categories(&self, kind: CategoryKind) -> Result<Vec<Category>> {
    let table = category_table(kind);

    let raws: Vec<(i64, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT id, description FROM {table} ORDER BY id"))?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, description)| {
        Ok(Category { id: decode_category_id(kind, id)?, description })
      })
      .collect()
  }

  async fn list_languages(&self) -> Result<Vec<Language>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt =
            conn.prepare("SELECT code, name FROM language_codes ORDER BY code")?;
          let rows = stmt
            .query_map([], |row| Ok(Language { code: row.get(0)?, name: row.get(1)? }))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn language_constraint(&self) -> Result<BTreeSet<String>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare("SELECT code FROM permitted_languages")?;
          let codes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<String>>>()?;
          Ok(codes)
        })
        .await?,
    )
  }

  // ── Vocabulary writes ─────────────────────────────────────────────────────

  async fn insert_category(
    &self,
    kind: CategoryKind,
    id: Option<CategoryId>,
    description: String,
  ) -> Result<CategoryId> {
    let table = category_table(kind);

    let rowid = self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO {table} (id, description) VALUES (?1, ?2)"),
          rusqlite::params![id, description],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    decode_category_id(kind, rowid)
  }

  async fn insert_author(&self, id: Option<AuthorId>, name: String) -> Result<AuthorId> {
    let rowid = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO authors (author_id, name) VALUES (?1, ?2)",
          rusqlite::params![id, name],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    decode_author_id(rowid)
  }

  async fn set_author_alias(
    &self,
    id: AuthorId,
    alias_of: Option<AuthorId>,
  ) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE authors SET alias_of_author_id = ?2 WHERE author_id = ?1",
          rusqlite::params![id, alias_of],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound { table: "authors", id: id.to_string() });
    }
    Ok(())
  }

  async fn insert_language(&self, language: Language) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO language_codes (code, name) VALUES (?1, ?2)",
          rusqlite::params![language.code, language.name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn rename_language(&self, language: Language) -> Result<()> {
    let code = language.code.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE language_codes SET name = ?2 WHERE code = ?1",
          rusqlite::params![language.code, language.name],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound { table: "language_codes", id: code });
    }
    Ok(())
  }

  async fn delete_language(&self, code: String) -> Result<()> {
    let key = code.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM language_codes WHERE code = ?1",
          rusqlite::params![key],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound { table: "language_codes", id: code });
    }
    Ok(())
  }

  async fn alter_language_constraint(&self, allowed: BTreeSet<String>) -> Result<()> {
    if allowed.len() > MAX_LANGUAGE_CODES {
      return Err(
        nvg_core::Error::LanguageLimit { count: allowed.len(), max: MAX_LANGUAGE_CODES }
          .into(),
      );
    }

    let outcome: Result<()> = self
      .conn
      .call(move |conn| {
        if !conn.is_autocommit() {
          return Ok(Err(Error::TransactionOpen));
        }

        let tx = conn.transaction()?;

        let mut in_use = {
          let mut stmt = tx.prepare(
            "SELECT DISTINCT j.value FROM files, json_each(files.languages) AS j",
          )?;
          stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        in_use.retain(|code| !allowed.contains(code));
        if !in_use.is_empty() {
          in_use.sort();
          // Dropping the transaction rolls it back.
          return Ok(Err(Error::LanguageInUse(in_use)));
        }

        tx.execute("DELETE FROM permitted_languages", [])?;
        {
          let mut stmt = tx.prepare("INSERT INTO permitted_languages (code) VALUES (?1)")?;
          for code in &allowed {
            stmt.execute([code])?;
          }
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    outcome?;
    debug!("language constraint altered");
    Ok(())
  }

  // ── File writes ───────────────────────────────────────────────────────────

  async fn insert_file(&self, id: Option<FileId>, entry: FileEntry) -> Result<FileId> {
    let f = EncodedFile::new(entry)?;

    let rowid = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO files (
             file_id, filepath, size, title, company, year, languages, type_id,
             subtype, title_screen, cheat_mode, protected, problems,
             upload_date, uploader, comments, original_title,
             publication_type_id, publisher_code, barcode, dl_code,
             memory_required, protection, run_command, external_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
          rusqlite::params![
            id,
            f.filepath,
            f.size,
            f.title,
            f.company,
            f.year,
            f.languages,
            f.type_id,
            f.subtype,
            f.title_screen,
            f.cheat_mode,
            f.protected,
            f.problems,
            f.upload_date,
            f.uploader,
            f.comments,
            f.original_title,
            f.publication_type_id,
            f.publisher_code,
            f.barcode,
            f.dl_code,
            f.memory_required,
            f.protection,
            f.run_command,
            f.external_id,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    decode_file_id(rowid)
  }

  async fn update_file(&self, id: FileId, entry: FileEntry) -> Result<()> {
    let f = EncodedFile::new(entry)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE files SET
             filepath = ?2, size = ?3, title = ?4, company = ?5, year = ?6,
             languages = ?7, type_id = ?8, subtype = ?9, title_screen = ?10,
             cheat_mode = ?11, protected = ?12, problems = ?13,
             upload_date = ?14, uploader = ?15, comments = ?16,
             original_title = ?17, publication_type_id = ?18,
             publisher_code = ?19, barcode = ?20, dl_code = ?21,
             memory_required = ?22, protection = ?23, run_command = ?24,
             external_id = ?25
           WHERE file_id = ?1",
          rusqlite::params![
            id,
            f.filepath,
            f.size,
            f.title,
            f.company,
            f.year,
            f.languages,
            f.type_id,
            f.subtype,
            f.title_screen,
            f.cheat_mode,
            f.protected,
            f.problems,
            f.upload_date,
            f.uploader,
            f.comments,
            f.original_title,
            f.publication_type_id,
            f.publisher_code,
            f.barcode,
            f.dl_code,
            f.memory_required,
            f.protection,
            f.run_command,
            f.external_id,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound { table: "files", id: id.to_string() });
    }
    Ok(())
  }

  async fn delete_file(&self, id: FileId) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM files WHERE file_id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound { table: "files", id: id.to_string() });
    }
    Ok(())
  }

  // ── Association writes ────────────────────────────────────────────────────

  async fn insert_attribution(&self, attribution: Attribution) -> Result<()> {
    let role = attribution.role.as_str();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO file_authors (file_id, author_id, author_role, author_index)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            attribution.file_id,
            attribution.author_id,
            role,
            attribution.position,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_attributions(
    &self,
    file_id: FileId,
    role: Option<AuthorRole>,
  ) -> Result<()> {
    let role = role.map(AuthorRole::as_str);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM file_authors
           WHERE file_id = ?1 AND (?2 IS NULL OR author_role = ?2)",
          rusqlite::params![file_id, role],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_title_alias(&self, alias: TitleAlias) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO title_aliases (file_id, title) VALUES (?1, ?2)",
          rusqlite::params![alias.file_id, alias.title],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_title_aliases(&self, file_id: FileId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM title_aliases WHERE file_id = ?1",
          rusqlite::params![file_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
