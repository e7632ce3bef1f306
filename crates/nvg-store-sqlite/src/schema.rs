//! SQL schema for the NVG SQLite store.
//!
//! Foreign keys are enforced and never cascade: a file's attributions and
//! title aliases must be deleted before the file itself.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS file_types (
    id          INTEGER PRIMARY KEY CHECK (id BETWEEN 1 AND 255),
    description TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS publication_types (
    id          INTEGER PRIMARY KEY CHECK (id BETWEEN 1 AND 255),
    description TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS language_codes (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

-- The set of codes files.languages may contain. Kept in step with
-- language_codes, but altered as a separate step.
CREATE TABLE IF NOT EXISTS permitted_languages (
    code TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS authors (
    author_id          INTEGER PRIMARY KEY CHECK (author_id BETWEEN 1 AND 65535),
    name               TEXT NOT NULL UNIQUE,
    alias_of_author_id INTEGER REFERENCES authors(author_id),
    CHECK (alias_of_author_id IS NULL OR alias_of_author_id != author_id)
);

CREATE TABLE IF NOT EXISTS files (
    file_id             INTEGER PRIMARY KEY,
    filepath            TEXT NOT NULL UNIQUE,
    size                INTEGER NOT NULL CHECK (size >= 0),
    title               TEXT,
    company             TEXT,
    year                INTEGER,
    languages           TEXT NOT NULL DEFAULT '[]',   -- JSON array of codes
    type_id             INTEGER REFERENCES file_types(id),
    subtype             TEXT,
    title_screen        TEXT,
    cheat_mode          TEXT,
    protected           TEXT,
    problems            TEXT,
    upload_date         TEXT,                         -- YYYY-MM-DD
    uploader            TEXT,
    comments            TEXT,
    original_title      TEXT,
    publication_type_id INTEGER REFERENCES publication_types(id),
    publisher_code      TEXT,
    barcode             TEXT,
    dl_code             TEXT,
    memory_required     INTEGER CHECK (memory_required IN (64, 128, 256)),
    protection          TEXT,
    run_command         TEXT,
    external_id         INTEGER CHECK (external_id >= 0)
);

CREATE TABLE IF NOT EXISTS file_authors (
    file_id     INTEGER NOT NULL REFERENCES files(file_id),
    author_id   INTEGER NOT NULL REFERENCES authors(author_id),
    author_role TEXT NOT NULL CHECK (author_role IN (
        'PUBLISHER', 'RE-RELEASED BY', 'CRACKER', 'DEVELOPER',
        'AUTHOR', 'DESIGNER', 'ARTIST', 'MUSICIAN'
    )),
    author_index INTEGER NOT NULL CHECK (author_index >= 0),
    PRIMARY KEY (file_id, author_id, author_role),
    UNIQUE (file_id, author_role, author_index)
);

CREATE TABLE IF NOT EXISTS title_aliases (
    file_id INTEGER NOT NULL REFERENCES files(file_id),
    title   TEXT NOT NULL,
    PRIMARY KEY (file_id, title)
);

CREATE INDEX IF NOT EXISTS file_authors_author_idx ON file_authors(author_id);

CREATE TRIGGER IF NOT EXISTS files_languages_insert
BEFORE INSERT ON files
WHEN EXISTS (
    SELECT 1 FROM json_each(NEW.languages)
    WHERE value NOT IN (SELECT code FROM permitted_languages)
)
BEGIN
    SELECT RAISE(ABORT, 'language code not permitted');
END;

CREATE TRIGGER IF NOT EXISTS files_languages_update
BEFORE UPDATE OF languages ON files
WHEN EXISTS (
    SELECT 1 FROM json_each(NEW.languages)
    WHERE value NOT IN (SELECT code FROM permitted_languages)
)
BEGIN
    SELECT RAISE(ABORT, 'language code not permitted');
END;

PRAGMA user_version = 1;
";

/// Drops every table, dependents first, so [`SCHEMA`] can recreate them
/// empty.
pub const DROP_SCHEMA: &str = "
DROP TABLE IF EXISTS title_aliases;
DROP TABLE IF EXISTS file_authors;
DROP TABLE IF EXISTS files;
DROP TABLE IF EXISTS authors;
DROP TABLE IF EXISTS permitted_languages;
DROP TABLE IF EXISTS language_codes;
DROP TABLE IF EXISTS publication_types;
DROP TABLE IF EXISTS file_types;
";
