//! Runtime configuration, deserialised from `nvg-sync.toml` and `NVG_*`
//! environment variables.

use std::path::PathBuf;

use nvg_core::{catalog::Language, language::DEFAULT_LANGUAGES};
use nvg_csv::SourceEncoding;
use serde::Deserialize;

/// Top-level configuration of a sync run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// SQLite database file.
  pub database:         PathBuf,
  pub catalog:          SourceConfig,
  pub author_aliases:   SourceConfig,
  pub cross_references: SourceConfig,
  /// Language names as written in the catalog and the codes they map to.
  pub languages:        Vec<LanguageConfig>,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      database:         PathBuf::from("nvg.sqlite3"),
      catalog:          SourceConfig {
        path:     PathBuf::from("00_table.csv"),
        url:      Some("https://ftp.nvg.ntnu.no/pub/cpc/00_table.csv".to_owned()),
        encoding: SourceEncoding::Latin1,
      },
      author_aliases:   SourceConfig::local("author_aliases.csv"),
      cross_references: SourceConfig::local("cross_references.csv"),
      languages:        DEFAULT_LANGUAGES
        .iter()
        .map(|(name, code)| LanguageConfig {
          name: (*name).to_owned(),
          code: (*code).to_owned(),
        })
        .collect(),
    }
  }
}

impl SyncConfig {
  /// The language vocabulary rows, one per code. When a code is listed under
  /// several names, the first name wins.
  pub fn language_vocabulary(&self) -> Vec<Language> {
    let mut seen = std::collections::BTreeSet::new();
    self
      .languages
      .iter()
      .filter(|l| seen.insert(l.code.as_str()))
      .map(|l| Language { code: l.code.clone(), name: l.name.clone() })
      .collect()
  }

  /// The environment layer: `NVG_DATABASE`, `NVG_CATALOG__URL` and so on.
  /// A double underscore separates nested keys.
  pub fn environment() -> config::Environment {
    config::Environment::with_prefix("NVG")
      .prefix_separator("_")
      .separator("__")
  }

  /// Catalog language name → code.
  pub fn language_codes(&self) -> std::collections::BTreeMap<String, String> {
    self
      .languages
      .iter()
      .map(|l| (l.name.clone(), l.code.clone()))
      .collect()
  }
}

/// Where one input file lives locally, and optionally where to fetch it.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
  pub path:     PathBuf,
  #[serde(default)]
  pub url:      Option<String>,
  #[serde(default)]
  pub encoding: SourceEncoding,
}

impl SourceConfig {
  fn local(path: &str) -> Self {
    Self { path: PathBuf::from(path), url: None, encoding: SourceEncoding::Latin1 }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageConfig {
  pub name: String,
  pub code: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_carry_the_builtin_languages() {
    let config = SyncConfig::default();
    let codes = config.language_codes();
    assert_eq!(codes.len(), 13);
    assert_eq!(codes["English (American)"], "en-US");
    assert_eq!(config.language_vocabulary().len(), 13);
  }

  #[test]
  fn vocabulary_keeps_first_name_per_code() {
    let config = SyncConfig {
      languages: vec![
        LanguageConfig { name: "English".into(), code: "en".into() },
        LanguageConfig { name: "Anglais".into(), code: "en".into() },
      ],
      ..SyncConfig::default()
    };
    let vocabulary = config.language_vocabulary();
    assert_eq!(vocabulary, [Language { code: "en".into(), name: "English".into() }]);
    assert_eq!(config.language_codes().len(), 2);
  }

  #[test]
  fn partial_file_falls_back_to_defaults() {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(
        "database = \"/tmp/cpc.sqlite3\"\n\
         [author_aliases]\n\
         path = \"aliases.csv\"\n\
         encoding = \"utf8\"\n",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap();
    let config: SyncConfig = settings.try_deserialize().unwrap();

    assert_eq!(config.database, PathBuf::from("/tmp/cpc.sqlite3"));
    assert_eq!(config.author_aliases.encoding, SourceEncoding::Utf8);
    assert_eq!(config.author_aliases.url, None);
    assert_eq!(config.catalog.path, PathBuf::from("00_table.csv"));
    assert_eq!(config.languages.len(), 13);
  }

  #[test]
  fn environment_uses_single_underscore_prefix() {
    let env = config::Map::from([
      ("NVG_DATABASE".to_string(), "/srv/nvg.sqlite3".to_string()),
      ("NVG_CATALOG__URL".to_string(), "https://example.org/00_table.csv".to_string()),
    ]);
    let settings = config::Config::builder()
      .add_source(SyncConfig::environment().source(Some(env)))
      .build()
      .unwrap();

    assert_eq!(
      settings.get_string("database").unwrap(),
      "/srv/nvg.sqlite3"
    );
    assert_eq!(
      settings.get_string("catalog.url").unwrap(),
      "https://example.org/00_table.csv"
    );
  }
}
