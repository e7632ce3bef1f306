//! Input acquisition: local copies of the three input files, optionally
//! refreshed from their configured URLs first.

use std::{collections::BTreeMap, time::Duration};

use nvg_core::record::Catalog;
use reqwest::Client;
use tracing::{info, warn};

use crate::{
  Error, Result,
  config::{SourceConfig, SyncConfig},
};

/// The decoded inputs of one run.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
  pub catalog:          Catalog,
  /// `alias → real name`. Empty when the alias file is unavailable.
  pub author_aliases:   BTreeMap<String, String>,
  /// `path → external id`, or `None` when the cross-reference file is
  /// unavailable, in which case stored ids are left alone.
  pub cross_references: Option<BTreeMap<String, Option<u32>>>,
}

/// Load every input. With `fetch`, each source with a URL is downloaded to
/// its local path first.
///
/// The catalog is mandatory: failing to download or read it is fatal. The
/// alias and cross-reference files degrade to "not supplied" with a warning.
pub async fn load(config: &SyncConfig, fetch: bool) -> Result<Inputs> {
  if fetch {
    let client = Client::builder()
      .timeout(Duration::from_secs(120))
      .build()
      .map_err(Error::Client)?;

    download(&client, &config.catalog).await?;
    for source in [&config.author_aliases, &config.cross_references] {
      if let Err(e) = download(&client, source).await {
        warn!(error = %e, "keeping the existing local copy");
      }
    }
  }

  info!(path = %config.catalog.path.display(), "reading catalog");
  let catalog = nvg_csv::read_catalog_path(&config.catalog.path, config.catalog.encoding)?;

  let author_aliases = optional(
    &config.author_aliases,
    "author aliases",
    nvg_csv::read_author_aliases_path(&config.author_aliases.path, config.author_aliases.encoding),
  )?
  .unwrap_or_default();

  let cross_references = optional(
    &config.cross_references,
    "cross-references",
    nvg_csv::read_cross_references_path(
      &config.cross_references.path,
      config.cross_references.encoding,
    ),
  )?;

  info!(
    files = catalog.len(),
    aliases = author_aliases.len(),
    cross_references = cross_references.as_ref().map_or(0, BTreeMap::len),
    "inputs loaded"
  );

  Ok(Inputs { catalog, author_aliases, cross_references })
}

/// Treat a missing optional input as absent.
fn optional<T>(
  source: &SourceConfig,
  what: &'static str,
  read: nvg_csv::Result<T>,
) -> Result<Option<T>> {
  match read {
    Ok(value) => Ok(Some(value)),
    Err(e) if e.is_not_found() => {
      warn!(path = %source.path.display(), "no {what} file; skipping {what}");
      Ok(None)
    }
    Err(e) => Err(e.into()),
  }
}

/// Download `source.url`, if set, over `source.path`.
async fn download(client: &Client, source: &SourceConfig) -> Result<()> {
  let Some(url) = &source.url else {
    return Ok(());
  };

  info!(url = %url, path = %source.path.display(), "downloading");
  let fetch_err = |source| Error::Fetch { url: url.clone(), source };
  let body = client
    .get(url)
    .send()
    .await
    .and_then(reqwest::Response::error_for_status)
    .map_err(fetch_err)?
    .bytes()
    .await
    .map_err(fetch_err)?;

  tokio::fs::write(&source.path, &body)
    .await
    .map_err(|e| Error::Io { path: source.path.clone(), source: e })
}
