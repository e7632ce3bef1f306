//! Row decoding for the three input tables.

use std::{collections::BTreeMap, io::Read};

use csv::{ByteRecord, ReaderBuilder};
use nvg_core::record::{CATALOG_COLUMNS, Catalog, Column, RawRecord};
use tracing::{debug, warn};

use crate::{Error, Result, SourceEncoding};

// ─── Shared helpers ──────────────────────────────────────────────────────────

fn reader<R: Read>(input: R) -> csv::Reader<R> {
  ReaderBuilder::new()
    .has_headers(true)
    // Trailing empty columns are routinely missing from older rows.
    .flexible(true)
    .from_reader(input)
}

fn line_of(record: &ByteRecord) -> u64 {
  record.position().map(|p| p.line()).unwrap_or_default()
}

/// Decode every field of `record` and trim surrounding whitespace.
fn decode(record: &ByteRecord, encoding: SourceEncoding) -> Result<Vec<String>> {
  let enc = encoding.encoding();
  record
    .iter()
    .enumerate()
    .map(|(column, bytes)| {
      enc
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|s| s.trim().to_owned())
        .ok_or_else(|| Error::Encoding {
          line: line_of(record),
          column,
          encoding: enc.name(),
        })
    })
    .collect()
}

fn field(fields: &[String], index: usize) -> &str {
  fields.get(index).map(String::as_str).unwrap_or("")
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

pub fn catalog<R: Read>(input: R, encoding: SourceEncoding) -> Result<Catalog> {
  let mut csv = reader(input);
  let mut record = ByteRecord::new();
  let mut catalog = Catalog::new();

  while csv.read_byte_record(&mut record)? {
    let line = line_of(&record);
    let fields = decode(&record, encoding)?;

    let path = field(&fields, Column::Path as usize);
    if path.is_empty() {
      warn!(line, "skipping catalog row without a file path");
      continue;
    }

    let size_str = field(&fields, Column::Size as usize);
    let size = size_str.parse::<u64>().map_err(|_| Error::InvalidSize {
      line,
      path: path.to_owned(),
      value: size_str.to_owned(),
    })?;

    if fields.len() > CATALOG_COLUMNS {
      debug!(line, path, extra = fields.len() - CATALOG_COLUMNS, "ignoring surplus columns");
    }

    let mut raw = RawRecord::new(path, size);
    // Action, path and size are structural; everything after is an attribute.
    for (index, value) in fields.iter().enumerate().skip(Column::Size as usize + 1) {
      if value.is_empty() {
        continue;
      }
      if let Some(column) = Column::at(index) {
        raw.fields.insert(column, value.clone());
      }
    }

    if catalog.insert(raw.path.clone(), raw).is_some() {
      warn!(line, path, "duplicate catalog path; keeping the later row");
    }
  }

  Ok(catalog)
}

// ─── Author aliases ──────────────────────────────────────────────────────────

pub fn author_aliases<R: Read>(
  input: R,
  encoding: SourceEncoding,
) -> Result<BTreeMap<String, String>> {
  let mut csv = reader(input);
  let mut record = ByteRecord::new();
  let mut aliases = BTreeMap::new();

  while csv.read_byte_record(&mut record)? {
    let line = line_of(&record);
    let fields = decode(&record, encoding)?;
    let (alias, name) = (field(&fields, 0), field(&fields, 1));

    if alias.is_empty() || name.is_empty() {
      warn!(line, alias, name, "skipping incomplete author alias row");
      continue;
    }

    if let Some(previous) = aliases.insert(alias.to_owned(), name.to_owned()) {
      warn!(line, alias, previous = %previous, name, "author alias listed twice; keeping the later row");
    }
  }

  Ok(aliases)
}

// ─── Cross-references ────────────────────────────────────────────────────────

pub fn cross_references<R: Read>(
  input: R,
  encoding: SourceEncoding,
) -> Result<BTreeMap<String, Option<u32>>> {
  let mut csv = reader(input);
  let mut record = ByteRecord::new();
  let mut references = BTreeMap::new();

  while csv.read_byte_record(&mut record)? {
    let line = line_of(&record);
    let fields = decode(&record, encoding)?;
    let path = field(&fields, 0);
    if path.is_empty() {
      continue;
    }

    let id = match field(&fields, 1) {
      "" => None,
      raw => match raw.parse::<i64>() {
        Ok(n) if n < 0 => {
          warn!(line, path, id = n, "negative external id; treating as unknown");
          None
        }
        Ok(n) => match u32::try_from(n) {
          Ok(id) => Some(id),
          Err(_) => {
            warn!(line, path, id = n, "external id out of range; treating as unknown");
            None
          }
        },
        Err(_) => {
          warn!(line, path, id = raw, "malformed external id; treating as unknown");
          None
        }
      },
    };

    references.insert(path.to_owned(), id);
  }

  Ok(references)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
