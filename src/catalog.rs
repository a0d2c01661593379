//! Catalog entries and the data sources they are loaded from.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

/// One document in the catalog: a display name and the opaque id the
/// fetcher resolves to content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Untrusted name as exported upstream. May contain escaped markup.
    pub name: String,
    /// Non-empty identifier, only meaningful to the blob fetcher.
    pub id: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Summary counts shown when no query has been entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub unique_names: usize,
}

/// Ordered, immutable set of entries for one search session.
///
/// Names are not unique; ids are expected to be but this is not enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub const fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load every record from a data source.
    pub fn load(source: &dyn DataSource) -> Result<Self, CatalogError> {
        source.load_records().map(Self::new)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry carrying the given id.
    pub fn find(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn stats(&self) -> CatalogStats {
        let unique: HashSet<&str> = self.entries.iter().map(|e| e.name.as_str()).collect();
        CatalogStats {
            total: self.entries.len(),
            unique_names: unique.len(),
        }
    }
}

/// Where catalog records come from.
pub trait DataSource: Send + Sync {
    fn load_records(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// Catalog stored as a delimited file with a header row.
///
/// The name column is the first header containing both "file" and "name"
/// (case-insensitive, surrounding whitespace ignored) and the id column the
/// first other header containing "file" and "id".
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for CsvDataSource {
    fn load_records(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CatalogError::NotFound {
                path: self.path.clone(),
            },
            _ => CatalogError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            },
        })?;

        read_records(file, &self.path)
    }
}

/// Parse catalog records from any CSV reader. `path` is only used in errors and logs.
pub fn read_records<R: Read>(reader: R, path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    let parse_error = |e: csv::Error| CatalogError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().map_err(parse_error)?.clone();
    let (name_col, id_col) = detect_columns(&headers)?;

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        let id = record.get(id_col).unwrap_or_default().trim();
        if id.is_empty() {
            skipped += 1;
            continue;
        }
        let name = record.get(name_col).unwrap_or_default();
        entries.push(CatalogEntry::new(name, id));
    }

    if skipped > 0 {
        tracing::warn!(
            "Skipped {} catalog rows without a file id in {}",
            skipped,
            path.display()
        );
    }
    tracing::info!(
        "Loaded {} catalog entries from {} (name column '{}', id column '{}')",
        entries.len(),
        path.display(),
        &headers[name_col],
        &headers[id_col]
    );

    Ok(entries)
}

/// Find the (name, id) column indices in a header row.
pub(crate) fn detect_columns(headers: &csv::StringRecord) -> Result<(usize, usize), CatalogError> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let matches = |h: &str, part: &str| h.contains("file") && h.contains(part);

    let name_col = lowered
        .iter()
        .position(|h| matches(h, "name"))
        .ok_or(CatalogError::MissingColumn { column: "file name" })?;
    let id_col = lowered
        .iter()
        .enumerate()
        .position(|(i, h)| i != name_col && matches(h, "id"))
        .ok_or(CatalogError::MissingColumn { column: "file id" })?;

    Ok((name_col, id_col))
}
