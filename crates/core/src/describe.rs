//! Field-description tables.
//!
//! A description table is comma-separated text with a header row, read with
//! the `csv` crate. Quoted fields may hold commas and line breaks, every
//! field is trimmed, and records may be shorter than the header. Only the
//! columns named in [`COLUMNS`] are read; anything else is ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns a description table must carry.
pub const COLUMNS: [&str; 8] = [
    "Parent",
    "Variable",
    "Type",
    "Values",
    "Description",
    "Line",
    "Position",
    "Mandatory",
];

/// Errors raised while loading a description table.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DescribeError {
    /// The file could not be read.
    #[error("cannot read description table {path}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The header row lacks a required column.
    #[error("description table is missing column '{0}'")]
    MissingColumn(&'static str),
    /// The table has no header row.
    #[error("description table is empty")]
    Empty,
    /// The text is not well-formed CSV.
    #[error("malformed description table: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of a description table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    /// Section or group the variable belongs to.
    pub parent: String,
    /// Variable name, as used for lookup.
    pub variable: String,
    /// Declared value type, free text.
    pub value_type: String,
    /// Allowed values or range, free text.
    pub values: String,
    /// Prose description.
    pub description: String,
    /// Line within the section, free text.
    pub line: String,
    /// Position within the line, free text.
    pub position: String,
    /// Whether the `Mandatory` column reads `required`.
    pub mandatory: bool,
}

/// Descriptions keyed by variable name.
#[derive(Debug, Clone, Default)]
pub struct DescriptionTable {
    rows: Vec<Description>,
    by_name: HashMap<String, usize>,
}

impl DescriptionTable {
    /// Parse a description table from text.
    pub fn from_csv(text: &str) -> Result<Self, DescribeError> {
        Self::read(text.as_bytes())
    }

    /// Read and parse a description table from disk.
    pub fn load(path: &Path) -> Result<Self, DescribeError> {
        let bytes = std::fs::read(path).map_err(|source| DescribeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read(&bytes)
    }

    fn read(bytes: &[u8]) -> Result<Self, DescribeError> {
        let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader.headers()?;
        if headers.iter().all(str::is_empty) {
            return Err(DescribeError::Empty);
        }
        if let Some(name) = COLUMNS
            .into_iter()
            .find(|name| !headers.iter().any(|h| h == *name))
        {
            return Err(DescribeError::MissingColumn(name));
        }

        let mut table = Self::default();
        for record in reader.deserialize::<Row>() {
            let row = Description::from(record?);
            if row.variable.is_empty() {
                continue;
            }
            if table.by_name.contains_key(&row.variable) {
                log::debug!("duplicate description for '{}' ignored", row.variable);
                continue;
            }
            table.by_name.insert(row.variable.clone(), table.rows.len());
            table.rows.push(row);
        }
        log::debug!("loaded {} field descriptions", table.rows.len());
        Ok(table)
    }

    /// Description of `variable`, matched exactly. The first row wins when a
    /// name repeats.
    pub fn get(&self, variable: &str) -> Option<&Description> {
        self.by_name.get(variable).map(|&i| &self.rows[i])
    }

    /// Number of distinct variables.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Description> {
        self.rows.iter()
    }
}

// ── Rows ───────────────────────────────────────────────────────────────

/// One record as it sits on disk. Columns past the end of a short record,
/// and empty cells, read as `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Row {
    parent: Option<String>,
    variable: Option<String>,
    #[serde(rename = "Type")]
    value_type: Option<String>,
    values: Option<String>,
    description: Option<String>,
    line: Option<String>,
    position: Option<String>,
    mandatory: Option<String>,
}

impl From<Row> for Description {
    fn from(row: Row) -> Self {
        Self {
            mandatory: row.mandatory.as_deref() == Some("required"),
            parent: row.parent.unwrap_or_default(),
            variable: row.variable.unwrap_or_default(),
            value_type: row.value_type.unwrap_or_default(),
            values: row.values.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            line: row.line.unwrap_or_default(),
            position: row.position.unwrap_or_default(),
        }
    }
}
