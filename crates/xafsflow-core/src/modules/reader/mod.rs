//! Whitespace or character delimited spectrum files (`.nor` exports).
//!
//! Each file becomes a block of rows tagged with a sample label taken from
//! the file name without its final extension (`sampleA.1.nor` -> `sampleA.1`).
//! Several files are read one by one and concatenated.

mod parser;

use crate::domain::{ENERGY_COLUMN, FLAT_COLUMN, SAMPLE_NAME_COLUMN, XafsError, XafsResult};
use crate::table::{Column, SpectralTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use parser::{parse_columns, read_source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Any run of spaces or tabs.
    #[default]
    Whitespace,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderOptions {
    pub comment: Option<char>,
    pub delimiter: Delimiter,
    /// Zero-based field indices to keep, paired with `names`.
    pub use_columns: Vec<usize>,
    pub names: Vec<String>,
    #[serde(alias = "sampleDim")]
    pub sample_label_column: Option<String>,
    #[serde(alias = "pathDim")]
    pub path_label_column: Option<String>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            comment: Some('#'),
            delimiter: Delimiter::Whitespace,
            use_columns: vec![0, 3],
            names: vec![ENERGY_COLUMN.to_string(), FLAT_COLUMN.to_string()],
            sample_label_column: Some(SAMPLE_NAME_COLUMN.to_string()),
            path_label_column: None,
        }
    }
}

impl ReaderOptions {
    pub fn with_path_label_column(mut self, column: impl Into<String>) -> Self {
        self.path_label_column = Some(column.into());
        self
    }

    pub fn validate(&self) -> XafsResult<()> {
        if self.use_columns.is_empty() || self.use_columns.len() != self.names.len() {
            return Err(XafsError::input_validation(
                "INPUT.READER_OPTIONS",
                format!(
                    "reader needs one name per selected column, got {} columns and {} names",
                    self.use_columns.len(),
                    self.names.len()
                ),
            ));
        }

        let mut seen = HashSet::new();
        let labels = self
            .sample_label_column
            .iter()
            .chain(self.path_label_column.iter());
        for name in self.names.iter().chain(labels) {
            if !seen.insert(name.as_str()) {
                return Err(XafsError::input_validation(
                    "INPUT.READER_OPTIONS",
                    format!("reader column name '{}' is used twice", name),
                ));
            }
        }
        Ok(())
    }

    fn empty_table(&self) -> XafsResult<SpectralTable> {
        let mut table = SpectralTable::new();
        for name in &self.names {
            table = table.with_column(name.clone(), Column::Float(Vec::new()))?;
        }
        for label in self.label_columns() {
            table = table.with_column(label.to_string(), Column::Text(Vec::new()))?;
        }
        Ok(table)
    }

    fn label_columns(&self) -> impl Iterator<Item = &str> {
        self.sample_label_column
            .iter()
            .chain(self.path_label_column.iter())
            .map(String::as_str)
    }
}

/// Sample label of a spectrum file: its name with the final extension
/// removed.
pub fn sample_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn read_spectrum(path: impl AsRef<Path>, options: &ReaderOptions) -> XafsResult<SpectralTable> {
    options.validate()?;
    read_one(path.as_ref(), options)
}

/// Reads every path in order and concatenates the tables. An empty list
/// yields an empty table with the configured columns.
pub fn read_spectra<I, P>(paths: I, options: &ReaderOptions) -> XafsResult<SpectralTable>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    options.validate()?;
    let tables = paths
        .into_iter()
        .map(|path| read_one(path.as_ref(), options))
        .collect::<XafsResult<Vec<_>>>()?;

    if tables.is_empty() {
        return options.empty_table();
    }
    SpectralTable::concat(tables)
}

fn read_one(path: &Path, options: &ReaderOptions) -> XafsResult<SpectralTable> {
    let source = read_source(path)?;
    let columns = parse_columns(path, &source, options)?;
    let rows = columns.first().map_or(0, Vec::len);
    tracing::debug!(rows, "read spectrum {}", path.display());

    let mut table = SpectralTable::new();
    for (name, values) in options.names.iter().zip(columns) {
        table = table.with_column(name.clone(), Column::Float(values))?;
    }
    if let Some(column) = &options.sample_label_column {
        table = table.with_column(column.clone(), Column::Text(vec![sample_label(path); rows]))?;
    }
    if let Some(column) = &options.path_label_column {
        table = table.with_column(
            column.clone(),
            Column::Text(vec![path.display().to_string(); rows]),
        )?;
    }
    Ok(table)
}
