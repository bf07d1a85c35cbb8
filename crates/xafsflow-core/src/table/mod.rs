//! Column-oriented spectral table shared by every workflow step.
//!
//! Columns are typed (`Float`, `Integer`, `Text`) and all have the table's row
//! count. Missing floats are `NaN`, missing integers are `None`.

use crate::domain::{GroupKey, KeyValue, XafsError, XafsResult};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum Column {
    Float(Vec<f64>),
    Integer(Vec<Option<i64>>),
    Text(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float,
    Integer,
    Text,
}

impl ColumnKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Text => "text",
        }
    }
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Float(values) => values.len(),
            Self::Integer(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Float(_) => ColumnKind::Float,
            Self::Integer(_) => ColumnKind::Integer,
            Self::Text(_) => ColumnKind::Text,
        }
    }

    pub fn empty_like(&self) -> Self {
        match self {
            Self::Float(_) => Self::Float(Vec::new()),
            Self::Integer(_) => Self::Integer(Vec::new()),
            Self::Text(_) => Self::Text(Vec::new()),
        }
    }

    pub fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Float(values) => Self::Float(rows.iter().map(|&row| values[row]).collect()),
            Self::Integer(values) => Self::Integer(rows.iter().map(|&row| values[row]).collect()),
            Self::Text(values) => {
                Self::Text(rows.iter().map(|&row| values[row].clone()).collect())
            }
        }
    }

    /// Categorical value at `row`; `None` for float columns.
    pub fn key_at(&self, row: usize) -> Option<KeyValue> {
        match self {
            Self::Float(_) => None,
            Self::Integer(values) => Some(KeyValue::Integer(values[row])),
            Self::Text(values) => Some(KeyValue::Text(values[row].clone())),
        }
    }

    /// Column holding `count` copies of a key value.
    pub fn repeat_key(value: &KeyValue, count: usize) -> Self {
        match value {
            KeyValue::Integer(value) => Self::Integer(vec![*value; count]),
            KeyValue::Text(value) => Self::Text(vec![value.clone(); count]),
        }
    }

    fn append(&mut self, other: Column) -> Result<(), ColumnKind> {
        match (self, other) {
            (Self::Float(lhs), Self::Float(rhs)) => lhs.extend(rhs),
            (Self::Integer(lhs), Self::Integer(rhs)) => lhs.extend(rhs),
            (Self::Text(lhs), Self::Text(rhs)) => lhs.extend(rhs),
            (_, other) => return Err(other.kind()),
        }
        Ok(())
    }
}

/// Rows sharing one partition key, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: GroupKey,
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectralTable {
    row_count: usize,
    columns: Vec<NamedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct NamedColumn {
    name: String,
    column: Column,
}

impl SpectralTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns<I, S>(columns: I) -> XafsResult<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, column) in columns {
            table = table.with_column(name, column)?;
        }
        Ok(table)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|named| named.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|index| &self.columns[index].column)
    }

    pub fn require_column(&self, name: &str) -> XafsResult<&Column> {
        self.column(name).ok_or_else(|| {
            XafsError::input_validation(
                "INPUT.TABLE_COLUMN",
                format!(
                    "table has no column '{}' (available: {})",
                    name,
                    self.column_names().collect::<Vec<_>>().join(", ")
                ),
            )
        })
    }

    pub fn float_column(&self, name: &str) -> XafsResult<&[f64]> {
        match self.require_column(name)? {
            Column::Float(values) => Ok(values),
            other => Err(kind_mismatch(name, ColumnKind::Float, other.kind())),
        }
    }

    pub fn integer_column(&self, name: &str) -> XafsResult<&[Option<i64>]> {
        match self.require_column(name)? {
            Column::Integer(values) => Ok(values),
            other => Err(kind_mismatch(name, ColumnKind::Integer, other.kind())),
        }
    }

    pub fn text_column(&self, name: &str) -> XafsResult<&[String]> {
        match self.require_column(name)? {
            Column::Text(values) => Ok(values),
            other => Err(kind_mismatch(name, ColumnKind::Text, other.kind())),
        }
    }

    /// Returns a table with `name` set to `column`, replacing an existing
    /// column of the same name in place.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> XafsResult<Self> {
        let name = name.into();
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(XafsError::input_validation(
                "INPUT.TABLE_SHAPE",
                format!(
                    "column '{}' has {} rows but the table has {}",
                    name,
                    column.len(),
                    self.row_count
                ),
            ));
        }

        self.row_count = column.len();
        match self.position(&name) {
            Some(index) => self.columns[index].column = column,
            None => self.columns.push(NamedColumn { name, column }),
        }
        Ok(self)
    }

    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            row_count: rows.len(),
            columns: self
                .columns
                .iter()
                .map(|named| NamedColumn {
                    name: named.name.clone(),
                    column: named.column.take(rows),
                })
                .collect(),
        }
    }

    /// Row-wise concatenation; every table must share the first table's
    /// column names and kinds. Row identity is not preserved.
    pub fn concat<I>(tables: I) -> XafsResult<Self>
    where
        I: IntoIterator<Item = SpectralTable>,
    {
        let mut tables = tables.into_iter();
        let Some(mut combined) = tables.next() else {
            return Ok(Self::new());
        };

        for (offset, table) in tables.enumerate() {
            combined.check_same_schema(&table, offset + 1)?;
            combined.row_count += table.row_count;
            for (target, source) in combined.columns.iter_mut().zip(table.columns) {
                target.column.append(source.column).map_err(|kind| {
                    kind_mismatch(&target.name, target.column.kind(), kind)
                })?;
            }
        }

        Ok(combined)
    }

    /// Partitions rows by the categorical `keys`, in encounter order. With no
    /// keys the whole table is one partition with an empty key.
    pub fn partition(&self, keys: &[String]) -> XafsResult<Vec<Partition>> {
        if keys.is_empty() {
            return Ok(vec![Partition {
                key: GroupKey::default(),
                rows: (0..self.row_count).collect(),
            }]);
        }

        let key_columns = keys
            .iter()
            .map(|key| {
                let column = self.require_column(key)?;
                if column.kind() == ColumnKind::Float {
                    return Err(XafsError::input_validation(
                        "INPUT.GROUP_KEY",
                        format!("group key '{}' must be an integer or text column", key),
                    ));
                }
                Ok(column)
            })
            .collect::<XafsResult<Vec<_>>>()?;

        let mut partitions: Vec<Partition> = Vec::new();
        let mut lookup: HashMap<GroupKey, usize> = HashMap::new();
        for row in 0..self.row_count {
            let key = GroupKey(
                key_columns
                    .iter()
                    .filter_map(|column| column.key_at(row))
                    .collect(),
            );
            match lookup.get(&key) {
                Some(&index) => partitions[index].rows.push(row),
                None => {
                    lookup.insert(key.clone(), partitions.len());
                    partitions.push(Partition {
                        key,
                        rows: vec![row],
                    });
                }
            }
        }

        Ok(partitions)
    }

    pub(crate) fn named_columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns
            .iter()
            .map(|named| (named.name.as_str(), &named.column))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|named| named.name == name)
    }

    fn check_same_schema(&self, other: &SpectralTable, table_index: usize) -> XafsResult<()> {
        let same = self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(lhs, rhs)| lhs.name == rhs.name && lhs.column.kind() == rhs.column.kind());
        if same {
            return Ok(());
        }

        Err(XafsError::input_validation(
            "INPUT.TABLE_CONCAT",
            format!(
                "table {} has columns [{}] but expected [{}]",
                table_index,
                other.column_names().collect::<Vec<_>>().join(", "),
                self.column_names().collect::<Vec<_>>().join(", ")
            ),
        ))
    }
}

fn kind_mismatch(name: &str, expected: ColumnKind, actual: ColumnKind) -> XafsError {
    XafsError::input_validation(
        "INPUT.TABLE_COLUMN_KIND",
        format!(
            "column '{}' is {} but {} was expected",
            name,
            actual.as_str(),
            expected.as_str()
        ),
    )
}
