use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

use crate::error::{ProcessingError, Result};

/// A single value of a generic table
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Float(f64),
    Int(i64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric reading of the cell; text is parsed, anything else is not a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) if v.is_finite() => Some(*v),
            Cell::Int(v) => Some(*v as f64),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Grouping key of the cell, `None` for nulls
    pub fn as_key(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Float(v) if !v.is_finite() => serializer.serialize_none(),
            Cell::Float(v) => serializer.serialize_f64(*v),
            Cell::Int(v) => serializer.serialize_i64(*v),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Null, Cell::Float)
    }
}

impl From<Option<i64>> for Cell {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Cell::Null, Cell::Int)
    }
}

impl From<Option<&str>> for Cell {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Cell::Null, Cell::text)
    }
}

impl From<Option<NaiveDate>> for Cell {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(Cell::Null, Cell::Date)
    }
}

impl From<Option<NaiveDateTime>> for Cell {
    fn from(value: Option<NaiveDateTime>) -> Self {
        value.map_or(Cell::Null, Cell::Timestamp)
    }
}

/// Column-named rows, the shape every aggregate takes when it leaves the core
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self::with_columns(name, columns.iter().map(|c| c.to_string()).collect())
    }

    pub fn with_columns(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| ProcessingError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_json_rows(&self) -> Vec<BTreeMap<&str, &Cell>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter())
                    .collect()
            })
            .collect()
    }

    /// Mean of the first available value column per (`index`, `columns`) pair,
    /// laid out with one row per index key and one column per column key.
    ///
    /// A table lacking any of the required columns yields an empty pivot.
    pub fn pivot_mean(&self, index: &str, columns: &str, value_candidates: &[&str]) -> Table {
        match self.try_pivot_mean(index, columns, value_candidates) {
            Ok(pivot) => pivot,
            Err(e) => {
                warn!("{}; returning an empty pivot", e);
                Table::with_columns(&format!("{}_pivot", self.name), Vec::new())
            }
        }
    }

    fn try_pivot_mean(
        &self,
        index: &str,
        columns: &str,
        value_candidates: &[&str],
    ) -> Result<Table> {
        let value_col = value_candidates
            .iter()
            .find_map(|c| self.column_index(c))
            .ok_or_else(|| ProcessingError::MissingColumn {
                table: self.name.clone(),
                column: value_candidates.join(" | "),
            })?;
        let index_col = self.require_column(index)?;
        let column_col = self.require_column(columns)?;

        let mut sums: BTreeMap<String, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
        let mut keys: BTreeSet<String> = BTreeSet::new();

        for row in &self.rows {
            let (Some(row_key), Some(col_key), Some(value)) = (
                row[index_col].as_key(),
                row[column_col].as_key(),
                row[value_col].as_f64(),
            ) else {
                continue;
            };

            keys.insert(col_key.clone());
            let entry = sums
                .entry(row_key)
                .or_default()
                .entry(col_key)
                .or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        let mut header = vec![index.to_string()];
        header.extend(keys.iter().cloned());
        let mut pivot = Table::with_columns(&format!("{}_pivot", self.name), header);

        for (row_key, cells) in sums {
            let mut row = vec![Cell::Text(row_key)];
            row.extend(keys.iter().map(|k| {
                cells
                    .get(k)
                    .map_or(Cell::Null, |(sum, count)| Cell::Float(sum / *count as f64))
            }));
            pivot.push_row(row);
        }

        Ok(pivot)
    }
}
