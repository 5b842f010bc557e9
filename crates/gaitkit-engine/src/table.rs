//! In-memory flat table consumed by the engine
//!
//! A [`Table`] is a set of equally long named columns, one row per phase
//! sample. Reading it from disk is the caller's business; the engine only
//! needs the materialized columns.
//!
//! # Example
//!
//! ```
//! use gaitkit_engine::table::{Column, Table};
//!
//! let table = Table::new(vec![
//!     ("subject".into(), Column::Text(vec!["S1".into(), "S1".into()])),
//!     ("task".into(), Column::Text(vec!["walk".into(), "walk".into()])),
//!     ("knee_flexion_angle_rad".into(), Column::Numeric(vec![0.1, 0.2])),
//! ])
//! .unwrap();
//!
//! assert_eq!(table.num_rows(), 2);
//! assert_eq!(table.numeric_column("knee_flexion_angle_rad"), Some(&[0.1, 0.2][..]));
//! ```

use std::collections::HashMap;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("column '{name}' appears more than once")]
    DuplicateColumn { name: String },
    #[display("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// One column of the flat table.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Identifier column (subject, task, ...)
    Text(Vec<String>),
    /// Signal or phase column
    Numeric(Vec<f64>),
}

impl Column {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Text(values) => values.len(),
            Column::Numeric(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, rows: &[usize]) -> Self {
        match self {
            Column::Text(values) => Column::Text(rows.iter().map(|&r| values[r].clone()).collect()),
            Column::Numeric(values) => Column::Numeric(rows.iter().map(|&r| values[r]).collect()),
        }
    }
}

/// Named columns of equal length, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    positions: HashMap<String, usize>,
    num_rows: usize,
}

impl Table {
    /// Builds a table from `(name, column)` pairs.
    ///
    /// The first column fixes the row count; every other column must match it.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self, TableError> {
        let num_rows = columns.first().map_or(0, |(_, column)| column.len());
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        let mut positions = HashMap::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != num_rows {
                return Err(TableError::LengthMismatch {
                    name,
                    expected: num_rows,
                    actual: column.len(),
                });
            }
            if positions.insert(name.clone(), names.len()).is_some() {
                return Err(TableError::DuplicateColumn { name });
            }
            names.push(name);
            values.push(column);
        }

        Ok(Self {
            names,
            columns: values,
            positions,
            num_rows,
        })
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.positions.get(name).map(|&i| &self.columns[i])
    }

    #[must_use]
    pub fn text_column(&self, name: &str) -> Option<&[String]> {
        match self.column(name)? {
            Column::Text(values) => Some(values),
            Column::Numeric(_) => None,
        }
    }

    #[must_use]
    pub fn numeric_column(&self, name: &str) -> Option<&[f64]> {
        match self.column(name)? {
            Column::Numeric(values) => Some(values),
            Column::Text(_) => None,
        }
    }

    /// Returns a new table holding the rows where `mask` is `true`, in the
    /// original order.
    ///
    /// # Panics
    ///
    /// Panics if `mask` does not have one entry per row.
    #[must_use]
    pub fn filter_rows(&self, mask: &[bool]) -> Self {
        assert_eq!(mask.len(), self.num_rows, "mask must cover every row");
        let rows = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect::<Vec<_>>();
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(&rows)).collect(),
            positions: self.positions.clone(),
            num_rows: rows.len(),
        }
    }
}
