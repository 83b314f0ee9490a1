//! Column-oriented record tables and their conversion to and from SD files.
//!
//! A [`Table`] is the tabular boundary of the crate: named columns holding [`Cell`]s. It
//! is filled from a molecule stream by [`flat_file_to_table`], written back out by
//! [`table_to_flat_file`], and exchanged with other tools as CSV.

mod convert;
mod delimited;

pub use convert::{
    FingerprintColumns, MissingColumns, TableReadOptions, TableWriteOptions, flat_file_to_table,
    read_sd_table, table_to_flat_file, write_table,
};

use crate::error::Error;
use crate::fingerprint::Bit;
use crate::model::props::format_float;
use std::fmt;

const FORMAT: &str = "table";

/// One table value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Reads a number where possible, otherwise keeps the text; blank text is missing.
    pub fn infer(text: &str) -> Cell {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Float(value),
            _ => Cell::Text(text.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(value) => Some(*value as f64),
            Cell::Float(value) => Some(*value),
            Cell::Text(text) => text.trim().parse().ok(),
            Cell::Missing => None,
        }
    }

    /// Converts the cell to `kind`; values that cannot be represented become missing.
    pub fn coerce(&self, kind: ColumnType) -> Cell {
        match (kind, self) {
            (_, Cell::Missing) => Cell::Missing,
            (ColumnType::Text, cell) => Cell::Text(cell.to_string()),
            (ColumnType::Float, cell) => cell.as_f64().map_or(Cell::Missing, Cell::Float),
            (ColumnType::Int, Cell::Int(value)) => Cell::Int(*value),
            (ColumnType::Int, cell) => match cell.as_f64() {
                Some(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
                    Cell::Int(value as i64)
                }
                _ => Cell::Missing,
            },
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Int(value) => write!(f, "{value}"),
            Cell::Float(value) => f.write_str(&format_float(*value)),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

impl Bit for Cell {
    fn is_set(&self) -> bool {
        self.as_f64().is_some_and(|v| v != 0.0)
    }

    fn from_bit(bit: bool) -> Self {
        Cell::Int(i64::from(bit))
    }
}

/// Target kind for an explicitly typed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

/// How column types are settled once all rows are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypePolicy {
    /// Numeric columns whose values are all integral become integer columns.
    pub integral_floats_as_int: bool,
    /// Columns mixing numbers and text become text columns.
    pub stringify_mixed: bool,
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self {
            integral_floats_as_int: true,
            stringify_mixed: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentData`] when the row width differs from the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), Error> {
        if row.len() != self.columns.len() {
            return Err(Error::inconsistent_data(
                FORMAT,
                None,
                format!(
                    "row {} has {} cells for {} columns",
                    self.rows.len() + 1,
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Settles the type of every column according to `policy`.
    pub fn apply_type_policy(&mut self, policy: &TypePolicy) {
        for idx in 0..self.columns.len() {
            let mut numeric = false;
            let mut text = false;
            let mut integral = true;
            for row in &self.rows {
                match &row[idx] {
                    Cell::Missing => {}
                    Cell::Int(_) => numeric = true,
                    Cell::Float(value) => {
                        numeric = true;
                        integral &= value.fract() == 0.0 && value.abs() < i64::MAX as f64;
                    }
                    Cell::Text(_) => text = true,
                }
            }
            let target = if numeric && text {
                policy.stringify_mixed.then_some(ColumnType::Text)
            } else if numeric && integral && policy.integral_floats_as_int {
                Some(ColumnType::Int)
            } else {
                None
            };
            if let Some(kind) = target {
                self.coerce_column_at(idx, kind);
            }
        }
    }

    /// Converts the named column to `kind`; returns `false` if there is no such column.
    pub fn coerce_column(&mut self, name: &str, kind: ColumnType) -> bool {
        match self.column_index(name) {
            Some(idx) => {
                self.coerce_column_at(idx, kind);
                true
            }
            None => false,
        }
    }

    fn coerce_column_at(&mut self, idx: usize, kind: ColumnType) {
        for row in &mut self.rows {
            row[idx] = row[idx].coerce(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<Cell>>) -> Table {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        for row in rows {
            table.push_row(row).unwrap();
        }
        table
    }

    #[test]
    fn infer_prefers_numbers_then_text() {
        assert_eq!(Cell::infer("2.5"), Cell::Float(2.5));
        assert_eq!(Cell::infer(" 3 "), Cell::Float(3.0));
        assert_eq!(Cell::infer("CHEMBL25"), Cell::Text("CHEMBL25".into()));
        assert_eq!(Cell::infer("inf"), Cell::Text("inf".into()));
        assert_eq!(Cell::infer(""), Cell::Missing);
    }

    #[test]
    fn mixed_columns_become_text() {
        let mut t = table(vec![
            vec![Cell::Float(1.5), Cell::Float(1.0)],
            vec![Cell::Text("x".into()), Cell::Missing],
        ]);
        t.apply_type_policy(&TypePolicy::default());

        assert_eq!(
            t.column("a").unwrap(),
            vec![&Cell::Text("1.5".into()), &Cell::Text("x".into())]
        );
        assert_eq!(t.column("b").unwrap(), vec![&Cell::Int(1), &Cell::Missing]);
    }

    #[test]
    fn policy_switches_can_be_turned_off() {
        let mut t = table(vec![vec![Cell::Float(2.0), Cell::Text("y".into())]]);
        t.apply_type_policy(&TypePolicy {
            integral_floats_as_int: false,
            stringify_mixed: false,
        });
        assert_eq!(t.cell(0, "a"), Some(&Cell::Float(2.0)));
    }

    #[test]
    fn coercion_turns_unparsable_values_into_missing() {
        let mut t = table(vec![
            vec![Cell::Text("4".into()), Cell::Text("n/a".into())],
            vec![Cell::Float(2.5), Cell::Int(7)],
        ]);
        assert!(t.coerce_column("a", ColumnType::Int));
        assert!(t.coerce_column("b", ColumnType::Float));
        assert!(!t.coerce_column("zzz", ColumnType::Float));

        assert_eq!(t.column("a").unwrap(), vec![&Cell::Int(4), &Cell::Missing]);
        assert_eq!(t.column("b").unwrap(), vec![&Cell::Missing, &Cell::Float(7.0)]);
    }

    #[test]
    fn rows_must_match_the_column_count() {
        let mut t = Table::new(vec!["only".into()]);
        let err = t
            .push_row(vec![Cell::Missing, Cell::Missing])
            .expect_err("two cells for one column");
        assert!(matches!(err, Error::InconsistentData { .. }));
    }

    #[test]
    fn float_cells_render_like_property_values() {
        assert_eq!(Cell::Float(1.0).to_string(), "1.0");
        assert_eq!(Cell::Int(1).to_string(), "1");
        assert_eq!(Cell::Missing.to_string(), "");
    }
}
