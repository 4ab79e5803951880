//! Derived Table Module
//! Result tables produced by the engine, with display and JSON record output.

use polars::prelude::*;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A single value in a derived table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Text(_) => None,
            Cell::Integer(v) => Some(*v as f64),
            Cell::Number(v) => Some(*v),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Total order used for sorting: numbers compare numerically, text
    /// lexicographically, and numbers sort before text.
    pub fn total_cmp(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Text(_), _) => Ordering::Greater,
            (_, Cell::Text(_)) => Ordering::Less,
            (a, b) => {
                let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                a.total_cmp(&b)
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Number(v) => write!(f, "{v}"),
        }
    }
}

/// Ordered rows of named columns; one row per player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl DerivedTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Rows must have one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
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

    /// Look up a cell by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, column: &str) -> Option<Vec<&Cell>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Keep only the first `n` rows.
    pub fn truncated(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Convert to a Polars DataFrame for display.
    ///
    /// A column becomes Utf8 when every cell is text, Int64 when every cell is an
    /// integer, and Float64 otherwise.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for (idx, name) in self.columns.iter().enumerate() {
            let cells = self.rows.iter().map(|r| &r[idx]);
            let column = if self.rows.iter().all(|r| matches!(r[idx], Cell::Text(_))) {
                let values: Vec<String> = cells.map(|c| c.to_string()).collect();
                Column::new(name.as_str().into(), values)
            } else if self.rows.iter().all(|r| matches!(r[idx], Cell::Integer(_))) {
                let values: Vec<i64> = cells
                    .map(|c| c.as_f64().unwrap_or_default() as i64)
                    .collect();
                Column::new(name.as_str().into(), values)
            } else {
                let values: Vec<Option<f64>> = cells.map(Cell::as_f64).collect();
                Column::new(name.as_str().into(), values)
            };
            columns.push(column);
        }
        DataFrame::new(columns)
    }
}

struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

/// Serializes as a list of records, keys in column order.
impl Serialize for DerivedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for cells in &self.rows {
            seq.serialize_element(&Record {
                columns: &self.columns,
                cells,
            })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DerivedTable {
        let mut table = DerivedTable::new(vec![
            "name".to_string(),
            "GW".to_string(),
            "total_points".to_string(),
        ]);
        table.push_row(vec![
            Cell::Text("Saka".to_string()),
            Cell::Integer(3),
            Cell::Number(21.0),
        ]);
        table.push_row(vec![
            Cell::Text("Palmer".to_string()),
            Cell::Integer(3),
            Cell::Number(18.5),
        ]);
        table
    }

    #[test]
    fn serializes_as_records_in_column_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"[{"name":"Saka","GW":3,"total_points":21.0},{"name":"Palmer","GW":3,"total_points":18.5}]"#
        );
    }

    #[test]
    fn dataframe_columns_follow_cell_types() {
        let df = sample().to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("name").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("GW").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("total_points").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn cell_ordering_is_numeric_then_text() {
        assert_eq!(Cell::Integer(2).total_cmp(&Cell::Number(10.0)), Ordering::Less);
        assert_eq!(
            Cell::Text("b".into()).total_cmp(&Cell::Text("a".into())),
            Ordering::Greater
        );
        assert_eq!(Cell::Number(1.0).total_cmp(&Cell::Text("a".into())), Ordering::Less);
    }

    #[test]
    fn lookup_by_column_name() {
        let table = sample();
        assert_eq!(table.get(1, "name").and_then(Cell::as_str), Some("Palmer"));
        assert_eq!(table.get(0, "missing"), None);
        assert_eq!(table.column("GW").map(|c| c.len()), Some(2));
    }
}
