//! Tabular container for expanded query results.
//!
//! A [`Frame`] is a small column-ordered table: a header, rows of
//! [`Cell`]s, and a count of leading index columns. It supports exactly
//! the reshaping the presentation layer needs — dtype coercion, row
//! filtering, column selection, multi-key descending sort, and CSV/text
//! serialization. Construction goes through [`crate::results::BwResults`].

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::schema::Dtype;

/// Sentinel strings treated as "unknown/unspecified" bucket values.
///
/// Rows containing an exact match of any of these are dropped when
/// `drop_unknowns` is requested. Matching is exact: "unknowable" survives.
pub const UNKNOWN_SENTINELS: [&str; 13] = [
    "No place, unknown, or undetermined",
    "",
    " ",
    "Unknown",
    "unknown",
    "Unknown or not specified",
    "No attempt to code",
    "Undetermined",
    "|||",
    "???",
    "N/A",
    "und",
    "unk",
];

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Null,
}

impl Cell {
    /// Convert a raw JSON value into a cell, without coercion.
    pub fn from_value(value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Str(b.to_string()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Cell::Int(i)
                } else {
                    Cell::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Cell::Str(s.clone()),
            other => Cell::Str(other.to_string()),
        }
    }

    /// Apply the dtype reported by the field schema.
    ///
    /// Integer coercion parses numeric strings; datetime coercion parses
    /// ISO dates and bare years. Values that do not parse stay as they
    /// arrived: server-reported dtypes are advisory, not guarantees.
    pub fn coerce(self, dtype: Dtype) -> Cell {
        match (dtype, self) {
            (Dtype::Integer, Cell::Str(s)) => match s.trim().parse::<i64>() {
                Ok(i) => Cell::Int(i),
                Err(_) => Cell::Str(s),
            },
            (Dtype::Datetime, Cell::Str(s)) => match parse_date(&s) {
                Some(d) => Cell::Date(d),
                None => Cell::Str(s),
            },
            (_, cell) => cell,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Cell::Int(0)) || matches!(self, Cell::Float(f) if *f == 0.0)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Total order used for sorting: null < numbers < dates < strings.
    fn sort_key_rank(&self) -> u8 {
        match self {
            Cell::Null => 0,
            Cell::Int(_) | Cell::Float(_) => 1,
            Cell::Date(_) => 2,
            Cell::Str(_) => 3,
        }
    }

    fn compare(&self, other: &Cell) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Int(a), Cell::Float(b)) => (*a as f64).total_cmp(b),
            (Cell::Float(a), Cell::Int(b)) => a.total_cmp(&(*b as f64)),
            (Cell::Float(a), Cell::Float(b)) => a.total_cmp(b),
            (Cell::Str(a), Cell::Str(b)) => a.cmp(b),
            (Cell::Date(a), Cell::Date(b)) => a.cmp(b),
            (Cell::Null, Cell::Null) => Ordering::Equal,
            (a, b) => a.sort_key_rank().cmp(&b.sort_key_rank()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Str(s) => write!(f, "{}", s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Null => Ok(()),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    // Bare years are common in date_year-style fields.
    if let Ok(year) = trimmed.parse::<i32>() {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

/// Column-ordered table with a leading block of index columns.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    index_width: usize,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            columns,
            rows,
            index_width: 0,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn index_width(&self) -> usize {
        self.index_width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Apply schema dtypes to every cell of the named columns.
    pub fn coerce(&mut self, dtypes: &HashMap<String, Dtype>) {
        for (pos, column) in self.columns.iter().enumerate() {
            let Some(&dtype) = dtypes.get(column) else {
                continue;
            };
            if dtype == Dtype::Integer || dtype == Dtype::Datetime {
                for row in &mut self.rows {
                    let cell = std::mem::replace(&mut row[pos], Cell::Null);
                    row[pos] = cell.coerce(dtype);
                }
            }
        }
    }

    /// Drop every row containing an exact match of any sentinel value.
    pub fn drop_unknown_rows(&mut self) {
        self.rows.retain(|row| {
            !row.iter().any(|cell| {
                cell.as_str()
                    .is_some_and(|s| UNKNOWN_SENTINELS.contains(&s))
            })
        });
    }

    /// Substitute values of one column through a code -> label map.
    ///
    /// Codes without a mapping pass through untouched.
    pub fn replace_in_column(&mut self, column: &str, labels: &HashMap<String, String>) {
        let Some(pos) = self.column_position(column) else {
            return;
        };
        for row in &mut self.rows {
            let Some(label) = row[pos].as_str().and_then(|code| labels.get(code)) else {
                continue;
            };
            row[pos] = Cell::Str(label.clone());
        }
    }

    /// Mark the first `width` columns as the row index.
    pub fn set_index(&mut self, width: usize) {
        self.index_width = width.min(self.columns.len());
    }

    /// Restrict and reorder columns to exactly `wanted`, in order.
    ///
    /// Unknown names are skipped rather than invented.
    pub fn select(&mut self, wanted: &[String]) {
        let positions: Vec<usize> = wanted
            .iter()
            .filter_map(|name| self.column_position(name))
            .collect();
        self.columns = positions.iter().map(|&p| self.columns[p].clone()).collect();
        for row in &mut self.rows {
            *row = positions.iter().map(|&p| row[p].clone()).collect();
        }
        self.index_width = 0;
    }

    /// Remove rows where every one of the named columns is zero.
    pub fn drop_zero_rows(&mut self, count_columns: &[String]) {
        let positions: Vec<usize> = count_columns
            .iter()
            .filter_map(|name| self.column_position(name))
            .collect();
        if positions.is_empty() {
            return;
        }
        self.rows
            .retain(|row| !positions.iter().all(|&p| row[p].is_zero()));
    }

    /// Stable multi-key descending sort on the named columns.
    pub fn sort_desc(&mut self, columns: &[String]) {
        let positions: Vec<usize> = columns
            .iter()
            .filter_map(|name| self.column_position(name))
            .collect();
        if positions.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            for &p in &positions {
                let ord = b[p].compare(&a[p]);
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });
    }

    /// Serialize the whole frame, index columns included, as CSV.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&csv_line(self.columns.iter().map(String::as_str)));
        for row in &self.rows {
            let rendered: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            out.push_str(&csv_line(rendered.iter().map(String::as_str)));
        }
        out
    }

    /// Rows as plain value tuples, in column order.
    pub fn tuples(&self) -> Vec<Vec<Cell>> {
        self.rows.clone()
    }

    /// Render an aligned text table.
    pub fn to_table(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();
        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let mut lines = Vec::new();
        lines.push(pad_row(&self.columns, &widths));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &rendered {
            lines.push(pad_row(row, &widths));
        }
        lines.join("\n")
    }
}

fn pad_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell.as_ref(), width = w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn csv_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut line = fields.map(csv_field).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') || raw.contains('\r') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
