//! In-memory tabular dataset with per-column type inference, and its numeric form.

use crate::error::{Error, Result};
use crate::sources::sniff_delimiter;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell texts read as missing (pandas' default NA tokens).
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    /// A column is numeric when every present cell parses as a number.
    fn infer(name: String, cells: Vec<Option<String>>) -> Self {
        let numeric: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|c| match c {
                None => Some(None),
                Some(s) => s.trim().parse::<f64>().ok().map(Some),
            })
            .collect();
        match numeric {
            Some(values) => Column::numeric(name, values),
            None => Column::text(name, cells),
        }
    }
}

/// Column-major dataset; every column has `rows` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.data.len() != rows) {
            return Err(Error::ShapeMismatch {
                expected: rows,
                found: bad.data.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Read a delimited file with a header row. Short rows are padded with nulls,
    /// long rows are skipped.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut head = Vec::new();
        File::open(path)?.take(64 * 1024).read_to_end(&mut head)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(sniff_delimiter(&head))
            .flexible(true)
            .from_path(path)?;

        let names = dedupe_names(reader.headers()?.iter().map(str::to_string).collect());
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        for row in reader.records() {
            let row = match row {
                Ok(r) => r,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(_) => continue,
            };
            if row.len() > names.len() {
                continue;
            }
            for (i, col) in cells.iter_mut().enumerate() {
                col.push(row.get(i).filter(|s| !NA_TOKENS.contains(s)).map(str::to_string));
            }
        }
        Table::new(names.into_iter().zip(cells).map(|(n, c)| Column::infer(n, c)).collect())
    }
}

/// Repeated header names get a `.N` suffix.
fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|n| {
            let mut candidate = n.clone();
            let mut i = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}.{}", n, i);
                i += 1;
            }
            candidate
        })
        .collect()
}

/// All-numeric table. Missing values are NaN until imputed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericTable {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl NumericTable {
    pub fn rows(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names.iter().position(|n| n == name).map(|i| self.columns[i].as_slice())
    }

    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.names.push(name.into());
        self.columns.push(values);
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, names: &[String]) -> NumericTable {
        let mut out = NumericTable::default();
        for name in names {
            if let Some(col) = self.column(name) {
                out.push(name.clone(), col.to_vec());
            }
        }
        out
    }

    pub fn retain_columns(&mut self, mut keep: impl FnMut(&str, &[f64]) -> bool) {
        let mut names = Vec::with_capacity(self.names.len());
        let mut columns = Vec::with_capacity(self.columns.len());
        for (n, c) in self.names.drain(..).zip(self.columns.drain(..)) {
            if keep(&n, &c) {
                names.push(n);
                columns.push(c);
            }
        }
        self.names = names;
        self.columns = columns;
    }
}
