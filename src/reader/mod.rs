//! Input boundary: one materialized tabular dataset
//!
//! The object-storage retrieval layer is an external collaborator; its whole
//! contract with this crate is "hand over one fully-materialized table".
//! `RawTable` is that table, and the CSV loader here is the minimal local
//! materializer the CLI uses.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;

use crate::types::Result;

/// A raw tabular dataset: header plus string cells, column names untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name, None when absent.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value at (row, column index); empty string for ragged rows.
    pub fn cell<'a>(&'a self, row: &'a [String], index: usize) -> &'a str {
        row.get(index).map(String::as_str).unwrap_or("")
    }

    /// Load a CUR CSV file from disk.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let table = Self::from_csv_reader(file)?;
        info!(
            "loaded {} rows, {} columns from {}",
            table.rows.len(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load CUR CSV from any reader. The first record is the header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self { columns, rows })
    }
}
