// crates/core/src/table.rs
//! Tabular data model: tables, rows, and CSV ingest.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Unique identifier for an uploaded table.
pub type TableId = u64;

/// One row of a table: field name → value. `None` models an empty cell.
pub type Row = HashMap<String, Option<String>>;

/// A row plus any output columns produced by an enrichment run.
pub type EnrichedRow = Row;

/// An uploaded table. Immutable once stored; the engine reads it and
/// produces new enriched copies, never mutating rows in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Column names in display order. Unique, non-empty.
    pub field_names: Vec<String>,
    pub rows: Vec<Row>,
}

/// Lightweight table summary (no row data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMeta {
    pub field_names: Vec<String>,
    pub row_count: usize,
}

impl Table {
    /// Build a table, rejecting empty or duplicate field names.
    pub fn new(field_names: Vec<String>, rows: Vec<Row>) -> Result<Self, ParseError> {
        let mut seen = std::collections::HashSet::new();
        for name in &field_names {
            if name.trim().is_empty() {
                return Err(ParseError::EmptyFieldName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ParseError::DuplicateField(name.clone()));
            }
        }
        Ok(Self { field_names, rows })
    }

    /// Parse a CSV document (header row + data rows) into a table.
    ///
    /// Empty cells become `None`.
    pub fn from_csv(text: &str) -> Result<Self, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ParseError::Csv(e.to_string()))?
            .clone();
        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(ParseError::MissingHeader);
        }
        let field_names: Vec<String> = headers.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ParseError::Csv(e.to_string()))?;
            let mut row = Row::with_capacity(field_names.len());
            for (i, name) in field_names.iter().enumerate() {
                let value = record.get(i).unwrap_or_default();
                let cell = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
                row.insert(name.clone(), cell);
            }
            rows.push(row);
        }

        Self::new(field_names, rows)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_names.iter().any(|f| f == name)
    }

    pub fn meta(&self) -> TableMeta {
        TableMeta {
            field_names: self.field_names.clone(),
            row_count: self.rows.len(),
        }
    }
}

/// Build a row from (field, value) pairs. Test and ingest helper.
pub fn row_from_pairs<I, K, V>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.map(Into::into)))
        .collect()
}
