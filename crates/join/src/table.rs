//! In-memory tables: header row plus string cells, read from and written to
//! delimited text.

use std::io::Write;

use crate::error::JoinError;
use crate::model::{JoinedRecord, TableKind, OUTPUT_HEADER};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse comma-delimited text with a header row. Short rows are allowed
    /// (missing trailing cells read as blank); a leading UTF-8 BOM is ignored.
    pub fn from_csv_str(kind: TableKind, text: &str) -> Result<Self, JoinError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| JoinError::Csv {
                table: kind,
                message: e.to_string(),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(JoinError::Csv {
                table: kind,
                message: "missing header row".into(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| JoinError::Csv {
                table: kind,
                message: e.to_string(),
            })?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        log::debug!("{kind} table: {} columns, {} rows", headers.len(), rows.len());
        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cell value at `idx`, untouched; blank when the row is short.
pub fn raw_cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Cell value at `idx`, trimmed; blank when the row is short.
pub fn cell(row: &[String], idx: usize) -> &str {
    raw_cell(row, idx).trim()
}

/// Write the joined rows as CSV. The header is always written, even with
/// zero rows.
pub fn write_joined_csv<W: Write>(rows: &[JoinedRecord], writer: W) -> Result<(), JoinError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer
        .write_record(OUTPUT_HEADER)
        .map_err(|e| JoinError::Output(e.to_string()))?;

    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|e| JoinError::Output(e.to_string()))?;
    }

    csv_writer.flush().map_err(|e| JoinError::Output(e.to_string()))?;
    Ok(())
}
