use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{MatchStrategy, UnmatchedPolicy};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which source table a row or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Properties,
    Mortgages,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Properties => write!(f, "properties"),
            Self::Mortgages => write!(f, "mortgages"),
        }
    }
}

/// One row of the property roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRecord {
    pub parcel_id: String,
    pub address_raw: String,
    /// Assessed value exactly as it appeared in the source.
    pub assessed_value: String,
    /// Assessed value in minor units (cents).
    pub assessed_cents: i64,
}

/// One official-records row that survived the mortgage filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MortgageRecord {
    /// Zero-based data row index in the source table.
    pub source_row: usize,
    /// Empty when the column is absent or the cell is blank.
    pub parcel_id: String,
    pub address_raw: String,
    pub doc_type: String,
    pub recording_date: NaiveDate,
    pub book_page_or_instrument: Option<String>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Output header, in column order.
pub const OUTPUT_HEADER: [&str; 5] = [
    "address",
    "parcel_id",
    "assessed_value",
    "mortgage_recorded_date",
    "book_page_or_instrument",
];

/// One output row. Serialized in field order; `None` becomes an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedRecord {
    pub address: String,
    pub parcel_id: String,
    pub assessed_value: String,
    pub mortgage_recorded_date: Option<NaiveDate>,
    pub book_page_or_instrument: Option<String>,
    #[serde(skip)]
    pub matched_by: Option<MatchStrategy>,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Property-side load counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyLoadStats {
    pub rows_read: usize,
    pub loaded: usize,
    /// Rows with a blank parcel id or address.
    pub blank_key: usize,
    pub non_numeric_assessed_value: usize,
}

/// Mortgage filter counts. `rows_read` = sum of the other four.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub rows_read: usize,
    pub wrong_doc_type: usize,
    pub unparseable_date: usize,
    pub outside_window: usize,
    pub kept: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub by_parcel_id: usize,
    pub by_address: usize,
    pub unmatched: usize,
}

impl MatchStats {
    pub fn record(&mut self, matched_by: Option<MatchStrategy>) {
        match matched_by {
            Some(MatchStrategy::ParcelId) => self.by_parcel_id += 1,
            Some(MatchStrategy::Address) => self.by_address += 1,
            None => self.unmatched += 1,
        }
    }

    pub fn matched(&self) -> usize {
        self.by_parcel_id + self.by_address
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinSummary {
    pub properties: PropertyLoadStats,
    pub mortgages: FilterStats,
    pub matches: MatchStats,
    pub rows_emitted: usize,
}

impl JoinSummary {
    /// Total non-fatal row warnings (skipped for parse reasons).
    pub fn warning_count(&self) -> usize {
        self.properties.blank_key
            + self.properties.non_numeric_assessed_value
            + self.mortgages.unparseable_date
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinMeta {
    pub engine_version: String,
    pub as_of: NaiveDate,
    pub window_start: NaiveDate,
    pub lookback_years: u32,
    pub unmatched: UnmatchedPolicy,
    pub tiers: Vec<MatchStrategy>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResult {
    pub meta: JoinMeta,
    pub summary: JoinSummary,
    #[serde(skip)]
    pub rows: Vec<JoinedRecord>,
}
