use chrono::{Months, NaiveDate};

use crate::columns::MortgageColumns;
use crate::model::{FilterStats, MortgageRecord};
use crate::table::{cell, Table};

/// Recording-date formats, tried in order.
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m-%d-%Y"];

/// Parse a recording date. A trailing time component (`2024-03-05 00:00:00`,
/// `2024-03-05T10:00:00`) is ignored.
pub fn parse_recording_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or("");
    if date_part.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Inclusive date range `[today - years, today]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LookbackWindow {
    /// Calendar-year lookback; Feb 29 clamps to Feb 28.
    pub fn trailing_years(today: NaiveDate, years: u32) -> Self {
        let start = today
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone)]
pub struct FilterOutput {
    pub kept: Vec<MortgageRecord>,
    pub stats: FilterStats,
}

/// Keep rows whose doc type equals `doc_type` (case-insensitive) and whose
/// recording date parses and falls inside `window`. Kept rows stay in
/// source order.
pub fn filter_mortgages(
    table: &Table,
    columns: &MortgageColumns,
    window: &LookbackWindow,
    doc_type: &str,
) -> FilterOutput {
    let wanted = doc_type.trim().to_uppercase();
    let mut stats = FilterStats::default();
    let mut kept = Vec::new();

    for (source_row, row) in table.rows.iter().enumerate() {
        stats.rows_read += 1;

        let row_doc_type = cell(row, columns.doc_type);
        if row_doc_type.to_uppercase() != wanted {
            stats.wrong_doc_type += 1;
            continue;
        }

        let date_raw = cell(row, columns.recording_date);
        let Some(recording_date) = parse_recording_date(date_raw) else {
            log::debug!("mortgages row {}: unparseable recording date '{date_raw}'", source_row + 1);
            stats.unparseable_date += 1;
            continue;
        };

        if !window.contains(recording_date) {
            stats.outside_window += 1;
            continue;
        }

        let optional = |idx: Option<usize>| idx.map(|i| cell(row, i)).unwrap_or("");
        let book_page = optional(columns.book_page);
        let instrument = optional(columns.instrument_number);
        let book_page_or_instrument = [book_page, instrument]
            .into_iter()
            .find(|v| !v.is_empty())
            .map(str::to_string);

        kept.push(MortgageRecord {
            source_row,
            parcel_id: optional(columns.parcel_id).to_string(),
            address_raw: optional(columns.address).to_string(),
            doc_type: row_doc_type.to_string(),
            recording_date,
            book_page_or_instrument,
        });
    }

    stats.kept = kept.len();
    if stats.unparseable_date > 0 {
        log::warn!(
            "{} mortgage row(s) skipped: unparseable recording date",
            stats.unparseable_date
        );
    }
    log::info!(
        "mortgage filter [{} .. {}]: {} of {} rows kept ({} other doc types, {} outside window)",
        window.start,
        window.end,
        stats.kept,
        stats.rows_read,
        stats.wrong_doc_type,
        stats.outside_window,
    );

    FilterOutput { kept, stats }
}
