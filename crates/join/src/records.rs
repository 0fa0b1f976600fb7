use crate::columns::PropertyColumns;
use crate::model::{PropertyLoadStats, PropertyRecord};
use crate::table::{raw_cell, Table};

/// Parse an assessed value into minor units. Accepts an optional `$`,
/// thousands separators and a leading `-`; fractional digits past the
/// second are truncated.
pub fn parse_assessed_value(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let negative = s.starts_with('-');
    let digits: String = s
        .trim_start_matches('-')
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(format!("not a number: '{s}'"));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(format!("not a number: '{s}'"));
    }

    let dollars: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|e| format!("bad amount '{s}': {e}"))?
    };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|e| format!("bad cents: {e}"))? * 10,
        _ => frac[..2].parse().map_err(|e| format!("bad cents: {e}"))?,
    };

    let minor = dollars
        .checked_mul(100)
        .and_then(|d| d.checked_add(cents))
        .ok_or_else(|| format!("amount out of range: '{s}'"))?;
    Ok(if negative { -minor } else { minor })
}

/// Load property rows. Rows with a blank parcel id or address, or a
/// non-numeric assessed value, are skipped and counted.
pub fn load_properties(
    table: &Table,
    columns: &PropertyColumns,
) -> (Vec<PropertyRecord>, PropertyLoadStats) {
    let mut stats = PropertyLoadStats::default();
    let mut records = Vec::with_capacity(table.len());

    for (i, row) in table.rows.iter().enumerate() {
        stats.rows_read += 1;

        let parcel_id = raw_cell(row, columns.parcel_id);
        let address = raw_cell(row, columns.address);
        if parcel_id.trim().is_empty() || address.trim().is_empty() {
            stats.blank_key += 1;
            continue;
        }

        let assessed = raw_cell(row, columns.assessed_value);
        let assessed_cents = match parse_assessed_value(assessed) {
            Ok(v) => v,
            Err(e) => {
                log::debug!("properties row {}: {e}", i + 1);
                stats.non_numeric_assessed_value += 1;
                continue;
            }
        };

        records.push(PropertyRecord {
            parcel_id: parcel_id.to_string(),
            address_raw: address.to_string(),
            assessed_value: assessed.to_string(),
            assessed_cents,
        });
    }

    stats.loaded = records.len();
    if stats.blank_key + stats.non_numeric_assessed_value > 0 {
        log::warn!(
            "{} property row(s) skipped ({} blank parcel id/address, {} non-numeric assessed value)",
            stats.blank_key + stats.non_numeric_assessed_value,
            stats.blank_key,
            stats.non_numeric_assessed_value,
        );
    }

    (records, stats)
}
