//! Column resolution: logical field → actual header, by prioritized alias list.

use serde::Serialize;

use crate::config::AliasConfig;
use crate::error::JoinError;
use crate::model::TableKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    ParcelId,
    Address,
    AssessedValue,
    DocType,
    RecordingDate,
    BookPage,
    InstrumentNumber,
}

impl LogicalField {
    pub const ALL: [LogicalField; 7] = [
        Self::ParcelId,
        Self::Address,
        Self::AssessedValue,
        Self::DocType,
        Self::RecordingDate,
        Self::BookPage,
        Self::InstrumentNumber,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ParcelId => "parcel_id",
            Self::Address => "address",
            Self::AssessedValue => "assessed_value",
            Self::DocType => "doc_type",
            Self::RecordingDate => "recording_date",
            Self::BookPage => "book_page",
            Self::InstrumentNumber => "instrument_number",
        }
    }
}

impl std::fmt::Display for LogicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A header chosen for a logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

fn header_key(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// First header matching any alias, trying aliases in priority order.
pub fn resolve_optional(headers: &[String], aliases: &[String]) -> Option<ResolvedColumn> {
    let keys: Vec<String> = headers.iter().map(|h| header_key(h)).collect();
    aliases.iter().find_map(|alias| {
        let wanted = header_key(alias);
        if wanted.is_empty() {
            return None;
        }
        keys.iter().position(|k| *k == wanted).map(|index| ResolvedColumn {
            index,
            header: headers[index].clone(),
        })
    })
}

pub fn resolve_column(
    table: TableKind,
    headers: &[String],
    field: LogicalField,
    aliases: &[String],
) -> Result<ResolvedColumn, JoinError> {
    let resolved = resolve_optional(headers, aliases)
        .ok_or_else(|| JoinError::missing_column(table, field, aliases))?;
    log::info!("{table}: {field} -> '{}'", resolved.header);
    Ok(resolved)
}

fn resolve_field(
    table: TableKind,
    headers: &[String],
    field: LogicalField,
    aliases: &AliasConfig,
) -> Option<usize> {
    let resolved = resolve_optional(headers, aliases.for_field(field));
    match &resolved {
        Some(col) => log::info!("{table}: {field} -> '{}'", col.header),
        None => log::info!("{table}: no {field} column"),
    }
    resolved.map(|c| c.index)
}

// ---------------------------------------------------------------------------
// Per-table schemas
// ---------------------------------------------------------------------------

/// Column indices of the property roll. All fields required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyColumns {
    pub parcel_id: usize,
    pub address: usize,
    pub assessed_value: usize,
}

impl PropertyColumns {
    pub fn resolve(headers: &[String], aliases: &AliasConfig) -> Result<Self, JoinError> {
        let t = TableKind::Properties;
        let get = |field| resolve_column(t, headers, field, aliases.for_field(field));
        Ok(Self {
            parcel_id: get(LogicalField::ParcelId)?.index,
            address: get(LogicalField::Address)?.index,
            assessed_value: get(LogicalField::AssessedValue)?.index,
        })
    }
}

/// Column indices of the official-records table.
///
/// Doc type and recording date are required. At least one of parcel id /
/// address must resolve, otherwise no tier could ever match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MortgageColumns {
    pub doc_type: usize,
    pub recording_date: usize,
    pub parcel_id: Option<usize>,
    pub address: Option<usize>,
    pub book_page: Option<usize>,
    pub instrument_number: Option<usize>,
}

impl MortgageColumns {
    pub fn resolve(headers: &[String], aliases: &AliasConfig) -> Result<Self, JoinError> {
        let t = TableKind::Mortgages;
        let required = |field| resolve_column(t, headers, field, aliases.for_field(field));

        let doc_type = required(LogicalField::DocType)?.index;
        let recording_date = required(LogicalField::RecordingDate)?.index;
        let parcel_id = resolve_field(t, headers, LogicalField::ParcelId, aliases);
        let address = resolve_field(t, headers, LogicalField::Address, aliases);

        if parcel_id.is_none() && address.is_none() {
            return Err(JoinError::missing_column(
                t,
                LogicalField::Address,
                aliases.for_field(LogicalField::Address),
            ));
        }

        Ok(Self {
            doc_type,
            recording_date,
            parcel_id,
            address,
            book_page: resolve_field(t, headers, LogicalField::BookPage, aliases),
            instrument_number: resolve_field(t, headers, LogicalField::InstrumentNumber, aliases),
        })
    }
}
