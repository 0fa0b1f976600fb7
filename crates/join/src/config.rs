use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::columns::LogicalField;
use crate::error::JoinError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Join configuration. Every key is optional in TOML; absent keys fall back
/// to the built-in defaults, so an empty document is a valid config.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinConfig {
    /// Doc-type value (compared case-insensitively) that marks a mortgage.
    #[serde(default = "default_doc_type")]
    pub mortgage_doc_type: String,
    /// Trailing window, in years, for mortgage recording dates.
    #[serde(default = "default_lookback_years")]
    pub lookback_years: u32,
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,
    /// Matcher tiers in evaluation order.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<MatchStrategy>,
    #[serde(default)]
    pub aliases: AliasConfig,
}

fn default_doc_type() -> String {
    "MORTGAGE".into()
}

fn default_lookback_years() -> u32 {
    2
}

fn default_tiers() -> Vec<MatchStrategy> {
    vec![MatchStrategy::ParcelId, MatchStrategy::Address]
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            mortgage_doc_type: default_doc_type(),
            lookback_years: default_lookback_years(),
            unmatched: UnmatchedPolicy::default(),
            tiers: default_tiers(),
            aliases: AliasConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Unmatched policy + strategies
// ---------------------------------------------------------------------------

/// What to do with a property that no tier matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Emit the property with blank mortgage fields.
    #[default]
    Keep,
    /// Leave the property out of the output.
    Drop,
}

impl std::fmt::Display for UnmatchedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Drop => write!(f, "drop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Case-insensitive, trimmed parcel id equality.
    ParcelId,
    /// Normalized address key equality.
    Address,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParcelId => write!(f, "parcel_id"),
            Self::Address => write!(f, "address"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// Accepted header spellings per logical field, highest priority first.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    #[serde(default = "default_parcel_id_aliases")]
    pub parcel_id: Vec<String>,
    #[serde(default = "default_address_aliases")]
    pub address: Vec<String>,
    #[serde(default = "default_assessed_value_aliases")]
    pub assessed_value: Vec<String>,
    #[serde(default = "default_doc_type_aliases")]
    pub doc_type: Vec<String>,
    #[serde(default = "default_recording_date_aliases")]
    pub recording_date: Vec<String>,
    #[serde(default = "default_book_page_aliases")]
    pub book_page: Vec<String>,
    #[serde(default = "default_instrument_number_aliases")]
    pub instrument_number: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_parcel_id_aliases() -> Vec<String> {
    strings(&["parcel_id", "folio", "folio_number", "parcel", "pin", "parcel id", "folio number"])
}

fn default_address_aliases() -> Vec<String> {
    strings(&[
        "address",
        "site_address",
        "property_address",
        "situs_address",
        "legal_address",
        "site address",
        "property address",
    ])
}

fn default_assessed_value_aliases() -> Vec<String> {
    strings(&[
        "assessed_value",
        "assessed",
        "total_assessed_value",
        "market_value",
        "assessed value",
    ])
}

fn default_doc_type_aliases() -> Vec<String> {
    strings(&["doc_type", "document_type", "doctype", "doc type", "document type"])
}

fn default_recording_date_aliases() -> Vec<String> {
    strings(&[
        "recording_date",
        "recorded_date",
        "record_date",
        "recording date",
        "recorded date",
    ])
}

fn default_book_page_aliases() -> Vec<String> {
    strings(&["book_page", "book/page", "book_page_ref", "book page"])
}

fn default_instrument_number_aliases() -> Vec<String> {
    strings(&["instrument_number", "instrument", "cfn", "doc_number", "instrument number"])
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            parcel_id: default_parcel_id_aliases(),
            address: default_address_aliases(),
            assessed_value: default_assessed_value_aliases(),
            doc_type: default_doc_type_aliases(),
            recording_date: default_recording_date_aliases(),
            book_page: default_book_page_aliases(),
            instrument_number: default_instrument_number_aliases(),
        }
    }
}

impl AliasConfig {
    pub fn for_field(&self, field: LogicalField) -> &[String] {
        match field {
            LogicalField::ParcelId => &self.parcel_id,
            LogicalField::Address => &self.address,
            LogicalField::AssessedValue => &self.assessed_value,
            LogicalField::DocType => &self.doc_type,
            LogicalField::RecordingDate => &self.recording_date,
            LogicalField::BookPage => &self.book_page,
            LogicalField::InstrumentNumber => &self.instrument_number,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl JoinConfig {
    pub fn from_toml(input: &str) -> Result<Self, JoinError> {
        let config: JoinConfig =
            toml::from_str(input).map_err(|e| JoinError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JoinError> {
        if self.mortgage_doc_type.trim().is_empty() {
            return Err(JoinError::ConfigValidation(
                "mortgage_doc_type must not be empty".into(),
            ));
        }

        if self.tiers.is_empty() {
            return Err(JoinError::ConfigValidation(
                "at least one match tier is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for tier in &self.tiers {
            if !seen.insert(tier) {
                return Err(JoinError::ConfigValidation(format!(
                    "tier '{tier}' listed more than once"
                )));
            }
        }

        for field in LogicalField::ALL {
            let aliases = self.aliases.for_field(field);
            if aliases.iter().all(|a| a.trim().is_empty()) {
                return Err(JoinError::ConfigValidation(format!(
                    "aliases.{field} must list at least one header"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = JoinConfig::from_toml("").unwrap();
        assert_eq!(config.mortgage_doc_type, "MORTGAGE");
        assert_eq!(config.lookback_years, 2);
        assert_eq!(config.unmatched, UnmatchedPolicy::Keep);
        assert_eq!(config.tiers, vec![MatchStrategy::ParcelId, MatchStrategy::Address]);
        assert_eq!(config.aliases.parcel_id[0], "parcel_id");
    }

    #[test]
    fn partial_alias_override_keeps_other_defaults() {
        let input = r#"
lookback_years = 5
unmatched = "drop"
tiers = ["address"]

[aliases]
parcel_id = ["FOLIO_NO"]
"#;
        let config = JoinConfig::from_toml(input).unwrap();
        assert_eq!(config.lookback_years, 5);
        assert_eq!(config.unmatched, UnmatchedPolicy::Drop);
        assert_eq!(config.tiers, vec![MatchStrategy::Address]);
        assert_eq!(config.aliases.parcel_id, vec!["FOLIO_NO"]);
        assert_eq!(config.aliases.address, default_address_aliases());
    }

    #[test]
    fn reject_unknown_tier() {
        let err = JoinConfig::from_toml(r#"tiers = ["geocode"]"#).unwrap_err();
        assert!(matches!(err, JoinError::ConfigParse(_)));
    }

    #[test]
    fn reject_unknown_key() {
        let err = JoinConfig::from_toml("lookback = 3").unwrap_err();
        assert!(err.to_string().contains("lookback"));
    }

    #[test]
    fn reject_duplicate_tier() {
        let err = JoinConfig::from_toml(r#"tiers = ["address", "address"]"#).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn reject_empty_tiers() {
        let err = JoinConfig::from_toml("tiers = []").unwrap_err();
        assert!(err.to_string().contains("at least one match tier"));
    }

    #[test]
    fn reject_empty_alias_list() {
        let input = r#"
[aliases]
recording_date = [" "]
"#;
        let err = JoinConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("aliases.recording_date"));
    }

    #[test]
    fn reject_blank_doc_type() {
        let err = JoinConfig::from_toml(r#"mortgage_doc_type = "  ""#).unwrap_err();
        assert!(err.to_string().contains("mortgage_doc_type"));
    }
}
