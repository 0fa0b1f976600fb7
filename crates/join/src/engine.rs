use chrono::NaiveDate;

use crate::columns::{MortgageColumns, PropertyColumns};
use crate::config::{JoinConfig, UnmatchedPolicy};
use crate::error::JoinError;
use crate::filter::{filter_mortgages, LookbackWindow};
use crate::matcher::{active_tiers, Matcher};
use crate::model::{JoinMeta, JoinResult, JoinSummary, MatchStats};
use crate::projector::project;
use crate::records::load_properties;
use crate::table::Table;

/// Run the join per config. `today` anchors the lookback window and is
/// captured once by the caller.
///
/// Column resolution for both tables happens before any row is processed,
/// so a missing required column fails fast.
pub fn run(
    config: &JoinConfig,
    properties: &Table,
    mortgages: &Table,
    today: NaiveDate,
) -> Result<JoinResult, JoinError> {
    config.validate()?;

    let property_cols = PropertyColumns::resolve(&properties.headers, &config.aliases)?;
    let mortgage_cols = MortgageColumns::resolve(&mortgages.headers, &config.aliases)?;

    let (property_records, property_stats) = load_properties(properties, &property_cols);

    let window = LookbackWindow::trailing_years(today, config.lookback_years);
    let filtered = filter_mortgages(mortgages, &mortgage_cols, &window, &config.mortgage_doc_type);

    let tiers = active_tiers(&config.tiers, &mortgage_cols);
    let matcher = Matcher::new(&filtered.kept, tiers);

    let mut match_stats = MatchStats::default();
    let mut rows = Vec::with_capacity(property_records.len());
    for property in &property_records {
        let matched = matcher.find(property);
        match_stats.record(matched.map(|(tier, _)| tier));
        if matched.is_none() && config.unmatched == UnmatchedPolicy::Drop {
            continue;
        }
        rows.push(project(property, matched));
    }

    log::info!(
        "join: {} properties, {} by parcel id, {} by address, {} unmatched ({})",
        property_records.len(),
        match_stats.by_parcel_id,
        match_stats.by_address,
        match_stats.unmatched,
        config.unmatched,
    );

    Ok(JoinResult {
        meta: JoinMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            as_of: today,
            window_start: window.start,
            lookback_years: config.lookback_years,
            unmatched: config.unmatched,
            tiers: config.tiers.clone(),
        },
        summary: JoinSummary {
            properties: property_stats,
            mortgages: filtered.stats,
            matches: match_stats,
            rows_emitted: rows.len(),
        },
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchStrategy;

    fn table(text: &str, kind: crate::model::TableKind) -> Table {
        Table::from_csv_str(kind, text).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    const PROPERTIES: &str = "\
folio,site_address,assessed_value
A,1 Main St,100000
B,2 Main St,200000
C,3 Main St,300000
";

    const MORTGAGES: &str = "\
folio,address,doc_type,recording_date,instrument_number
A,1 Main St,Mortgage,2025-10-18,2025R0000001
D,9 Main St,Mortgage,2025-10-18,2025R0000002
";

    #[test]
    fn keep_policy_emits_every_property() {
        let props = table(PROPERTIES, crate::model::TableKind::Properties);
        let morts = table(MORTGAGES, crate::model::TableKind::Mortgages);
        let result = run(&JoinConfig::default(), &props, &morts, today()).unwrap();

        assert_eq!(result.rows.len(), 3);
        let ids: Vec<&str> = result.rows.iter().map(|r| r.parcel_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(result.rows[0].book_page_or_instrument.as_deref(), Some("2025R0000001"));
        assert_eq!(result.rows[0].matched_by, Some(MatchStrategy::ParcelId));
        assert!(result.rows[1].mortgage_recorded_date.is_none());
        assert!(result.rows[2].mortgage_recorded_date.is_none());
        assert_eq!(result.summary.matches.unmatched, 2);
        assert_eq!(result.summary.rows_emitted, 3);
        assert_eq!(result.meta.window_start, NaiveDate::from_ymd_opt(2024, 10, 18).unwrap());
    }

    #[test]
    fn drop_policy_omits_unmatched() {
        let props = table(PROPERTIES, crate::model::TableKind::Properties);
        let morts = table(MORTGAGES, crate::model::TableKind::Mortgages);
        let config = JoinConfig { unmatched: UnmatchedPolicy::Drop, ..JoinConfig::default() };
        let result = run(&config, &props, &morts, today()).unwrap();

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].parcel_id, "A");
        assert_eq!(result.summary.matches.unmatched, 2);
        assert_eq!(result.summary.rows_emitted, 1);
    }

    #[test]
    fn missing_property_column_is_fatal() {
        let props = table("folio,address\nA,1 Main St\n", crate::model::TableKind::Properties);
        let morts = table(MORTGAGES, crate::model::TableKind::Mortgages);
        let err = run(&JoinConfig::default(), &props, &morts, today()).unwrap_err();
        assert!(matches!(err, JoinError::MissingColumn { .. }));
    }

    #[test]
    fn invalid_config_rejected() {
        let props = table(PROPERTIES, crate::model::TableKind::Properties);
        let morts = table(MORTGAGES, crate::model::TableKind::Mortgages);
        let config = JoinConfig { tiers: vec![], ..JoinConfig::default() };
        assert!(matches!(
            run(&config, &props, &morts, today()),
            Err(JoinError::ConfigValidation(_))
        ));
    }

    #[test]
    fn window_respects_lookback_years() {
        let props = table(PROPERTIES, crate::model::TableKind::Properties);
        let morts = table(MORTGAGES, crate::model::TableKind::Mortgages);
        let config = JoinConfig { lookback_years: 0, ..JoinConfig::default() };
        let result = run(&config, &props, &morts, today()).unwrap();
        assert_eq!(result.summary.mortgages.outside_window, 2);
        assert_eq!(result.summary.matches.matched(), 0);
    }
}
