use std::path::PathBuf;

use chrono::NaiveDate;
use parceljoin_join::config::{JoinConfig, MatchStrategy, UnmatchedPolicy};
use parceljoin_join::table::write_joined_csv;
use parceljoin_join::{run, JoinError, JoinResult, Table, TableKind};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_table(kind: TableKind, file: &str) -> Table {
    let path = fixtures_dir().join(file);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    Table::from_csv_str(kind, &text).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn run_fixtures(config: &JoinConfig) -> JoinResult {
    let properties = load_table(TableKind::Properties, "properties.csv");
    let mortgages = load_table(TableKind::Mortgages, "mortgages.csv");
    run(config, &properties, &mortgages, today()).unwrap()
}

fn render(result: &JoinResult) -> String {
    let mut buf = Vec::new();
    write_joined_csv(&result.rows, &mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

// -------------------------------------------------------------------------
// End-to-end
// -------------------------------------------------------------------------

#[test]
fn fixture_join_keep_unmatched() {
    let result = run_fixtures(&JoinConfig::default());

    assert_eq!(
        render(&result),
        "address,parcel_id,assessed_value,mortgage_recorded_date,book_page_or_instrument\n\
         123 Main Street Apt 4,01-3132-045-0010,\"$412,300\",2026-02-01,2026R0043210\n\
         500 Ocean Drive #2,01-3132-045-0020,\"1,250,000\",2025-09-30,34440/2210\n\
         77 Coral Way,01-3132-045-0030,318900,,\n\
         1200 Brickell Ave Unit 1502,01-3132-045-0060,\"$980,000.00\",2024-10-18,2024R0654321\n"
    );

    let tiers: Vec<Option<MatchStrategy>> = result.rows.iter().map(|r| r.matched_by).collect();
    assert_eq!(
        tiers,
        vec![
            Some(MatchStrategy::ParcelId),
            Some(MatchStrategy::Address),
            None,
            Some(MatchStrategy::ParcelId),
        ]
    );
}

#[test]
fn fixture_summary_counts() {
    let result = run_fixtures(&JoinConfig::default());
    let s = &result.summary;

    assert_eq!(s.properties.rows_read, 6);
    assert_eq!(s.properties.loaded, 4);
    assert_eq!(s.properties.blank_key, 1);
    assert_eq!(s.properties.non_numeric_assessed_value, 1);

    assert_eq!(s.mortgages.rows_read, 8);
    assert_eq!(s.mortgages.wrong_doc_type, 2);
    assert_eq!(s.mortgages.unparseable_date, 1);
    assert_eq!(s.mortgages.outside_window, 1);
    assert_eq!(s.mortgages.kept, 4);
    assert_eq!(
        s.mortgages.rows_read,
        s.mortgages.wrong_doc_type
            + s.mortgages.unparseable_date
            + s.mortgages.outside_window
            + s.mortgages.kept
    );

    assert_eq!(s.matches.by_parcel_id, 2);
    assert_eq!(s.matches.by_address, 1);
    assert_eq!(s.matches.unmatched, 1);
    assert_eq!(s.rows_emitted, 4);
    assert_eq!(s.warning_count(), 3);

    assert_eq!(result.meta.as_of, today());
    assert_eq!(result.meta.window_start, NaiveDate::from_ymd_opt(2024, 10, 18).unwrap());
}

#[test]
fn fixture_join_drop_unmatched() {
    let config = JoinConfig {
        unmatched: UnmatchedPolicy::Drop,
        ..JoinConfig::default()
    };
    let result = run_fixtures(&config);

    let ids: Vec<&str> = result.rows.iter().map(|r| r.parcel_id.as_str()).collect();
    assert_eq!(ids, vec!["01-3132-045-0010", "01-3132-045-0020", "01-3132-045-0060"]);
    assert!(result.rows.iter().all(|r| r.mortgage_recorded_date.is_some()));
    assert_eq!(result.summary.matches.unmatched, 1);
    assert_eq!(result.summary.rows_emitted, 3);
}

#[test]
fn fixture_config_file() {
    let toml = std::fs::read_to_string(fixtures_dir().join("join.toml")).unwrap();
    let config = JoinConfig::from_toml(&toml).unwrap();
    let from_file = run_fixtures(&config);
    let defaults = run_fixtures(&JoinConfig::default());
    assert_eq!(render(&from_file), render(&defaults));
}

#[test]
fn shorter_lookback_narrows_matches() {
    let config = JoinConfig {
        lookback_years: 1,
        ..JoinConfig::default()
    };
    let result = run_fixtures(&config);

    // Window starts 2025-10-18: only the 2026-02-01 mortgage survives.
    assert_eq!(result.summary.mortgages.kept, 1);
    assert_eq!(result.summary.matches.by_parcel_id, 1);
    assert_eq!(result.summary.matches.unmatched, 3);
    assert_eq!(result.rows[0].book_page_or_instrument.as_deref(), Some("2026R0043210"));
}

#[test]
fn address_only_tier() {
    let config = JoinConfig {
        tiers: vec![MatchStrategy::Address],
        ..JoinConfig::default()
    };
    let result = run_fixtures(&config);

    // Every kept mortgage carries an address, so all three still match.
    assert_eq!(result.summary.matches.by_address, 3);
    assert_eq!(result.summary.matches.by_parcel_id, 0);
    assert_eq!(result.rows[3].mortgage_recorded_date, NaiveDate::from_ymd_opt(2024, 10, 18));
}

// -------------------------------------------------------------------------
// Failures
// -------------------------------------------------------------------------

#[test]
fn custom_aliases_can_hide_required_column() {
    let toml = r#"
[aliases]
assessed_value = ["just_value"]
"#;
    let config = JoinConfig::from_toml(toml).unwrap();
    let properties = load_table(TableKind::Properties, "properties.csv");
    let mortgages = load_table(TableKind::Mortgages, "mortgages.csv");

    let err = run(&config, &properties, &mortgages, today()).unwrap_err();
    assert!(matches!(
        err,
        JoinError::MissingColumn { table: TableKind::Properties, .. }
    ));
    assert!(err.to_string().contains("just_value"));
}

#[test]
fn unknown_config_key_rejected() {
    let err = JoinConfig::from_toml("lookback = 3\n").unwrap_err();
    assert!(matches!(err, JoinError::ConfigParse(_)));
}
