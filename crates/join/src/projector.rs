use crate::config::MatchStrategy;
use crate::model::{JoinedRecord, MortgageRecord, PropertyRecord};

/// Assemble one output row. Property fields are copied verbatim (never the
/// normalized address); mortgage fields are blank without a match.
pub fn project(
    property: &PropertyRecord,
    matched: Option<(MatchStrategy, &MortgageRecord)>,
) -> JoinedRecord {
    JoinedRecord {
        address: property.address_raw.clone(),
        parcel_id: property.parcel_id.clone(),
        assessed_value: property.assessed_value.clone(),
        mortgage_recorded_date: matched.map(|(_, m)| m.recording_date),
        book_page_or_instrument: matched.and_then(|(_, m)| m.book_page_or_instrument.clone()),
        matched_by: matched.map(|(tier, _)| tier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn property() -> PropertyRecord {
        PropertyRecord {
            parcel_id: "01-1234-005".into(),
            address_raw: "123 Main Street Apt 4".into(),
            assessed_value: "$412,300".into(),
            assessed_cents: 41_230_000,
        }
    }

    #[test]
    fn matched_row_copies_both_sides() {
        let m = MortgageRecord {
            source_row: 3,
            parcel_id: "".into(),
            address_raw: "123 MAIN ST #4".into(),
            doc_type: "MORTGAGE".into(),
            recording_date: NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
            book_page_or_instrument: Some("34001/1120".into()),
        };
        let row = project(&property(), Some((MatchStrategy::Address, &m)));
        assert_eq!(row.address, "123 Main Street Apt 4");
        assert_eq!(row.parcel_id, "01-1234-005");
        assert_eq!(row.assessed_value, "$412,300");
        assert_eq!(row.mortgage_recorded_date, NaiveDate::from_ymd_opt(2025, 11, 2));
        assert_eq!(row.book_page_or_instrument.as_deref(), Some("34001/1120"));
        assert_eq!(row.matched_by, Some(MatchStrategy::Address));
    }

    #[test]
    fn unmatched_row_has_blank_mortgage_fields() {
        let row = project(&property(), None);
        assert_eq!(row.address, "123 Main Street Apt 4");
        assert_eq!(row.mortgage_recorded_date, None);
        assert_eq!(row.book_page_or_instrument, None);
        assert_eq!(row.matched_by, None);
    }
}
