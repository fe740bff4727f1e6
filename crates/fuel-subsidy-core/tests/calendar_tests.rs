use chrono::{Datelike, NaiveDate};
use fuel_subsidy_core::calendar::reference_month::{
    matching_rule, resolve, resolve_date, resolve_futures_month,
};
use fuel_subsidy_core::aggregation::monthly::FuturesRow;
use fuel_subsidy_core::{FuelSubsidyError, ReferencePeriod};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn p(m: u32, y: i32) -> ReferencePeriod {
    ReferencePeriod::new(m, y).unwrap()
}

// ===========================================================================
// Rule table
// ===========================================================================

#[test]
fn test_december_boundaries() {
    assert_eq!(resolve(24, 12, 2021).unwrap(), p(1, 2022));
    assert_eq!(resolve(25, 12, 2021).unwrap(), p(2, 2022));
    assert_eq!(resolve(31, 12, 2021).unwrap(), p(2, 2022));
}

#[test]
fn test_late_november_goes_to_january() {
    assert_eq!(resolve(25, 11, 2021).unwrap(), p(1, 2022));
    assert_eq!(resolve(24, 11, 2021).unwrap(), p(12, 2021));
    assert_eq!(
        matching_rule(NaiveDate::from_ymd_opt(2021, 11, 30).unwrap()),
        "late_november"
    );
}

#[test]
fn test_late_october_stays_in_year() {
    // October 25th onwards feeds December of the same year
    assert_eq!(resolve(25, 10, 2022).unwrap(), p(12, 2022));
    assert_eq!(resolve(24, 10, 2022).unwrap(), p(11, 2022));
}

#[test]
fn test_window_25th_to_24th() {
    // Every day from 25 Feb to 24 Mar contributes to April
    let mut date = NaiveDate::from_ymd_opt(2022, 2, 25).unwrap();
    let end = NaiveDate::from_ymd_opt(2022, 3, 24).unwrap();
    while date <= end {
        assert_eq!(resolve_date(date), p(4, 2022), "date {date}");
        date = date.succ_opt().unwrap();
    }
    assert_eq!(resolve(24, 2, 2022).unwrap(), p(3, 2022));
    assert_eq!(resolve(25, 3, 2022).unwrap(), p(5, 2022));
}

#[test]
fn test_invalid_calendar_date() {
    let err = resolve(30, 2, 2022).unwrap_err();
    match err {
        FuelSubsidyError::InvalidDate { day, month, year } => {
            assert_eq!((day, month, year), (30, 2, 2022));
        }
        other => panic!("expected InvalidDate, got {other:?}"),
    }
    assert!(resolve(1, 13, 2022).is_err());
    assert!(resolve(29, 2, 2024).is_ok());
}

#[test]
fn test_futures_contract_months() {
    assert_eq!(resolve_futures_month(6, 2022).unwrap(), p(7, 2022));
    assert_eq!(resolve_futures_month(12, 2022).unwrap(), p(1, 2023));
    assert!(resolve_futures_month(0, 2022).is_err());
}

#[test]
fn test_extreme_years_error_instead_of_overflowing() {
    assert!(matches!(
        resolve_futures_month(12, i32::MAX),
        Err(FuelSubsidyError::InvalidDate { .. })
    ));
    let last = NaiveDate::MAX.year();
    assert!(resolve_futures_month(12, last).is_ok());

    let row: Result<FuturesRow, _> = serde_json::from_str(
        r#"{"month": "2147483647-12", "mogas_92": "90", "mogas_95": "95", "gasoil_10": "100", "gasoil_500": "98"}"#,
    );
    assert!(row.is_err());
}

// ===========================================================================
// Properties
// ===========================================================================

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 0u32..366).prop_filter_map("valid ordinal", |(y, ord)| {
        NaiveDate::from_yo_opt(y, ord + 1)
    })
}

proptest! {
    #[test]
    fn prop_late_december_is_february_next_year(year in 1990i32..2100, day in 25u32..=31) {
        prop_assert_eq!(resolve(day, 12, year).unwrap(), p(2, year + 1));
    }

    #[test]
    fn prop_early_day_goes_to_next_month(year in 1990i32..2100, month in 1u32..=10, day in 1u32..=24) {
        prop_assert_eq!(resolve(day, month, year).unwrap(), p(month + 1, year));
    }

    #[test]
    fn prop_reference_is_one_or_two_months_ahead(date in any_date()) {
        let observed = p(date.month(), date.year());
        let r = resolve_date(date);
        let expected_offset = if date.day() >= 25 { 2 } else { 1 };
        prop_assert_eq!(r, observed.plus_months(expected_offset));
    }
}
