use chrono::NaiveDate;
use fuel_subsidy_core::aggregation::monthly::{
    FuturesRow, FxRow, MarketDataInput, SpotRow, ValueSource,
};
use fuel_subsidy_core::config::FormulaConfig;
use fuel_subsidy_core::subsidy::budget::BudgetInput;
use fuel_subsidy_core::subsidy::consumption::HistoricalConsumptionRow;
use fuel_subsidy_core::subsidy::engine::unit_subsidy;
use fuel_subsidy_core::subsidy::scenario::{compare_scenarios, ScenarioInput};
use fuel_subsidy_core::{Bounds, FuelGrade, FuelSubsidyError, ReferencePeriod};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn p(m: u32, y: i32) -> ReferencePeriod {
    ReferencePeriod::new(m, y).unwrap()
}

fn days(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut day = from;
    while day <= to {
        out.push(day);
        day = day.succ_opt().unwrap();
    }
    out
}

/// FX observed through March 24th, spot through April 24th, futures for
/// the rest of the year.
fn market_2022() -> MarketDataInput {
    let fx = days(d(2021, 11, 25), d(2022, 3, 24))
        .into_iter()
        .map(|date| FxRow { date, usdidr: dec!(14300) })
        .collect();
    let spot = days(d(2021, 11, 25), d(2022, 4, 24))
        .into_iter()
        .map(|date| SpotRow {
            date,
            mogas_92: Some(dec!(90)),
            mogas_95: Some(dec!(95)),
            gasoil_10: Some(dec!(100)),
            gasoil_500: Some(dec!(98)),
        })
        .collect();
    let futures = (4..=11)
        .map(|m| FuturesRow {
            month: p(m, 2022),
            mogas_92: Some(dec!(110)),
            mogas_95: Some(dec!(115)),
            gasoil_10: Some(dec!(130)),
            gasoil_500: Some(dec!(128)),
        })
        .collect();
    MarketDataInput { fx, spot, futures }
}

fn consumption_row(year: i32) -> HistoricalConsumptionRow {
    HistoricalConsumptionRow {
        year,
        ron88: dec!(20),
        ron90: dec!(280),
        ron92: dec!(100),
        ron95_higher: dec!(10),
        gasoil_cn48: dec!(150),
        biogasoil: dec!(50),
        gasoil_cn51: dec!(20),
        gasoil_cn53: dec!(10),
        other: dec!(360),
        total: None,
    }
}

fn scenario_input() -> ScenarioInput {
    ScenarioInput {
        year: 2022,
        market: market_2022(),
        consumption: (2017..=2021).map(consumption_row).collect(),
        schedule: None,
        depreciation: dec!(0.05),
        budget: Some(BudgetInput::apbn_2022()),
    }
}

// ===========================================================================
// End-to-end scenario
// ===========================================================================

#[test]
fn test_scenario_prices_full_year() {
    let out = compare_scenarios(&scenario_input(), &FormulaConfig::default()).unwrap();
    let baseline = &out.result.baseline;
    assert_eq!(baseline.prices.records.len(), 12);
    assert_eq!(baseline.subsidy.records.len(), 72);
    assert_eq!(baseline.subsidy.by_month.len(), 12);

    let jan = baseline.prices.get(p(1, 2022)).unwrap();
    assert_eq!(jan.usdidr, dec!(14300));
    assert_eq!(jan.usdidr_source, ValueSource::Observed);
    assert_eq!(jan.grades.pertalite.commodity_price, dec!(90));

    let dec_ = baseline.prices.get(p(12, 2022)).unwrap();
    assert_eq!(dec_.usdidr, dec!(15000));
    assert_eq!(dec_.usdidr_source, ValueSource::Projected);
    // December is fed by the November contract
    assert_eq!(dec_.grades.pertalite.commodity_price, dec!(110));
}

#[test]
fn test_scenario_warnings_flag_substitutions() {
    let out = compare_scenarios(&scenario_input(), &FormulaConfig::default()).unwrap();
    assert!(out.warnings.iter().any(|w| w.contains("end-of-year projection")));
    assert!(out.warnings.iter().any(|w| w.contains("taken from futures")));
    assert!(out.warnings.iter().all(|w| !w.contains("Non-positive")));
}

#[test]
fn test_depreciation_raises_subsidy() {
    let out = compare_scenarios(&scenario_input(), &FormulaConfig::default()).unwrap();
    let r = &out.result;
    assert_eq!(r.depreciated.eoy_usdidr, dec!(15750));
    assert!(r.depreciated.subsidy.total.min >= r.baseline.subsidy.total.min);
    assert!(r.depreciated.subsidy.total.max >= r.baseline.subsidy.total.max);
    assert!(r.depreciation_cost.min > Decimal::ZERO);
    assert_eq!(
        r.depreciation_cost.max,
        r.depreciated.subsidy.total.max - r.baseline.subsidy.total.max
    );

}

#[test]
fn test_depreciation_keeps_observed_fx() {
    let out = compare_scenarios(&scenario_input(), &FormulaConfig::default()).unwrap();
    let r = &out.result;

    // January to April are covered by rates observed through March 24th
    for m in 1..=4 {
        let base = r.baseline.prices.get(p(m, 2022)).unwrap();
        let dep = r.depreciated.prices.get(p(m, 2022)).unwrap();
        assert_eq!(dep.usdidr, dec!(14300));
        assert_eq!(dep.usdidr_source, ValueSource::Observed);
        assert_eq!(dep.grades.pertalite.retail, base.grades.pertalite.retail);
    }
    let jan_base = &r.baseline.subsidy.by_month[0];
    let jan_dep = &r.depreciated.subsidy.by_month[0];
    assert_eq!(jan_dep.total, jan_base.total);

    let dec_ = r.depreciated.prices.get(p(12, 2022)).unwrap();
    assert_eq!(dec_.usdidr, dec!(15750));
    assert_eq!(dec_.usdidr_source, ValueSource::Projected);
}

#[test]
fn test_totals_are_sum_of_records() {
    let out = compare_scenarios(&scenario_input(), &FormulaConfig::default()).unwrap();
    let report = &out.result.baseline.subsidy;
    let summed = report
        .records
        .iter()
        .fold(Bounds::ZERO, |acc, r| acc + r.total_subsidy);
    let by_month = report.by_month.iter().fold(Bounds::ZERO, |acc, m| acc + m.total);
    for sum in [summed, by_month] {
        assert!((sum.min - report.total.min).abs() < dec!(0.000001));
        assert!((sum.max - report.total.max).abs() < dec!(0.000001));
    }
}

#[test]
fn test_breakdown_sorted_ascending() {
    let out = compare_scenarios(&scenario_input(), &FormulaConfig::default()).unwrap();
    let amounts: Vec<Decimal> = out.result.breakdown_max.iter().map(|g| g.amount).collect();
    let mut sorted = amounts.clone();
    sorted.sort();
    assert_eq!(amounts, sorted);
    assert_eq!(out.result.breakdown_min.len(), FuelGrade::ALL.len());
}

#[test]
fn test_shares_and_volume() {
    let out = compare_scenarios(&scenario_input(), &FormulaConfig::default()).unwrap();
    let r = &out.result;
    assert_eq!(r.shares.lookback_years, vec![2018, 2019, 2020, 2021]);
    assert_eq!(r.shares.average.pertalite, dec!(0.3));
    assert_eq!(r.shares.average.biosolar, dec!(0.2));
    assert!((r.monthly_consumption * dec!(12) - r.annual_consumption).abs() < dec!(0.001));
}

#[test]
fn test_budget_uses_baseline_estimate() {
    let out = compare_scenarios(&scenario_input(), &FormulaConfig::default()).unwrap();
    let r = &out.result;
    let budget = r.budget.as_ref().unwrap();
    let implied = budget.implied_energy_subsidy.unwrap();
    assert_eq!(
        implied.min,
        r.baseline.subsidy.total.min + budget.total_non_fuel_subsidy
    );
}

// ===========================================================================
// Fail-fast paths
// ===========================================================================

#[test]
fn test_share_violation_halts_run() {
    let mut input = scenario_input();
    input.consumption[2].total = Some(dec!(2000));
    let err = compare_scenarios(&input, &FormulaConfig::default()).unwrap_err();
    match err {
        FuelSubsidyError::ShareSumViolation { year, .. } => assert_eq!(year, 2019),
        other => panic!("expected ShareSumViolation, got {other:?}"),
    }
}

#[test]
fn test_missing_commodity_month_names_variable() {
    let mut input = scenario_input();
    input.market.futures.retain(|f| f.month != p(8, 2022));
    let err = compare_scenarios(&input, &FormulaConfig::default()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("mogas_92"), "{msg}");
    assert!(msg.contains("2022-09"), "{msg}");
}

#[test]
fn test_missing_administered_price_names_grade() {
    let mut input = scenario_input();
    input.year = 2021;
    input.market.fx.clear();
    input.market.futures = (0..12)
        .map(|i| FuturesRow {
            month: p(12, 2020).plus_months(i),
            mogas_92: Some(dec!(60)),
            mogas_95: Some(dec!(65)),
            gasoil_10: Some(dec!(70)),
            gasoil_500: Some(dec!(69)),
        })
        .collect();
    input.market.spot.clear();
    let err = compare_scenarios(&input, &FormulaConfig::default()).unwrap_err();
    assert!(matches!(err, FuelSubsidyError::MissingPeriodData { .. }));
    assert!(err.to_string().contains("administered price"));
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn prop_unit_subsidy_never_negative(
        retail_min in 0i64..40_000,
        spread in 0i64..10_000,
        administered in 1i64..1_000_000,
    ) {
        let retail = Bounds {
            min: Decimal::from(retail_min),
            max: Decimal::from(retail_min + spread),
        };
        let u = unit_subsidy(&retail, Decimal::from(administered));
        prop_assert!(u.min >= Decimal::ZERO);
        prop_assert!(u.max >= u.min);
    }
}
