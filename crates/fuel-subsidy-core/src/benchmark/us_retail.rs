//! Cross-check of formula prices against US pump prices converted to
//! Rupiah per litre.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

use crate::aggregation::monthly::{FxRow, USDIDR};
use crate::error::FuelSubsidyError;
use crate::pricing::price_table::PriceTable;
use crate::types::{with_metadata, Bounds, ComputationOutput, FuelGrade, Money, ReferencePeriod};
use crate::FuelSubsidyResult;

/// US liquid gallon in litres.
pub const LITRES_PER_GALLON: Decimal = dec!(3.785411784);

/// Weekly US regular gasoline and diesel retail prices (USD/gallon).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsRetailRow {
    pub date: NaiveDate,
    pub gasoline: Decimal,
    pub diesel: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsBenchmarkInput {
    pub retail: Vec<UsRetailRow>,
    pub fx: Vec<FxRow>,
    /// Formula prices to set beside the US prices.
    #[serde(default)]
    pub prices: Option<PriceTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsBenchmarkRow {
    pub month: ReferencePeriod,
    pub usdidr: Decimal,
    pub gasoline_usd_gallon: Decimal,
    pub diesel_usd_gallon: Decimal,
    pub gasoline_idr_litre: Money,
    pub diesel_idr_litre: Money,
    /// Formula retail price of the nearest domestic gasoline grade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pertamax: Option<Bounds>,
    /// Formula retail price of the nearest domestic diesel grade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pertadex: Option<Bounds>,
}

/// USD per gallon to IDR per litre.
pub fn usd_gallon_to_idr_litre(usd_per_gallon: Decimal, usdidr: Decimal) -> Money {
    usd_per_gallon * usdidr / LITRES_PER_GALLON
}

fn calendar_month(date: NaiveDate) -> ReferencePeriod {
    ReferencePeriod::january(date.year()).plus_months(date.month() - 1)
}

/// Arithmetic mean per calendar month (not the statutory window).
fn calendar_month_average(
    points: impl Iterator<Item = (NaiveDate, Decimal)>,
) -> BTreeMap<ReferencePeriod, Decimal> {
    let mut groups: BTreeMap<ReferencePeriod, (Decimal, u64)> = BTreeMap::new();
    for (date, value) in points {
        let entry = groups.entry(calendar_month(date)).or_insert((Decimal::ZERO, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(p, (sum, n))| (p, sum / Decimal::from(n)))
        .collect()
}

/// Convert US retail prices to IDR/litre month by month.
pub fn us_benchmark(
    input: &UsBenchmarkInput,
) -> FuelSubsidyResult<ComputationOutput<Vec<UsBenchmarkRow>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.retail.is_empty() {
        return Err(FuelSubsidyError::InsufficientData(
            "No US retail price observations".into(),
        ));
    }
    if let Some(bad) = input.fx.iter().find(|r| r.usdidr <= Decimal::ZERO) {
        return Err(FuelSubsidyError::InvalidInput {
            field: USDIDR.into(),
            reason: format!("Non-positive rate {} on {}", bad.usdidr, bad.date),
        });
    }

    let gasoline = calendar_month_average(input.retail.iter().map(|r| (r.date, r.gasoline)));
    let diesel = calendar_month_average(input.retail.iter().map(|r| (r.date, r.diesel)));
    let fx = calendar_month_average(input.fx.iter().map(|r| (r.date, r.usdidr)));

    let mut rows = Vec::with_capacity(gasoline.len());
    for (month, gas) in &gasoline {
        let usdidr = *fx.get(month).ok_or_else(|| FuelSubsidyError::MissingPeriodData {
            variable: USDIDR.into(),
            period: month.to_string(),
        })?;
        // Both series come from the same rows, so every month has diesel too.
        let dsl = diesel.get(month).copied().unwrap_or_default();

        let formula = input.prices.as_ref().and_then(|t| t.get(*month));
        if input.prices.is_some() && formula.is_none() {
            warnings.push(format!("No formula prices for {month}"));
        }

        rows.push(UsBenchmarkRow {
            month: *month,
            usdidr,
            gasoline_usd_gallon: *gas,
            diesel_usd_gallon: dsl,
            gasoline_idr_litre: usd_gallon_to_idr_litre(*gas, usdidr),
            diesel_idr_litre: usd_gallon_to_idr_litre(dsl, usdidr),
            pertamax: formula.map(|r| r.grades.get(FuelGrade::Pertamax).retail),
            pertadex: formula.map(|r| r.grades.get(FuelGrade::Pertadex).retail),
        });
    }
    debug!(months = rows.len(), "converted US retail prices");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Calendar-month mean USD/gallon x USD/IDR / 3.785411784",
        &serde_json::json!({
            "litres_per_gallon": LITRES_PER_GALLON.to_string(),
            "retail_observations": input.retail.len(),
            "fx_observations": input.fx.len(),
        }),
        warnings,
        elapsed,
        rows,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_gallon_conversion() {
        let idr = usd_gallon_to_idr_litre(dec!(3.785411784), dec!(14500));
        assert_eq!(idr, dec!(14500));
    }

    #[test]
    fn test_calendar_month_grouping() {
        let input = UsBenchmarkInput {
            retail: vec![
                UsRetailRow { date: d(2022, 1, 3), gasoline: dec!(3.0), diesel: dec!(3.6) },
                UsRetailRow { date: d(2022, 1, 31), gasoline: dec!(3.2), diesel: dec!(3.8) },
                UsRetailRow { date: d(2022, 2, 7), gasoline: dec!(3.4), diesel: dec!(4.0) },
            ],
            fx: vec![
                FxRow { date: d(2022, 1, 1), usdidr: dec!(14300) },
                FxRow { date: d(2022, 2, 1), usdidr: dec!(14400) },
            ],
            prices: None,
        };
        let out = us_benchmark(&input).unwrap();
        assert_eq!(out.result.len(), 2);
        let jan = &out.result[0];
        assert_eq!(jan.gasoline_usd_gallon, dec!(3.1));
        assert_eq!(jan.usdidr, dec!(14300));
        assert!(jan.pertamax.is_none());
    }

    #[test]
    fn test_missing_fx_month_fails() {
        let input = UsBenchmarkInput {
            retail: vec![UsRetailRow { date: d(2022, 3, 7), gasoline: dec!(4.2), diesel: dec!(5.0) }],
            fx: vec![FxRow { date: d(2022, 2, 1), usdidr: dec!(14400) }],
            prices: None,
        };
        let err = us_benchmark(&input).unwrap_err();
        assert!(err.to_string().contains("2022-03"));
    }
}
