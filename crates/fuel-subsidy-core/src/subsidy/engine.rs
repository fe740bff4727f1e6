use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::SubsidyConfig;
use crate::error::FuelSubsidyError;
use crate::pricing::price_table::PriceTable;
use crate::subsidy::administered::{AdministeredPrice, AdministeredSchedule};
use crate::types::{
    with_metadata, Bounds, ComputationOutput, FuelGrade, GradeMap, Money, Rate, ReferencePeriod,
    Volume,
};
use crate::FuelSubsidyResult;

// ---------------------------------------------------------------------------
// Per-litre and per-grade arithmetic
// ---------------------------------------------------------------------------

/// Formula retail price minus administered price, floored at zero.
pub fn unit_subsidy(retail: &Bounds, administered: Money) -> Bounds {
    retail.map(|r| (r - administered).max(Decimal::ZERO))
}

/// Unit subsidy times volume, expressed in the reporting unit.
pub fn total_subsidy(unit: &Bounds, volume: Volume, scale_factor: Decimal) -> FuelSubsidyResult<Bounds> {
    if scale_factor.is_zero() {
        return Err(FuelSubsidyError::DivisionByZero {
            context: "subsidy scale factor".into(),
        });
    }
    Ok(unit.map(|u| u * volume / scale_factor))
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Subsidy of one grade in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyRecord {
    pub month: ReferencePeriod,
    pub grade: FuelGrade,
    pub administered_price: Money,
    pub retail_price: Bounds,
    pub unit_subsidy: Bounds,
    /// Litres consumed in the month.
    pub consumption: Volume,
    /// In the reporting unit.
    pub total_subsidy: Bounds,
}

/// Total subsidy of all grades in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotal {
    pub month: ReferencePeriod,
    pub total: Bounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyReport {
    pub records: Vec<SubsidyRecord>,
    pub by_month: Vec<MonthTotal>,
    pub by_grade: GradeMap<Bounds>,
    pub total: Bounds,
}

impl SubsidyReport {
    /// Grade totals sorted ascending on the chosen bound.
    pub fn breakdown(&self, pick: impl Fn(&Bounds) -> Decimal) -> Vec<(FuelGrade, Decimal)> {
        let mut out: Vec<(FuelGrade, Decimal)> =
            self.by_grade.iter().map(|(g, b)| (g, pick(b))).collect();
        out.sort_by(|a, b| a.1.cmp(&b.1));
        out
    }
}

/// Subsidy for every month of `prices` and every grade.
///
/// Stateless: the same function serves every FX scenario.
pub fn compute_subsidy(
    prices: &PriceTable,
    schedule: &AdministeredSchedule,
    shares: &GradeMap<Rate>,
    monthly_consumption: Volume,
    config: &SubsidyConfig,
) -> FuelSubsidyResult<SubsidyReport> {
    if monthly_consumption < Decimal::ZERO {
        return Err(FuelSubsidyError::InvalidInput {
            field: "monthly_consumption".into(),
            reason: "Consumption must be non-negative".into(),
        });
    }
    if let Some((grade, share)) = shares
        .iter()
        .find(|(_, s)| **s < Decimal::ZERO || **s > Decimal::ONE)
    {
        return Err(FuelSubsidyError::InvalidInput {
            field: format!("shares.{grade}"),
            reason: format!("Share {share} is outside [0, 1]"),
        });
    }

    let mut records = Vec::with_capacity(prices.records.len() * FuelGrade::ALL.len());
    let mut by_month = Vec::with_capacity(prices.records.len());
    let mut by_grade: GradeMap<Bounds> = GradeMap::default();
    let mut total = Bounds::ZERO;

    for rec in &prices.records {
        let mut month_total = Bounds::ZERO;
        for (grade, price) in rec.grades.iter() {
            let administered = schedule.price_for(grade, rec.month)?;
            let unit = unit_subsidy(&price.retail, administered);
            let consumption = monthly_consumption * *shares.get(grade);
            let grade_total = total_subsidy(&unit, consumption, config.scale_factor)?;

            month_total += grade_total;
            *by_grade.get_mut(grade) += grade_total;
            records.push(SubsidyRecord {
                month: rec.month,
                grade,
                administered_price: administered,
                retail_price: price.retail,
                unit_subsidy: unit,
                consumption,
                total_subsidy: grade_total,
            });
        }
        debug!(month = %rec.month, min = %month_total.min, max = %month_total.max, "monthly subsidy");
        total += month_total;
        by_month.push(MonthTotal {
            month: rec.month,
            total: month_total,
        });
    }

    info!(min = %total.min, max = %total.max, months = by_month.len(), "total subsidy");
    Ok(SubsidyReport {
        records,
        by_month,
        by_grade,
        total,
    })
}

// ---------------------------------------------------------------------------
// Envelope entry point
// ---------------------------------------------------------------------------

/// Input for a standalone subsidy estimate over a precomputed price table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsidyInput {
    pub prices: PriceTable,
    pub schedule: Vec<AdministeredPrice>,
    pub shares: GradeMap<Rate>,
    /// Litres consumed per month across all grades.
    pub monthly_consumption: Volume,
}

/// Estimate implicit subsidy from formula prices and administered prices.
pub fn estimate_subsidy(
    input: &SubsidyInput,
    config: &SubsidyConfig,
) -> FuelSubsidyResult<ComputationOutput<SubsidyReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let share_sum: Decimal = input.shares.iter().map(|(_, s)| *s).sum();
    if share_sum > Decimal::ONE + config.share_tolerance {
        return Err(FuelSubsidyError::InvalidInput {
            field: "shares".into(),
            reason: format!("Grade shares sum to {share_sum}, more than 1"),
        });
    }
    if share_sum < Decimal::ONE - config.share_tolerance {
        warnings.push(format!(
            "Grade shares sum to {share_sum}; the remainder is excluded from the estimate"
        ));
    }

    let schedule = AdministeredSchedule::new(input.schedule.clone())?;
    let output = compute_subsidy(
        &input.prices,
        &schedule,
        &input.shares,
        input.monthly_consumption,
        config,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Unit subsidy max(retail - administered, 0) x grade volume, summed over grades and months",
        &serde_json::json!({
            "monthly_consumption": input.monthly_consumption.to_string(),
            "scale_factor": config.scale_factor.to_string(),
            "months": input.prices.records.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unit_subsidy_floor() {
        let retail = Bounds {
            min: dec!(7000),
            max: dec!(9000),
        };
        let u = unit_subsidy(&retail, dec!(8000));
        assert_eq!(u.min, Decimal::ZERO);
        assert_eq!(u.max, dec!(1000));
        let u = unit_subsidy(&retail, dec!(1_000_000));
        assert_eq!(u, Bounds::ZERO);
    }

    #[test]
    fn test_total_subsidy_scaled() {
        let unit = Bounds {
            min: dec!(100),
            max: dec!(200),
        };
        let t = total_subsidy(&unit, dec!(1_000_000_000), dec!(1_000_000_000)).unwrap();
        assert_eq!(t.min, dec!(100));
        assert_eq!(t.max, dec!(200));
        assert!(total_subsidy(&unit, dec!(1), Decimal::ZERO).is_err());
    }
}
