//! Reconciliation of the fuel subsidy estimate against the state budget's
//! energy subsidy and compensation lines.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FuelSubsidyError;
use crate::types::{with_metadata, Bounds, ComputationOutput, Money};
use crate::FuelSubsidyResult;

/// Energy subsidy and compensation lines of a budget (IDR billion).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetLines {
    pub lpg_subsidy: Money,
    pub fuel_subsidy: Money,
    pub electricity_subsidy: Money,
    pub fuel_compensation: Money,
    pub electricity_compensation: Money,
}

impl BudgetLines {
    pub fn total(&self) -> Money {
        self.lpg_subsidy
            + self.fuel_subsidy
            + self.electricity_subsidy
            + self.fuel_compensation
            + self.electricity_compensation
    }

    /// Fuel subsidy plus fuel compensation.
    pub fn fuel(&self) -> Money {
        self.fuel_subsidy + self.fuel_compensation
    }
}

/// Original budget plus the approved revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetInput {
    pub original: BudgetLines,
    /// Additional fuel and LPG subsidy approved as one amount; split
    /// pro rata to the original fuel and LPG lines.
    pub additional_fuel_lpg_subsidy: Money,
    pub additional_electricity_subsidy: Money,
    pub additional_fuel_compensation: Money,
    pub additional_electricity_compensation: Money,
    /// Formula-based fuel subsidy estimate to reconcile (IDR billion).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_fuel_subsidy: Option<Bounds>,
}

impl BudgetInput {
    /// 2022 state budget and its mid-year revision.
    pub fn apbn_2022() -> Self {
        Self {
            original: BudgetLines {
                lpg_subsidy: dec!(66300),
                fuel_subsidy: dec!(11300),
                electricity_subsidy: dec!(56500),
                fuel_compensation: dec!(18500),
                electricity_compensation: Decimal::ZERO,
            },
            additional_fuel_lpg_subsidy: dec!(71800),
            additional_electricity_subsidy: dec!(3100),
            additional_fuel_compensation: dec!(234000),
            additional_electricity_compensation: dec!(41000),
            estimated_fuel_subsidy: None,
        }
    }
}

/// Budget totals and, when an estimate is supplied, the implied energy subsidy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReconciliation {
    pub additional: BudgetLines,
    pub revised: BudgetLines,
    pub total_energy_subsidy: Money,
    pub total_fuel_subsidy: Money,
    pub total_non_fuel_subsidy: Money,
    /// Estimated fuel subsidy plus budgeted non-fuel subsidy.
    pub implied_energy_subsidy: Option<Bounds>,
    /// Estimated fuel subsidy minus budgeted fuel subsidy and compensation.
    pub fuel_subsidy_gap: Option<Bounds>,
}

/// Split the revision across lines and compare with the estimate.
pub fn reconcile_budget(input: &BudgetInput) -> FuelSubsidyResult<ComputationOutput<BudgetReconciliation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let o = &input.original;
    let lpg_fuel = o.lpg_subsidy + o.fuel_subsidy;
    if lpg_fuel.is_zero() {
        return Err(FuelSubsidyError::DivisionByZero {
            context: "pro-rating additional fuel and LPG subsidy".into(),
        });
    }

    let additional = BudgetLines {
        lpg_subsidy: input.additional_fuel_lpg_subsidy * o.lpg_subsidy / lpg_fuel,
        fuel_subsidy: input.additional_fuel_lpg_subsidy * o.fuel_subsidy / lpg_fuel,
        electricity_subsidy: input.additional_electricity_subsidy,
        fuel_compensation: input.additional_fuel_compensation,
        electricity_compensation: input.additional_electricity_compensation,
    };
    let revised = BudgetLines {
        lpg_subsidy: o.lpg_subsidy + additional.lpg_subsidy,
        fuel_subsidy: o.fuel_subsidy + additional.fuel_subsidy,
        electricity_subsidy: o.electricity_subsidy + additional.electricity_subsidy,
        fuel_compensation: o.fuel_compensation + additional.fuel_compensation,
        electricity_compensation: o.electricity_compensation + additional.electricity_compensation,
    };

    let total_energy_subsidy = revised.total();
    let total_fuel_subsidy = revised.fuel();
    let total_non_fuel_subsidy = total_energy_subsidy - total_fuel_subsidy;

    let implied_energy_subsidy = input
        .estimated_fuel_subsidy
        .map(|e| e.map(|v| v + total_non_fuel_subsidy));
    let fuel_subsidy_gap = input
        .estimated_fuel_subsidy
        .map(|e| e.map(|v| v - total_fuel_subsidy));

    if let Some(gap) = fuel_subsidy_gap {
        if gap.max < Decimal::ZERO {
            warnings.push(format!(
                "Budgeted fuel subsidy and compensation {} exceed even the maximum estimate",
                total_fuel_subsidy
            ));
        }
    }

    let output = BudgetReconciliation {
        additional,
        revised,
        total_energy_subsidy,
        total_fuel_subsidy,
        total_non_fuel_subsidy,
        implied_energy_subsidy,
        fuel_subsidy_gap,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let methodology = format!(
        "Budget energy subsidy decomposition; combined fuel+LPG revision pro-rated by original lines \
         over their actual sum {lpg_fuel} (the published 2022 figures divided by 77500, so the LPG \
         and fuel parts here differ slightly from them)"
    );
    Ok(with_metadata(
        &methodology,
        &serde_json::json!({
            "original_total": o.total().to_string(),
            "pro_rating_divisor": lpg_fuel.to_string(),
            "unit": "IDR billion",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apbn_2022_totals() {
        let out = reconcile_budget(&BudgetInput::apbn_2022()).unwrap();
        let r = &out.result;
        // Pro-rated shares add back to the combined amount
        let combined = r.additional.lpg_subsidy + r.additional.fuel_subsidy;
        assert!((combined - dec!(71800)).abs() < dec!(0.000001));
        // 152600 original + 71800 + 3100 + 234000 + 41000
        assert!((r.total_energy_subsidy - dec!(502500)).abs() < dec!(0.000001));
        assert_eq!(
            r.total_non_fuel_subsidy,
            r.total_energy_subsidy - r.total_fuel_subsidy
        );
        assert!(r.implied_energy_subsidy.is_none());
    }

    #[test]
    fn test_methodology_states_pro_rating_divisor() {
        let out = reconcile_budget(&BudgetInput::apbn_2022()).unwrap();
        assert!(out.methodology.contains("77600"), "{}", out.methodology);
        assert!(out.methodology.contains("77500"), "{}", out.methodology);
        assert_eq!(out.assumptions["pro_rating_divisor"], "77600");
    }

    #[test]
    fn test_estimate_replaces_fuel_lines() {
        let mut input = BudgetInput::apbn_2022();
        input.estimated_fuel_subsidy = Some(Bounds {
            min: dec!(100000),
            max: dec!(200000),
        });
        let out = reconcile_budget(&input).unwrap();
        let r = &out.result;
        let implied = r.implied_energy_subsidy.unwrap();
        assert_eq!(implied.min, dec!(100000) + r.total_non_fuel_subsidy);
        assert!((implied.max - implied.min - dec!(100000)).abs() < dec!(0.000001));
        assert!(out.warnings.iter().any(|w| w.contains("exceed")));
    }

    #[test]
    fn test_zero_lpg_fuel_lines_rejected() {
        let mut input = BudgetInput::apbn_2022();
        input.original.lpg_subsidy = Decimal::ZERO;
        input.original.fuel_subsidy = Decimal::ZERO;
        assert!(reconcile_budget(&input).is_err());
    }
}
