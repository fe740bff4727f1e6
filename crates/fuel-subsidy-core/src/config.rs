//! Statutory constants for the price formula and subsidy estimation.
//!
//! Everything the engines need is carried in [`FormulaConfig`] and passed
//! explicitly; nothing is read from globals. Defaults reproduce the 2022
//! statutory values and can be overridden from a TOML file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FuelSubsidyError;
use crate::types::{Commodity, FuelGrade, GradeMap, Money, Rate, Volume};
use crate::FuelSubsidyResult;

/// Per-grade base price formula constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeFormula {
    /// MOPS product the grade is priced off.
    pub commodity: Commodity,
    /// Multiplier applied to the MOPS price.
    pub mult: Decimal,
    /// Fixed per-litre cost term (IDR).
    pub cons: Money,
    /// Fixed per-litre subsidy deducted before fuel tax (IDR).
    #[serde(default)]
    pub fixed_subsidy: Money,
}

/// Tax, rounding and conversion constants of the retail price formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Retail prices round up to a multiple of this (IDR).
    pub rounding_unit: Money,
    /// VAT (PPN)
    pub vat: Rate,
    /// Regional fuel tax (PBBKB)
    pub fuel_tax: Rate,
    /// Litres per barrel used to convert USD/bbl into USD/litre.
    pub commodity_divisor: Decimal,
    /// Statutory margin share; the max base price is `margin / factor`.
    pub max_price_factor: Rate,
    /// USD/IDR used for months beyond FX data coverage.
    pub eoy_usdidr: Decimal,
    /// Treat a non-positive base or retail price as fatal instead of a warning.
    pub reject_non_positive: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            rounding_unit: dec!(50),
            vat: dec!(0.11),
            fuel_tax: dec!(0.05),
            commodity_divisor: dec!(158.99),
            max_price_factor: dec!(0.90),
            eoy_usdidr: dec!(15000),
            reject_non_positive: false,
        }
    }
}

/// Forward projection of national fuel consumption from a base year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionProjection {
    pub base_year: i32,
    /// Litres sold in the base year.
    pub base_volume: Volume,
    /// Annual growth rates applied in order after the base year.
    pub growth_rates: Vec<Rate>,
}

impl Default for ConsumptionProjection {
    fn default() -> Self {
        Self {
            base_year: 2019,
            base_volume: dec!(51_310_000_000),
            growth_rates: vec![dec!(-0.0207), dec!(0.0369), dec!(0.051)],
        }
    }
}

/// Constants of the subsidy estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsidyConfig {
    /// Divides IDR totals into the reporting unit (1e9 = billion IDR).
    pub scale_factor: Decimal,
    /// Allowed deviation of a year's consumption shares from 1.
    pub share_tolerance: Decimal,
    /// First historical year included in the average share.
    pub lookback_start_year: i32,
    pub projection: ConsumptionProjection,
}

impl Default for SubsidyConfig {
    fn default() -> Self {
        Self {
            scale_factor: dec!(1_000_000_000),
            share_tolerance: dec!(0.000001),
            lookback_start_year: 2018,
            projection: ConsumptionProjection::default(),
        }
    }
}

/// Complete configuration threaded through the price and subsidy engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaConfig {
    pub pricing: PricingConfig,
    pub subsidy: SubsidyConfig,
    pub grades: GradeMap<GradeFormula>,
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            subsidy: SubsidyConfig::default(),
            grades: default_grades(),
        }
    }
}

/// Statutory formula constants per grade.
pub fn default_grades() -> GradeMap<GradeFormula> {
    GradeMap::from_fn(|grade| match grade {
        FuelGrade::Pertalite => GradeFormula {
            commodity: Commodity::Mogas92,
            mult: dec!(0.9921),
            cons: dec!(1800),
            fixed_subsidy: Decimal::ZERO,
        },
        FuelGrade::Pertamax => GradeFormula {
            commodity: Commodity::Mogas92,
            mult: dec!(1),
            cons: dec!(1800),
            fixed_subsidy: Decimal::ZERO,
        },
        FuelGrade::Turbo => GradeFormula {
            commodity: Commodity::Mogas95,
            mult: dec!(1.01),
            cons: dec!(2000),
            fixed_subsidy: Decimal::ZERO,
        },
        FuelGrade::Pertadex => GradeFormula {
            commodity: Commodity::Gasoil10,
            mult: dec!(1),
            cons: dec!(2000),
            fixed_subsidy: Decimal::ZERO,
        },
        FuelGrade::Dexlite => GradeFormula {
            commodity: Commodity::Gasoil500,
            mult: dec!(1),
            cons: dec!(2000),
            fixed_subsidy: Decimal::ZERO,
        },
        FuelGrade::Biosolar => GradeFormula {
            commodity: Commodity::Gasoil500,
            mult: dec!(1),
            cons: dec!(1800),
            fixed_subsidy: dec!(500),
        },
    })
}

impl FormulaConfig {
    /// Parse and validate a TOML document. Missing tables fall back to defaults.
    pub fn from_toml_str(content: &str) -> FuelSubsidyResult<Self> {
        let config: FormulaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> FuelSubsidyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FuelSubsidyError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject constants that would make the formulas meaningless.
    pub fn validate(&self) -> FuelSubsidyResult<()> {
        let p = &self.pricing;
        if p.rounding_unit <= Decimal::ZERO {
            return Err(invalid("pricing.rounding_unit", "Rounding unit must be positive"));
        }
        if p.commodity_divisor <= Decimal::ZERO {
            return Err(invalid(
                "pricing.commodity_divisor",
                "Commodity divisor must be positive",
            ));
        }
        if p.max_price_factor <= Decimal::ZERO || p.max_price_factor > Decimal::ONE {
            return Err(invalid(
                "pricing.max_price_factor",
                "Max price factor must be in (0, 1]",
            ));
        }
        if p.vat < Decimal::ZERO || p.fuel_tax < Decimal::ZERO {
            return Err(invalid("pricing.vat", "Tax rates must be non-negative"));
        }
        if p.eoy_usdidr <= Decimal::ZERO {
            return Err(invalid("pricing.eoy_usdidr", "FX projection must be positive"));
        }

        let s = &self.subsidy;
        if s.scale_factor <= Decimal::ZERO {
            return Err(invalid("subsidy.scale_factor", "Scale factor must be positive"));
        }
        if s.share_tolerance < Decimal::ZERO {
            return Err(invalid(
                "subsidy.share_tolerance",
                "Share tolerance must be non-negative",
            ));
        }
        if s.projection.base_volume < Decimal::ZERO {
            return Err(invalid(
                "subsidy.projection.base_volume",
                "Base volume must be non-negative",
            ));
        }

        for (grade, formula) in self.grades.iter() {
            if formula.mult <= Decimal::ZERO {
                return Err(invalid(
                    &format!("grades.{grade}.mult"),
                    "Multiplier must be positive",
                ));
            }
            if formula.fixed_subsidy < Decimal::ZERO {
                return Err(invalid(
                    &format!("grades.{grade}.fixed_subsidy"),
                    "Fixed subsidy must be non-negative",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> FuelSubsidyError {
    FuelSubsidyError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}
