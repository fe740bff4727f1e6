use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{FormulaConfig, GradeFormula, PricingConfig};
use crate::error::FuelSubsidyError;
use crate::types::{with_metadata, Bounds, ComputationOutput, FuelGrade, Money};
use crate::FuelSubsidyResult;

// ---------------------------------------------------------------------------
// Base price
// ---------------------------------------------------------------------------

/// Statutory min/max base price (IDR/litre) of one grade.
///
/// margin = commodity * mult * usdidr / divisor + cons
/// min    = margin
/// max    = margin / max_price_factor
pub fn base_price(
    commodity_price: Decimal,
    usdidr: Decimal,
    formula: &GradeFormula,
    pricing: &PricingConfig,
) -> FuelSubsidyResult<Bounds> {
    if pricing.commodity_divisor.is_zero() {
        return Err(FuelSubsidyError::DivisionByZero {
            context: "base price commodity divisor".into(),
        });
    }
    if pricing.max_price_factor.is_zero() {
        return Err(FuelSubsidyError::DivisionByZero {
            context: "base price max price factor".into(),
        });
    }

    let margin =
        commodity_price * formula.mult * usdidr / pricing.commodity_divisor + formula.cons;
    Ok(Bounds {
        min: margin,
        max: margin / pricing.max_price_factor,
    })
}

// ---------------------------------------------------------------------------
// Retail price
// ---------------------------------------------------------------------------

/// Retail price from a base price: VAT, fixed subsidy, fuel tax, then
/// rounding *up* to the rounding unit.
///
/// retail = r * ceil(((p * (1 + v)) - s) * (1 + t) / r)
pub fn retail_price(
    base: Money,
    fixed_subsidy: Money,
    pricing: &PricingConfig,
) -> FuelSubsidyResult<Money> {
    let r = pricing.rounding_unit;
    if r.is_zero() {
        return Err(FuelSubsidyError::DivisionByZero {
            context: "retail price rounding unit".into(),
        });
    }
    let taxed = (base * (Decimal::ONE + pricing.vat) - fixed_subsidy)
        * (Decimal::ONE + pricing.fuel_tax);
    Ok(r * (taxed / r).ceil())
}

/// Both retail bounds, each derived from its own base bound.
pub fn retail_bounds(
    base: &Bounds,
    fixed_subsidy: Money,
    pricing: &PricingConfig,
) -> FuelSubsidyResult<Bounds> {
    Ok(Bounds {
        min: retail_price(base.min, fixed_subsidy, pricing)?,
        max: retail_price(base.max, fixed_subsidy, pricing)?,
    })
}

// ---------------------------------------------------------------------------
// Single-grade quote
// ---------------------------------------------------------------------------

/// Input for pricing one grade from one commodity price and FX rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeQuoteInput {
    pub grade: FuelGrade,
    /// MOPS price of the grade's reference product (USD/bbl).
    pub commodity_price: Decimal,
    pub usdidr: Decimal,
}

/// Base and retail bounds for one grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradePrice {
    /// MOPS price used (USD/bbl).
    pub commodity_price: Decimal,
    pub base: Bounds,
    pub retail: Bounds,
}

/// Price a grade and collect data-quality warnings for non-positive results.
pub(crate) fn price_grade(
    grade: FuelGrade,
    commodity_price: Decimal,
    usdidr: Decimal,
    config: &FormulaConfig,
    context: &str,
    warnings: &mut Vec<String>,
) -> FuelSubsidyResult<GradePrice> {
    let formula = config.grades.get(grade);
    let base = base_price(commodity_price, usdidr, formula, &config.pricing)?;
    let retail = retail_bounds(&base, formula.fixed_subsidy, &config.pricing)?;

    for (bound, value) in [
        ("base min", base.min),
        ("base max", base.max),
        ("retail min", retail.min),
        ("retail max", retail.max),
    ] {
        if value <= Decimal::ZERO {
            if config.pricing.reject_non_positive {
                return Err(FuelSubsidyError::NegativeRetailPrice {
                    grade: grade.to_string(),
                    period: context.to_string(),
                    bound: bound.to_string(),
                    price: value,
                });
            }
            tracing::warn!(%grade, period = context, bound, %value, "non-positive price");
            warnings.push(format!(
                "Non-positive {bound} price for {grade} in {context}: {value}"
            ));
        }
    }

    // A negative margin divided by the max price factor moves further below
    // zero, so min and max swap places.
    if base.min > base.max {
        tracing::warn!(%grade, period = context, "base bounds inverted");
        warnings.push(format!(
            "Inverted base bounds for {grade} in {context}: min {} > max {} (negative margin)",
            base.min, base.max
        ));
    }

    Ok(GradePrice {
        commodity_price,
        base,
        retail,
    })
}

/// Quote base and retail price bounds for a single grade.
pub fn quote_grade(
    input: &GradeQuoteInput,
    config: &FormulaConfig,
) -> FuelSubsidyResult<ComputationOutput<GradePrice>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.usdidr <= Decimal::ZERO {
        return Err(FuelSubsidyError::InvalidInput {
            field: "usdidr".into(),
            reason: "Exchange rate must be positive".into(),
        });
    }
    if input.commodity_price < Decimal::ZERO {
        return Err(FuelSubsidyError::InvalidInput {
            field: "commodity_price".into(),
            reason: "Commodity price must be non-negative".into(),
        });
    }

    let output = price_grade(
        input.grade,
        input.commodity_price,
        input.usdidr,
        config,
        "quote",
        &mut warnings,
    )?;

    let formula = config.grades.get(input.grade);
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Statutory base price (MOPS x mult x FX / 158.99 + cons) and rounded-up retail price",
        &serde_json::json!({
            "grade": input.grade,
            "commodity": formula.commodity,
            "mult": formula.mult.to_string(),
            "cons": formula.cons.to_string(),
            "fixed_subsidy": formula.fixed_subsidy.to_string(),
            "vat": config.pricing.vat.to_string(),
            "fuel_tax": config.pricing.fuel_tax.to_string(),
            "rounding_unit": config.pricing.rounding_unit.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_grades;
    use rust_decimal_macros::dec;

    #[test]
    fn test_base_price_pertalite() {
        let grades = default_grades();
        let b = base_price(dec!(90), dec!(15000), &grades.pertalite, &PricingConfig::default())
            .unwrap();
        // 90 * 0.9921 * 15000 / 158.99 + 1800 ≈ 10224.02
        assert!((b.min - dec!(10224.02)).abs() < dec!(0.01));
        assert!((b.max - b.min / dec!(0.9)).abs() < dec!(0.0000001));
        assert!(b.min <= b.max);
    }

    #[test]
    fn test_retail_biosolar_fixed_subsidy() {
        // (7000 * 1.11 - 500) * 1.05 = 7633.5 → 7650
        let r = retail_price(dec!(7000), dec!(500), &PricingConfig::default()).unwrap();
        assert_eq!(r, dec!(7650));
    }

    #[test]
    fn test_retail_rounds_up_only() {
        // 10000 * 1.11 * 1.05 = 11655 → ceil(233.1) = 234 → 11700
        let r = retail_price(dec!(10000), Decimal::ZERO, &PricingConfig::default()).unwrap();
        assert_eq!(r, dec!(11700));
        let cfg = PricingConfig {
            vat: Decimal::ZERO,
            fuel_tax: Decimal::ZERO,
            ..PricingConfig::default()
        };
        assert_eq!(retail_price(dec!(1000), Decimal::ZERO, &cfg).unwrap(), dec!(1000));
        assert_eq!(retail_price(dec!(1000.01), Decimal::ZERO, &cfg).unwrap(), dec!(1050));
    }

    #[test]
    fn test_zero_rounding_unit_is_division_error() {
        let cfg = PricingConfig {
            rounding_unit: Decimal::ZERO,
            ..PricingConfig::default()
        };
        assert!(matches!(
            retail_price(dec!(1000), Decimal::ZERO, &cfg),
            Err(FuelSubsidyError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_non_positive_price_warns_or_fails() {
        let mut config = FormulaConfig::default();
        let mut warnings = Vec::new();
        // zero MOPS: biosolar base = 1800, retail = (1998 - 500) * 1.05 > 0, no warning
        price_grade(FuelGrade::Biosolar, Decimal::ZERO, dec!(15000), &config, "2022-01", &mut warnings)
            .unwrap();
        assert!(warnings.is_empty());

        config.grades.biosolar.cons = dec!(100);
        price_grade(FuelGrade::Biosolar, Decimal::ZERO, dec!(15000), &config, "2022-01", &mut warnings)
            .unwrap();
        assert!(warnings.iter().any(|w| w.contains("biosolar") && w.contains("2022-01")));

        config.pricing.reject_non_positive = true;
        let err = price_grade(
            FuelGrade::Biosolar,
            Decimal::ZERO,
            dec!(15000),
            &config,
            "2022-01",
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, FuelSubsidyError::NegativeRetailPrice { .. }));
    }

    #[test]
    fn test_negative_margin_names_inverted_bounds() {
        let mut config = FormulaConfig::default();
        config.grades.biosolar.cons = dec!(-900);
        let mut warnings = Vec::new();
        let price = price_grade(
            FuelGrade::Biosolar,
            Decimal::ZERO,
            dec!(15000),
            &config,
            "2022-03",
            &mut warnings,
        )
        .unwrap();
        // -900 / 0.9 = -1000 sits below -900
        assert!(price.base.min > price.base.max);
        assert!(warnings
            .iter()
            .any(|w| w.contains("Inverted base bounds") && w.contains("biosolar") && w.contains("2022-03")));

        let mut positive = Vec::new();
        price_grade(FuelGrade::Biosolar, dec!(80), dec!(15000), &FormulaConfig::default(), "2022-03", &mut positive)
            .unwrap();
        assert!(positive.iter().all(|w| !w.contains("Inverted")));
    }

    #[test]
    fn test_quote_rejects_bad_fx() {
        let input = GradeQuoteInput {
            grade: FuelGrade::Pertamax,
            commodity_price: dec!(100),
            usdidr: Decimal::ZERO,
        };
        assert!(quote_grade(&input, &FormulaConfig::default()).is_err());
    }
}
