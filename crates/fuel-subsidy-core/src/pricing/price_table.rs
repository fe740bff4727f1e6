use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::aggregation::monthly::{MonthlyMarketData, ValueSource};
use crate::config::FormulaConfig;
use crate::error::FuelSubsidyError;
use crate::pricing::formula::{price_grade, GradePrice};
use crate::types::{with_metadata, Bounds, ComputationOutput, FuelGrade, GradeMap, ReferencePeriod};
use crate::FuelSubsidyResult;

/// Formula prices of every grade for one reference month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub month: ReferencePeriod,
    pub usdidr: Decimal,
    pub usdidr_source: ValueSource,
    pub grades: GradeMap<GradePrice>,
}

/// Monthly price records in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub records: Vec<PriceRecord>,
}

/// Flat (month, grade, min, max) row for tabular export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub month: ReferencePeriod,
    pub grade: FuelGrade,
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceTable {
    pub fn get(&self, month: ReferencePeriod) -> Option<&PriceRecord> {
        self.records.iter().find(|r| r.month == month)
    }

    pub fn months(&self) -> Vec<ReferencePeriod> {
        self.records.iter().map(|r| r.month).collect()
    }

    pub fn base_rows(&self) -> Vec<PriceRow> {
        self.rows(|p| p.base)
    }

    pub fn retail_rows(&self) -> Vec<PriceRow> {
        self.rows(|p| p.retail)
    }

    fn rows(&self, pick: impl Fn(&GradePrice) -> Bounds) -> Vec<PriceRow> {
        let mut out = Vec::with_capacity(self.records.len() * FuelGrade::ALL.len());
        for rec in &self.records {
            for (grade, price) in rec.grades.iter() {
                let b = pick(price);
                out.push(PriceRow {
                    month: rec.month,
                    grade,
                    min: b.min,
                    max: b.max,
                });
            }
        }
        out
    }
}

/// Price every grade for every month of `horizon`.
///
/// Each month is priced from its own base price; retail prices are never
/// carried from one month to the next. A month lacking FX or a grade's
/// reference commodity fails with `MissingPeriodData`.
pub fn build_price_table(
    market: &MonthlyMarketData,
    horizon: &[ReferencePeriod],
    config: &FormulaConfig,
) -> FuelSubsidyResult<ComputationOutput<PriceTable>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if horizon.is_empty() {
        return Err(FuelSubsidyError::InsufficientData(
            "Pricing horizon has no months".into(),
        ));
    }

    let mut records = Vec::with_capacity(horizon.len());
    for &month in horizon {
        let fx = market.fx.require(month)?;
        let context = month.to_string();

        let grades = GradeMap::try_from_fn(|grade| {
            let commodity = config.grades.get(grade).commodity;
            let mops = market.commodities.get(commodity).require(month)?;
            price_grade(grade, mops.value, fx.value, config, &context, &mut warnings)
        })?;

        debug!(
            %month,
            usdidr = %fx.value,
            pertalite = %grades.pertalite.retail.min,
            biosolar = %grades.biosolar.retail.min,
            "priced month"
        );
        records.push(PriceRecord {
            month,
            usdidr: fx.value,
            usdidr_source: fx.source,
            grades,
        });
    }

    let output = PriceTable { records };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Statutory base price bounds and rounded-up retail prices per reference month",
        &serde_json::json!({
            "months": horizon.len(),
            "vat": config.pricing.vat.to_string(),
            "fuel_tax": config.pricing.fuel_tax.to_string(),
            "rounding_unit": config.pricing.rounding_unit.to_string(),
            "commodity_divisor": config.pricing.commodity_divisor.to_string(),
            "max_price_factor": config.pricing.max_price_factor.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::monthly::{CommoditySeries, MonthlySeries, MonthlyValue, USDIDR};
    use crate::types::Commodity;
    use rust_decimal_macros::dec;

    fn series(variable: &str, entries: &[(ReferencePeriod, Decimal)]) -> MonthlySeries {
        let mut s = MonthlySeries::empty(variable);
        for (p, v) in entries {
            s.values.insert(
                *p,
                MonthlyValue {
                    value: *v,
                    source: ValueSource::Observed,
                    observations: 1,
                },
            );
        }
        s
    }

    fn market(months: &[ReferencePeriod]) -> MonthlyMarketData {
        let with = |c: Commodity, v: Decimal| {
            series(c.as_str(), &months.iter().map(|m| (*m, v)).collect::<Vec<_>>())
        };
        MonthlyMarketData {
            fx: series(USDIDR, &months.iter().map(|m| (*m, dec!(15000))).collect::<Vec<_>>()),
            commodities: CommoditySeries {
                mogas_92: with(Commodity::Mogas92, dec!(90)),
                mogas_95: with(Commodity::Mogas95, dec!(95)),
                gasoil_10: with(Commodity::Gasoil10, dec!(120)),
                gasoil_500: with(Commodity::Gasoil500, dec!(118)),
            },
        }
    }

    #[test]
    fn test_table_has_one_record_per_month() {
        let horizon = ReferencePeriod::calendar_year(2022);
        let out = build_price_table(&market(&horizon), &horizon, &FormulaConfig::default())
            .unwrap();
        assert_eq!(out.result.records.len(), 12);
        assert_eq!(out.result.retail_rows().len(), 72);
        assert!(out.warnings.is_empty());
        let jan = &out.result.records[0];
        assert_eq!(jan.grades.pertalite.retail.min, dec!(11950));
    }

    #[test]
    fn test_missing_commodity_names_variable_and_month() {
        let horizon = ReferencePeriod::calendar_year(2022);
        let mut m = market(&horizon);
        m.commodities
            .mogas_95
            .values
            .remove(&ReferencePeriod::new(5, 2022).unwrap());
        let err = build_price_table(&m, &horizon, &FormulaConfig::default()).unwrap_err();
        match err {
            FuelSubsidyError::MissingPeriodData { variable, period } => {
                assert_eq!(variable, "mogas_95");
                assert_eq!(period, "2022-05");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_min_never_exceeds_max() {
        let horizon = ReferencePeriod::calendar_year(2022);
        let out = build_price_table(&market(&horizon), &horizon, &FormulaConfig::default())
            .unwrap();
        for row in out.result.base_rows().iter().chain(out.result.retail_rows().iter()) {
            assert!(row.min <= row.max, "{row:?}");
        }
    }
}
