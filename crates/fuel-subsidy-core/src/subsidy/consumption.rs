use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};

use crate::config::{ConsumptionProjection, SubsidyConfig};
use crate::error::FuelSubsidyError;
use crate::types::{with_metadata, ComputationOutput, FuelGrade, GradeMap, Rate, Volume};
use crate::FuelSubsidyResult;

// ---------------------------------------------------------------------------
// Historical volumes
// ---------------------------------------------------------------------------

/// Transport-sector fuel volumes for one year, by product category as
/// published in the energy handbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalConsumptionRow {
    #[serde(alias = "Year")]
    pub year: i32,
    #[serde(alias = "RON88", default)]
    pub ron88: Volume,
    #[serde(alias = "RON90", default)]
    pub ron90: Volume,
    #[serde(alias = "RON92", default)]
    pub ron92: Volume,
    #[serde(alias = "RON95_higher", default)]
    pub ron95_higher: Volume,
    #[serde(alias = "Gasoil_CN48", default)]
    pub gasoil_cn48: Volume,
    #[serde(alias = "Biogasoil", default)]
    pub biogasoil: Volume,
    #[serde(alias = "Gasoil_CN51", default)]
    pub gasoil_cn51: Volume,
    #[serde(alias = "Gasoil_CN53", default)]
    pub gasoil_cn53: Volume,
    /// Categories outside the six compared grades.
    #[serde(default)]
    pub other: Volume,
    /// Reported total, when the source publishes one. Otherwise the sum of
    /// all categories is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Volume>,
}

impl HistoricalConsumptionRow {
    /// Consolidate handbook categories into retail grades: RON 88 is sold as
    /// pertalite and CN 48 gasoil as biosolar.
    pub fn grade_volumes(&self) -> GradeMap<Volume> {
        GradeMap::from_fn(|grade| match grade {
            FuelGrade::Pertalite => self.ron88 + self.ron90,
            FuelGrade::Pertamax => self.ron92,
            FuelGrade::Turbo => self.ron95_higher,
            FuelGrade::Pertadex => self.gasoil_cn53,
            FuelGrade::Dexlite => self.gasoil_cn51,
            FuelGrade::Biosolar => self.gasoil_cn48 + self.biogasoil,
        })
    }

    fn categories(&self) -> [(&'static str, Volume); 9] {
        [
            ("ron88", self.ron88),
            ("ron90", self.ron90),
            ("ron92", self.ron92),
            ("ron95_higher", self.ron95_higher),
            ("gasoil_cn48", self.gasoil_cn48),
            ("biogasoil", self.biogasoil),
            ("gasoil_cn51", self.gasoil_cn51),
            ("gasoil_cn53", self.gasoil_cn53),
            ("other", self.other),
        ]
    }
}

// ---------------------------------------------------------------------------
// Shares
// ---------------------------------------------------------------------------

/// Share of each grade in one year's total volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearShares {
    pub year: i32,
    pub total_volume: Volume,
    pub shares: GradeMap<Rate>,
    /// Share of categories outside the six grades.
    pub excluded: Rate,
}

impl YearShares {
    pub fn sum(&self) -> Rate {
        self.shares.iter().map(|(_, s)| *s).sum::<Decimal>() + self.excluded
    }
}

/// Per-year shares and their average over the lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareEstimate {
    pub by_year: Vec<YearShares>,
    pub lookback_years: Vec<i32>,
    pub average: GradeMap<Rate>,
}

/// Shares of one year. Fails with `ShareSumViolation` when the shares do
/// not add up to one.
pub fn year_shares(row: &HistoricalConsumptionRow, tolerance: Decimal) -> FuelSubsidyResult<YearShares> {
    if let Some((name, v)) = row.categories().into_iter().find(|(_, v)| *v < Decimal::ZERO) {
        return Err(FuelSubsidyError::InvalidInput {
            field: format!("consumption.{}.{}", row.year, name),
            reason: format!("Volume {v} must be non-negative"),
        });
    }

    let total = match row.total {
        Some(t) => t,
        None => row.categories().iter().map(|(_, v)| *v).sum(),
    };
    if total <= Decimal::ZERO {
        return Err(FuelSubsidyError::DivisionByZero {
            context: format!("consumption share denominator for {}", row.year),
        });
    }

    let volumes = row.grade_volumes();
    let shares = volumes.map(|_, v| *v / total);
    let result = YearShares {
        year: row.year,
        total_volume: total,
        shares,
        excluded: row.other / total,
    };

    let sum = result.sum();
    if (sum - Decimal::ONE).abs() > tolerance {
        error!(year = row.year, %sum, "consumption shares do not sum to one");
        return Err(FuelSubsidyError::ShareSumViolation {
            year: row.year,
            sum,
            tolerance,
        });
    }
    Ok(result)
}

/// Validate every historical year, then average grade shares over the years
/// from `lookback_start_year` onwards.
pub fn estimate_shares(
    rows: &[HistoricalConsumptionRow],
    config: &SubsidyConfig,
) -> FuelSubsidyResult<ComputationOutput<ShareEstimate>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if rows.is_empty() {
        return Err(FuelSubsidyError::InsufficientData(
            "No historical consumption rows".into(),
        ));
    }

    let mut by_year = rows
        .iter()
        .map(|r| year_shares(r, config.share_tolerance))
        .collect::<FuelSubsidyResult<Vec<_>>>()?;
    by_year.sort_by_key(|y| y.year);

    let window: Vec<&YearShares> = by_year
        .iter()
        .filter(|y| y.year >= config.lookback_start_year)
        .collect();
    if window.is_empty() {
        return Err(FuelSubsidyError::InsufficientData(format!(
            "No consumption data from {} onwards",
            config.lookback_start_year
        )));
    }

    let n = Decimal::from(window.len() as u64);
    let average = GradeMap::from_fn(|grade| {
        window.iter().map(|y| *y.shares.get(grade)).sum::<Decimal>() / n
    });
    let lookback_years: Vec<i32> = window.iter().map(|y| y.year).collect();
    debug!(years = ?lookback_years, "averaged consumption shares");

    let output = ShareEstimate {
        by_year,
        lookback_years,
        average,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Grade share of transport fuel volume, averaged over the lookback window",
        &serde_json::json!({
            "lookback_start_year": config.lookback_start_year,
            "share_tolerance": config.share_tolerance.to_string(),
            "remap": {
                "pertalite": ["RON88", "RON90"],
                "biosolar": ["Gasoil_CN48", "Biogasoil"],
            },
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Volume projection
// ---------------------------------------------------------------------------

impl ConsumptionProjection {
    /// National volume in `year`, compounding the growth rates from the base year.
    pub fn annual_volume(&self, year: i32) -> FuelSubsidyResult<Volume> {
        if year < self.base_year {
            return Err(FuelSubsidyError::InvalidInput {
                field: "year".into(),
                reason: format!(
                    "Projection year {year} precedes base year {}",
                    self.base_year
                ),
            });
        }
        let steps = (year - self.base_year) as usize;
        if steps > self.growth_rates.len() {
            return Err(FuelSubsidyError::InsufficientData(format!(
                "Projecting {year} needs {steps} growth rates from {}, got {}",
                self.base_year,
                self.growth_rates.len()
            )));
        }
        Ok(self.growth_rates[..steps]
            .iter()
            .fold(self.base_volume, |v, g| v * (Decimal::ONE + g)))
    }

    /// Annual volume spread evenly over twelve months.
    pub fn monthly_volume(&self, year: i32) -> FuelSubsidyResult<Volume> {
        Ok(self.annual_volume(year)? / Decimal::from(12))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(year: i32) -> HistoricalConsumptionRow {
        HistoricalConsumptionRow {
            year,
            ron88: dec!(100),
            ron90: dec!(300),
            ron92: dec!(150),
            ron95_higher: dec!(10),
            gasoil_cn48: dec!(50),
            biogasoil: dec!(300),
            gasoil_cn51: dec!(60),
            gasoil_cn53: dec!(30),
            other: Decimal::ZERO,
            total: None,
        }
    }

    #[test]
    fn test_remap_consolidates_categories() {
        let v = row(2019).grade_volumes();
        assert_eq!(v.pertalite, dec!(400));
        assert_eq!(v.biosolar, dec!(350));
        assert_eq!(v.dexlite, dec!(60));
        assert_eq!(v.pertadex, dec!(30));
    }

    #[test]
    fn test_year_shares_sum_to_one() {
        let s = year_shares(&row(2019), dec!(0.000001)).unwrap();
        assert_eq!(s.total_volume, dec!(1000));
        assert_eq!(s.shares.pertalite, dec!(0.4));
        assert!((s.sum() - Decimal::ONE).abs() <= dec!(0.000001));
    }

    #[test]
    fn test_reported_total_mismatch_is_violation() {
        let mut r = row(2020);
        r.total = Some(dec!(1100));
        let err = year_shares(&r, dec!(0.000001)).unwrap_err();
        match err {
            FuelSubsidyError::ShareSumViolation { year, .. } => assert_eq!(year, 2020),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_excluded_category_counts_towards_total() {
        let mut r = row(2021);
        r.other = dec!(1000);
        let s = year_shares(&r, dec!(0.000001)).unwrap();
        assert_eq!(s.excluded, dec!(0.5));
        assert_eq!(s.shares.pertalite, dec!(0.2));
    }

    #[test]
    fn test_average_uses_lookback_window() {
        let mut early = row(2015);
        early.ron92 = dec!(1150);
        let rows = vec![early, row(2018), row(2019)];
        let out = estimate_shares(&rows, &SubsidyConfig::default()).unwrap();
        assert_eq!(out.result.lookback_years, vec![2018, 2019]);
        assert_eq!(out.result.average.pertamax, dec!(0.15));
        assert_eq!(out.result.by_year.len(), 3);
    }

    #[test]
    fn test_empty_window_is_insufficient() {
        let rows = vec![row(2010)];
        assert!(matches!(
            estimate_shares(&rows, &SubsidyConfig::default()),
            Err(FuelSubsidyError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_projection_compounds_growth() {
        let p = ConsumptionProjection {
            base_year: 2019,
            base_volume: dec!(1000),
            growth_rates: vec![dec!(0.10), dec!(-0.10)],
        };
        assert_eq!(p.annual_volume(2019).unwrap(), dec!(1000));
        assert_eq!(p.annual_volume(2021).unwrap(), dec!(990));
        assert_eq!(p.monthly_volume(2021).unwrap(), dec!(82.5));
        assert!(p.annual_volume(2022).is_err());
        assert!(p.annual_volume(2018).is_err());
    }
}
