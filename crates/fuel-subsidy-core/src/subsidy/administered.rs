use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FuelSubsidyError;
use crate::types::{FuelGrade, Money, ReferencePeriod};
use crate::FuelSubsidyResult;

/// A decree setting the retail price of one grade from a date onwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdministeredPrice {
    pub effective_date: NaiveDate,
    pub grade: FuelGrade,
    pub price: Money,
}

/// Step function of administered prices per grade.
///
/// A change effective at any day of a month applies to that whole month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdministeredSchedule {
    entries: Vec<AdministeredPrice>,
}

impl AdministeredSchedule {
    pub fn new(mut entries: Vec<AdministeredPrice>) -> FuelSubsidyResult<Self> {
        if let Some(bad) = entries.iter().find(|e| e.price <= Decimal::ZERO) {
            return Err(FuelSubsidyError::InvalidInput {
                field: format!("administered_price.{}", bad.grade),
                reason: format!(
                    "Price {} effective {} must be positive",
                    bad.price, bad.effective_date
                ),
            });
        }
        entries.sort_by_key(|e| (e.grade, e.effective_date));
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AdministeredPrice] {
        &self.entries
    }

    /// Price in force for `grade` during `month`.
    pub fn price_for(&self, grade: FuelGrade, month: ReferencePeriod) -> FuelSubsidyResult<Money> {
        self.entries
            .iter()
            .filter(|e| e.grade == grade && effective_month(e.effective_date) <= month)
            .max_by_key(|e| e.effective_date)
            .map(|e| e.price)
            .ok_or_else(|| FuelSubsidyError::MissingPeriodData {
                variable: format!("administered price of {grade}"),
                period: month.to_string(),
            })
    }

    /// Jakarta retail prices in force during 2021–2022.
    pub fn jakarta_2022() -> Self {
        let entry = |y: i32, m: u32, d: u32, grade: FuelGrade, price: Money| AdministeredPrice {
            effective_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
            grade,
            price,
        };
        use FuelGrade::*;
        let entries = vec![
            entry(2021, 1, 1, Biosolar, dec!(5150)),
            entry(2021, 1, 1, Pertalite, dec!(7650)),
            entry(2021, 1, 1, Pertamax, dec!(9000)),
            entry(2022, 1, 1, Turbo, dec!(12000)),
            entry(2022, 1, 1, Pertadex, dec!(11150)),
            entry(2022, 1, 1, Dexlite, dec!(9500)),
            entry(2022, 2, 12, Turbo, dec!(13500)),
            entry(2022, 2, 12, Pertadex, dec!(13200)),
            entry(2022, 2, 12, Dexlite, dec!(12150)),
            entry(2022, 3, 1, Turbo, dec!(14500)),
            entry(2022, 3, 1, Pertadex, dec!(13700)),
            entry(2022, 3, 1, Dexlite, dec!(12950)),
            entry(2022, 4, 1, Pertamax, dec!(12500)),
            entry(2022, 7, 10, Turbo, dec!(16200)),
            entry(2022, 7, 10, Pertadex, dec!(16500)),
            entry(2022, 7, 10, Dexlite, dec!(15000)),
        ];
        let mut schedule = Self { entries };
        schedule.entries.sort_by_key(|e| (e.grade, e.effective_date));
        schedule
    }
}

fn effective_month(date: NaiveDate) -> ReferencePeriod {
    ReferencePeriod::january(date.year()).plus_months(date.month() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(m: u32, y: i32) -> ReferencePeriod {
        ReferencePeriod::new(m, y).unwrap()
    }

    #[test]
    fn test_mid_month_change_applies_to_whole_month() {
        let s = AdministeredSchedule::jakarta_2022();
        assert_eq!(s.price_for(FuelGrade::Turbo, p(1, 2022)).unwrap(), dec!(12000));
        assert_eq!(s.price_for(FuelGrade::Turbo, p(2, 2022)).unwrap(), dec!(13500));
        assert_eq!(s.price_for(FuelGrade::Turbo, p(7, 2022)).unwrap(), dec!(16200));
        assert_eq!(s.price_for(FuelGrade::Turbo, p(12, 2022)).unwrap(), dec!(16200));
    }

    #[test]
    fn test_unchanged_grade_holds_level() {
        let s = AdministeredSchedule::jakarta_2022();
        for m in 1..=12 {
            assert_eq!(s.price_for(FuelGrade::Pertalite, p(m, 2022)).unwrap(), dec!(7650));
        }
        assert_eq!(s.price_for(FuelGrade::Pertamax, p(3, 2022)).unwrap(), dec!(9000));
        assert_eq!(s.price_for(FuelGrade::Pertamax, p(4, 2022)).unwrap(), dec!(12500));
    }

    #[test]
    fn test_before_first_decree_is_missing() {
        let s = AdministeredSchedule::jakarta_2022();
        let err = s.price_for(FuelGrade::Dexlite, p(12, 2021)).unwrap_err();
        assert!(err.to_string().contains("dexlite"));
        assert!(err.to_string().contains("2021-12"));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let err = AdministeredSchedule::new(vec![AdministeredPrice {
            effective_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            grade: FuelGrade::Pertamax,
            price: Decimal::ZERO,
        }])
        .unwrap_err();
        assert!(matches!(err, FuelSubsidyError::InvalidInput { .. }));
    }
}
