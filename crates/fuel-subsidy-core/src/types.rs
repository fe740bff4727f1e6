use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FuelSubsidyError;

/// Rupiah amounts (per litre unless stated). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.11 = 11%). Never as percentages.
pub type Rate = Decimal;

/// Volumes in litres
pub type Volume = Decimal;

// ---------------------------------------------------------------------------
// Periods and observations
// ---------------------------------------------------------------------------

/// The statutory (month, year) to which an observation contributes.
///
/// Ordered chronologically (year first). Serialised as `"YYYY-MM"` so it can
/// key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferencePeriod {
    year: i32,
    month: u32,
}

impl ReferencePeriod {
    /// Years representable as calendar dates.
    pub fn year_range() -> std::ops::RangeInclusive<i32> {
        NaiveDate::MIN.year()..=NaiveDate::MAX.year()
    }

    pub fn new(month: u32, year: i32) -> Result<Self, FuelSubsidyError> {
        if !(1..=12).contains(&month) {
            return Err(FuelSubsidyError::InvalidInput {
                field: "ref_month".into(),
                reason: format!("Month {month} is outside 1..=12"),
            });
        }
        if !Self::year_range().contains(&year) {
            return Err(FuelSubsidyError::InvalidInput {
                field: "ref_year".into(),
                reason: format!("Year {year} is outside the calendar date range"),
            });
        }
        Ok(Self { year, month })
    }

    pub fn january(year: i32) -> Self {
        Self { year, month: 1 }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Period `n` months later, carrying into the following years.
    pub fn plus_months(&self, n: u32) -> Self {
        let zero_based = u64::from(self.month - 1) + u64::from(n);
        Self {
            year: self.year.saturating_add((zero_based / 12) as i32),
            month: (zero_based % 12) as u32 + 1,
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is validated on construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Every month of `year`, January through December.
    pub fn calendar_year(year: i32) -> Vec<Self> {
        (1..=12).map(|month| Self { year, month }).collect()
    }

    /// Inclusive range of periods from `start` to `end`.
    pub fn range(start: Self, end: Self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut current = start;
        while current <= end {
            out.push(current);
            current = current.plus_months(1);
        }
        out
    }
}

impl fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<ReferencePeriod> for String {
    fn from(p: ReferencePeriod) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for ReferencePeriod {
    type Error = FuelSubsidyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let invalid = || FuelSubsidyError::InvalidInput {
            field: "period".into(),
            reason: format!("'{s}' is not a YYYY-MM period"),
        };
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        ReferencePeriod::new(month, year)
    }
}

/// A single dated observation of one variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

// ---------------------------------------------------------------------------
// Commodities
// ---------------------------------------------------------------------------

/// MOPS benchmark products feeding the base price formula (USD/bbl).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Commodity {
    #[serde(rename = "mogas_92")]
    Mogas92,
    #[serde(rename = "mogas_95")]
    Mogas95,
    #[serde(rename = "gasoil_10")]
    Gasoil10,
    #[serde(rename = "gasoil_500")]
    Gasoil500,
}

impl Commodity {
    pub const ALL: [Commodity; 4] = [
        Commodity::Mogas92,
        Commodity::Mogas95,
        Commodity::Gasoil10,
        Commodity::Gasoil500,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Commodity::Mogas92 => "mogas_92",
            Commodity::Mogas95 => "mogas_95",
            Commodity::Gasoil10 => "gasoil_10",
            Commodity::Gasoil500 => "gasoil_500",
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of commodity prices, either a spot day or a futures contract month.
/// A product without a quote on that row is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CommodityPrices {
    pub mogas_92: Option<Decimal>,
    pub mogas_95: Option<Decimal>,
    pub gasoil_10: Option<Decimal>,
    pub gasoil_500: Option<Decimal>,
}

impl CommodityPrices {
    pub fn get(&self, commodity: Commodity) -> Option<Decimal> {
        match commodity {
            Commodity::Mogas92 => self.mogas_92,
            Commodity::Mogas95 => self.mogas_95,
            Commodity::Gasoil10 => self.gasoil_10,
            Commodity::Gasoil500 => self.gasoil_500,
        }
    }
}

// ---------------------------------------------------------------------------
// Fuel grades
// ---------------------------------------------------------------------------

/// Retail fuel grades covered by the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelGrade {
    /// RON 90
    Pertalite,
    /// RON 92
    Pertamax,
    /// RON 98
    Turbo,
    /// Gasoil CN 53, 50 ppm sulphur
    Pertadex,
    /// Gasoil CN 51, 500 ppm sulphur
    Dexlite,
    /// Biodiesel blend, CN 48
    Biosolar,
}

impl FuelGrade {
    pub const ALL: [FuelGrade; 6] = [
        FuelGrade::Pertalite,
        FuelGrade::Pertamax,
        FuelGrade::Turbo,
        FuelGrade::Pertadex,
        FuelGrade::Dexlite,
        FuelGrade::Biosolar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelGrade::Pertalite => "pertalite",
            FuelGrade::Pertamax => "pertamax",
            FuelGrade::Turbo => "turbo",
            FuelGrade::Pertadex => "pertadex",
            FuelGrade::Dexlite => "dexlite",
            FuelGrade::Biosolar => "biosolar",
        }
    }
}

impl fmt::Display for FuelGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FuelGrade {
    type Err = FuelSubsidyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FuelGrade::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FuelSubsidyError::InvalidInput {
                field: "grade".into(),
                reason: format!("Unknown fuel grade '{s}'"),
            })
    }
}

/// One value per fuel grade. Replaces string-keyed column lookups.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GradeMap<T> {
    pub pertalite: T,
    pub pertamax: T,
    pub turbo: T,
    pub pertadex: T,
    pub dexlite: T,
    pub biosolar: T,
}

impl<T> GradeMap<T> {
    pub fn from_fn(mut f: impl FnMut(FuelGrade) -> T) -> Self {
        Self {
            pertalite: f(FuelGrade::Pertalite),
            pertamax: f(FuelGrade::Pertamax),
            turbo: f(FuelGrade::Turbo),
            pertadex: f(FuelGrade::Pertadex),
            dexlite: f(FuelGrade::Dexlite),
            biosolar: f(FuelGrade::Biosolar),
        }
    }

    /// Fallible construction; stops at the first grade that fails.
    pub fn try_from_fn<E>(mut f: impl FnMut(FuelGrade) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            pertalite: f(FuelGrade::Pertalite)?,
            pertamax: f(FuelGrade::Pertamax)?,
            turbo: f(FuelGrade::Turbo)?,
            pertadex: f(FuelGrade::Pertadex)?,
            dexlite: f(FuelGrade::Dexlite)?,
            biosolar: f(FuelGrade::Biosolar)?,
        })
    }

    pub fn get(&self, grade: FuelGrade) -> &T {
        match grade {
            FuelGrade::Pertalite => &self.pertalite,
            FuelGrade::Pertamax => &self.pertamax,
            FuelGrade::Turbo => &self.turbo,
            FuelGrade::Pertadex => &self.pertadex,
            FuelGrade::Dexlite => &self.dexlite,
            FuelGrade::Biosolar => &self.biosolar,
        }
    }

    pub fn get_mut(&mut self, grade: FuelGrade) -> &mut T {
        match grade {
            FuelGrade::Pertalite => &mut self.pertalite,
            FuelGrade::Pertamax => &mut self.pertamax,
            FuelGrade::Turbo => &mut self.turbo,
            FuelGrade::Pertadex => &mut self.pertadex,
            FuelGrade::Dexlite => &mut self.dexlite,
            FuelGrade::Biosolar => &mut self.biosolar,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FuelGrade, &T)> {
        FuelGrade::ALL.into_iter().map(move |g| (g, self.get(g)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(FuelGrade, &T) -> U) -> GradeMap<U> {
        GradeMap::from_fn(|g| f(g, self.get(g)))
    }
}

/// A statutory min/max pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds<T = Money> {
    pub min: T,
    pub max: T,
}

impl<T: Copy> Bounds<T> {
    pub fn map<U>(&self, mut f: impl FnMut(T) -> U) -> Bounds<U> {
        Bounds {
            min: f(self.min),
            max: f(self.max),
        }
    }
}

impl Bounds<Money> {
    pub const ZERO: Bounds<Money> = Bounds {
        min: Decimal::ZERO,
        max: Decimal::ZERO,
    };
}

impl std::ops::Add for Bounds<Money> {
    type Output = Bounds<Money>;

    fn add(self, rhs: Self) -> Self::Output {
        Bounds {
            min: self.min + rhs.min,
            max: self.max + rhs.max,
        }
    }
}

impl std::ops::AddAssign for Bounds<Money> {
    fn add_assign(&mut self, rhs: Self) {
        self.min += rhs.min;
        self.max += rhs.max;
    }
}

// ---------------------------------------------------------------------------
// Output envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
