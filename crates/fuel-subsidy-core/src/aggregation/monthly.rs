use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::calendar::reference_month::{resolve_date, resolve_futures_month};
use crate::config::PricingConfig;
use crate::error::FuelSubsidyError;
use crate::types::{
    with_metadata, Commodity, CommodityPrices, ComputationOutput, ReferencePeriod, TimeSeriesPoint,
};
use crate::FuelSubsidyResult;

/// FX variable name used in error messages and output.
pub const USDIDR: &str = "usdidr";

// ---------------------------------------------------------------------------
// Monthly values
// ---------------------------------------------------------------------------

/// How a monthly value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Mean of historical observations.
    Observed,
    /// Futures estimate for a period with no history.
    Futures,
    /// Configured end-of-year projection, not an average.
    Projected,
}

/// One variable's value for one reference period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyValue {
    pub value: Decimal,
    pub source: ValueSource,
    /// Number of raw points folded into the value (0 for projections).
    pub observations: usize,
}

/// Per-period values of a single variable. Periods without data are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub variable: String,
    pub values: BTreeMap<ReferencePeriod, MonthlyValue>,
}

impl MonthlySeries {
    pub fn empty(variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, period: ReferencePeriod) -> Option<&MonthlyValue> {
        self.values.get(&period)
    }

    /// Value for `period`, or `MissingPeriodData` naming the variable.
    pub fn require(&self, period: ReferencePeriod) -> FuelSubsidyResult<&MonthlyValue> {
        self.values
            .get(&period)
            .ok_or_else(|| FuelSubsidyError::MissingPeriodData {
                variable: self.variable.clone(),
                period: period.to_string(),
            })
    }

    pub fn periods(&self) -> impl Iterator<Item = ReferencePeriod> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Outer join with `futures`; history wins wherever both have a value.
    pub fn merge_futures(&self, futures: &MonthlySeries) -> MonthlySeries {
        let mut merged = self.clone();
        for (period, fut) in &futures.values {
            merged.values.entry(*period).or_insert(MonthlyValue {
                value: fut.value,
                source: ValueSource::Futures,
                observations: fut.observations,
            });
        }
        merged
    }

    /// Give every period of `horizon` lacking a value the projected `value`.
    /// Returns the periods that were filled.
    pub fn fill_projection(
        &mut self,
        horizon: &[ReferencePeriod],
        value: Decimal,
    ) -> Vec<ReferencePeriod> {
        let mut filled = Vec::new();
        for period in horizon {
            if !self.values.contains_key(period) {
                self.values.insert(
                    *period,
                    MonthlyValue {
                        value,
                        source: ValueSource::Projected,
                        observations: 0,
                    },
                );
                filled.push(*period);
            }
        }
        filled
    }
}

/// Group points by reference period and take the arithmetic mean of each group.
pub fn monthly_average(variable: &str, points: &[TimeSeriesPoint]) -> MonthlySeries {
    let mut groups: BTreeMap<ReferencePeriod, (Decimal, usize)> = BTreeMap::new();
    for point in points {
        let entry = groups
            .entry(resolve_date(point.date))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += point.value;
        entry.1 += 1;
    }

    let values = groups
        .into_iter()
        .map(|(period, (sum, n))| {
            (
                period,
                MonthlyValue {
                    value: sum / Decimal::from(n as u64),
                    source: ValueSource::Observed,
                    observations: n,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    debug!(
        variable,
        points = points.len(),
        periods = values.len(),
        "aggregated series to reference months"
    );
    MonthlySeries {
        variable: variable.to_string(),
        values,
    }
}

// ---------------------------------------------------------------------------
// Raw input rows
// ---------------------------------------------------------------------------

/// Daily USD/IDR reference rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FxRow {
    pub date: NaiveDate,
    pub usdidr: Decimal,
}

/// Daily MOPS assessment for the four products (USD/bbl).
///
/// Scraped series are outer-joined on date, so a product may have no quote
/// on a given day. Blank cells and JSON nulls read as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub mogas_92: Option<Decimal>,
    #[serde(default)]
    pub mogas_95: Option<Decimal>,
    #[serde(default)]
    pub gasoil_10: Option<Decimal>,
    #[serde(default)]
    pub gasoil_500: Option<Decimal>,
}

impl SpotRow {
    pub fn prices(&self) -> CommodityPrices {
        CommodityPrices {
            mogas_92: self.mogas_92,
            mogas_95: self.mogas_95,
            gasoil_10: self.gasoil_10,
            gasoil_500: self.gasoil_500,
        }
    }
}

/// Settlement prices of one futures contract month (USD/bbl).
///
/// `month` is the contract's calendar month, not a reference period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuturesRow {
    pub month: ReferencePeriod,
    #[serde(default)]
    pub mogas_92: Option<Decimal>,
    #[serde(default)]
    pub mogas_95: Option<Decimal>,
    #[serde(default)]
    pub gasoil_10: Option<Decimal>,
    #[serde(default)]
    pub gasoil_500: Option<Decimal>,
}

impl FuturesRow {
    pub fn prices(&self) -> CommodityPrices {
        CommodityPrices {
            mogas_92: self.mogas_92,
            mogas_95: self.mogas_95,
            gasoil_10: self.gasoil_10,
            gasoil_500: self.gasoil_500,
        }
    }
}

// ---------------------------------------------------------------------------
// Commodity series
// ---------------------------------------------------------------------------

/// One monthly series per MOPS product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommoditySeries {
    pub mogas_92: MonthlySeries,
    pub mogas_95: MonthlySeries,
    pub gasoil_10: MonthlySeries,
    pub gasoil_500: MonthlySeries,
}

impl CommoditySeries {
    fn from_fn(mut f: impl FnMut(Commodity) -> MonthlySeries) -> Self {
        Self {
            mogas_92: f(Commodity::Mogas92),
            mogas_95: f(Commodity::Mogas95),
            gasoil_10: f(Commodity::Gasoil10),
            gasoil_500: f(Commodity::Gasoil500),
        }
    }

    pub fn get(&self, commodity: Commodity) -> &MonthlySeries {
        match commodity {
            Commodity::Mogas92 => &self.mogas_92,
            Commodity::Mogas95 => &self.mogas_95,
            Commodity::Gasoil10 => &self.gasoil_10,
            Commodity::Gasoil500 => &self.gasoil_500,
        }
    }

    /// Per-product history with futures filling the periods history lacks.
    pub fn merge_futures(&self, futures: &CommoditySeries) -> CommoditySeries {
        CommoditySeries::from_fn(|c| self.get(c).merge_futures(futures.get(c)))
    }
}

/// Monthly averages of the daily spot assessments.
pub fn monthly_commodity_averages(rows: &[SpotRow]) -> CommoditySeries {
    CommoditySeries::from_fn(|commodity| {
        let points: Vec<TimeSeriesPoint> = rows
            .iter()
            .filter_map(|r| {
                r.prices().get(commodity).map(|value| TimeSeriesPoint {
                    date: r.date,
                    value,
                })
            })
            .collect();
        monthly_average(commodity.as_str(), &points)
    })
}

/// Futures prices keyed by the reference period each contract month feeds.
/// Several contracts landing on one period are averaged.
pub fn futures_by_reference_period(rows: &[FuturesRow]) -> FuelSubsidyResult<CommoditySeries> {
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        let period = resolve_futures_month(row.month.month(), row.month.year())?;
        keyed.push((period, row.prices()));
    }

    Ok(CommoditySeries::from_fn(|commodity| {
        let mut groups: BTreeMap<ReferencePeriod, (Decimal, usize)> = BTreeMap::new();
        for (period, prices) in &keyed {
            let Some(price) = prices.get(commodity) else {
                continue;
            };
            let entry = groups.entry(*period).or_insert((Decimal::ZERO, 0));
            entry.0 += price;
            entry.1 += 1;
        }
        MonthlySeries {
            variable: commodity.as_str().to_string(),
            values: groups
                .into_iter()
                .map(|(p, (sum, n))| {
                    (
                        p,
                        MonthlyValue {
                            value: sum / Decimal::from(n as u64),
                            source: ValueSource::Futures,
                            observations: n,
                        },
                    )
                })
                .collect(),
        }
    }))
}

// ---------------------------------------------------------------------------
// Full market data build
// ---------------------------------------------------------------------------

/// Raw market data for one scenario.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketDataInput {
    pub fx: Vec<FxRow>,
    pub spot: Vec<SpotRow>,
    #[serde(default)]
    pub futures: Vec<FuturesRow>,
}

/// Monthly FX and commodity series ready for the price engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyMarketData {
    pub fx: MonthlySeries,
    pub commodities: CommoditySeries,
}

/// Reduce raw market data to one value per reference period.
///
/// Commodity history is completed with futures; FX months in `horizon`
/// without data take the configured end-of-year projection.
pub fn build_monthly_market_data(
    input: &MarketDataInput,
    horizon: &[ReferencePeriod],
    pricing: &PricingConfig,
) -> FuelSubsidyResult<ComputationOutput<MonthlyMarketData>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.fx.is_empty() && horizon.is_empty() {
        return Err(FuelSubsidyError::InsufficientData(
            "FX series is empty and no horizon was given".into(),
        ));
    }
    if let Some(bad) = input.fx.iter().find(|r| r.usdidr <= Decimal::ZERO) {
        return Err(FuelSubsidyError::InvalidInput {
            field: USDIDR.into(),
            reason: format!("Non-positive rate {} on {}", bad.usdidr, bad.date),
        });
    }

    let fx_points: Vec<TimeSeriesPoint> = input
        .fx
        .iter()
        .map(|r| TimeSeriesPoint {
            date: r.date,
            value: r.usdidr,
        })
        .collect();
    let mut fx = monthly_average(USDIDR, &fx_points);
    let projected = fx.fill_projection(horizon, pricing.eoy_usdidr);
    if !projected.is_empty() {
        info!(
            months = projected.len(),
            rate = %pricing.eoy_usdidr,
            "using end-of-year FX projection"
        );
        warnings.push(format!(
            "USD/IDR for {} set to end-of-year projection {}",
            join_periods(&projected),
            pricing.eoy_usdidr
        ));
    }

    let history = monthly_commodity_averages(&input.spot);
    let futures = futures_by_reference_period(&input.futures)?;
    let commodities = history.merge_futures(&futures);

    for commodity in Commodity::ALL {
        let substituted: Vec<ReferencePeriod> = commodities
            .get(commodity)
            .values
            .iter()
            .filter(|(p, v)| v.source == ValueSource::Futures && horizon.contains(*p))
            .map(|(p, _)| *p)
            .collect();
        if !substituted.is_empty() {
            debug!(%commodity, months = substituted.len(), "futures fill history gaps");
            warnings.push(format!(
                "{} for {} taken from futures",
                commodity,
                join_periods(&substituted)
            ));
        }
    }

    let output = MonthlyMarketData { fx, commodities };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reference-month averages of USD/IDR and MOPS (25th of M-2 to 24th of M-1)",
        &serde_json::json!({
            "fx_observations": input.fx.len(),
            "spot_observations": input.spot.len(),
            "futures_contracts": input.futures.len(),
            "eoy_usdidr": pricing.eoy_usdidr.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn join_periods(periods: &[ReferencePeriod]) -> String {
    periods
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
