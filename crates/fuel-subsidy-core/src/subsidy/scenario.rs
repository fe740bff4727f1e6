use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::aggregation::monthly::{build_monthly_market_data, MarketDataInput};
use crate::config::FormulaConfig;
use crate::error::FuelSubsidyError;
use crate::pricing::price_table::{build_price_table, PriceTable};
use crate::subsidy::administered::{AdministeredPrice, AdministeredSchedule};
use crate::subsidy::budget::{reconcile_budget, BudgetInput, BudgetReconciliation};
use crate::subsidy::consumption::{estimate_shares, HistoricalConsumptionRow, ShareEstimate};
use crate::subsidy::engine::{compute_subsidy, SubsidyReport};
use crate::types::{
    with_metadata, Bounds, ComputationOutput, FuelGrade, GradeMap, Rate, ReferencePeriod, Volume,
};
use crate::FuelSubsidyResult;

fn default_depreciation() -> Rate {
    dec!(0.05)
}

/// Everything needed to run the baseline and depreciation scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Calendar year priced; the horizon is its twelve reference months.
    pub year: i32,
    pub market: MarketDataInput,
    pub consumption: Vec<HistoricalConsumptionRow>,
    /// Administered prices; the 2022 Jakarta schedule when omitted.
    #[serde(default)]
    pub schedule: Option<Vec<AdministeredPrice>>,
    /// Rupiah depreciation applied to the end-of-year FX projection in the
    /// second scenario. Observed rates are kept as they are.
    #[serde(default = "default_depreciation")]
    pub depreciation: Rate,
    #[serde(default)]
    pub budget: Option<BudgetInput>,
}

/// Prices and subsidy under one FX path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub eoy_usdidr: Decimal,
    pub prices: PriceTable,
    pub subsidy: SubsidyReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeAmount {
    pub grade: FuelGrade,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub year: i32,
    pub shares: ShareEstimate,
    pub annual_consumption: Volume,
    pub monthly_consumption: Volume,
    pub baseline: ScenarioResult,
    pub depreciated: ScenarioResult,
    /// Additional subsidy caused by the depreciation.
    pub depreciation_cost: Bounds,
    /// Baseline grade totals, ascending, on the min and max bound.
    pub breakdown_min: Vec<GradeAmount>,
    pub breakdown_max: Vec<GradeAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetReconciliation>,
}

/// Price the horizon and estimate subsidy for one market data set.
#[allow(clippy::too_many_arguments)]
pub fn run_scenario(
    name: &str,
    market: &MarketDataInput,
    horizon: &[ReferencePeriod],
    config: &FormulaConfig,
    schedule: &AdministeredSchedule,
    shares: &GradeMap<Rate>,
    monthly_consumption: Volume,
    warnings: &mut Vec<String>,
) -> FuelSubsidyResult<ScenarioResult> {
    let monthly = build_monthly_market_data(market, horizon, &config.pricing)?;
    warnings.extend(monthly.warnings.iter().map(|w| format!("[{name}] {w}")));

    let prices = build_price_table(&monthly.result, horizon, config)?;
    warnings.extend(prices.warnings.iter().map(|w| format!("[{name}] {w}")));

    let subsidy = compute_subsidy(
        &prices.result,
        schedule,
        shares,
        monthly_consumption,
        &config.subsidy,
    )?;
    info!(scenario = name, min = %subsidy.total.min, max = %subsidy.total.max, "scenario complete");

    Ok(ScenarioResult {
        name: name.to_string(),
        eoy_usdidr: config.pricing.eoy_usdidr,
        prices: prices.result,
        subsidy,
    })
}

/// Run the baseline and depreciated-Rupiah scenarios through identical logic.
pub fn compare_scenarios(
    input: &ScenarioInput,
    config: &FormulaConfig,
) -> FuelSubsidyResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    config.validate()?;
    if input.depreciation <= dec!(-1) {
        return Err(FuelSubsidyError::InvalidInput {
            field: "depreciation".into(),
            reason: "Depreciation must be greater than -100%".into(),
        });
    }

    ReferencePeriod::new(1, input.year)?;
    let horizon = ReferencePeriod::calendar_year(input.year);

    let shares = estimate_shares(&input.consumption, &config.subsidy)?;
    warnings.extend(shares.warnings.iter().cloned());
    let annual_consumption = config.subsidy.projection.annual_volume(input.year)?;
    let monthly_consumption = config.subsidy.projection.monthly_volume(input.year)?;

    let schedule = match &input.schedule {
        Some(entries) => AdministeredSchedule::new(entries.clone())?,
        None => AdministeredSchedule::jakarta_2022(),
    };

    let baseline = run_scenario(
        "baseline",
        &input.market,
        &horizon,
        config,
        &schedule,
        &shares.result.average,
        monthly_consumption,
        &mut warnings,
    )?;

    let factor = Decimal::ONE + input.depreciation;
    let mut depreciated_config = config.clone();
    depreciated_config.pricing.eoy_usdidr = config.pricing.eoy_usdidr * factor;
    let depreciated = run_scenario(
        "depreciation",
        &input.market,
        &horizon,
        &depreciated_config,
        &schedule,
        &shares.result.average,
        monthly_consumption,
        &mut warnings,
    )?;

    let depreciation_cost = Bounds {
        min: depreciated.subsidy.total.min - baseline.subsidy.total.min,
        max: depreciated.subsidy.total.max - baseline.subsidy.total.max,
    };

    let to_amounts = |v: Vec<(FuelGrade, Decimal)>| {
        v.into_iter()
            .map(|(grade, amount)| GradeAmount { grade, amount })
            .collect::<Vec<_>>()
    };
    let breakdown_min = to_amounts(baseline.subsidy.breakdown(|b| b.min));
    let breakdown_max = to_amounts(baseline.subsidy.breakdown(|b| b.max));

    let budget = match &input.budget {
        Some(b) => {
            let mut b = b.clone();
            b.estimated_fuel_subsidy = Some(baseline.subsidy.total);
            let rec = reconcile_budget(&b)?;
            warnings.extend(rec.warnings.iter().cloned());
            Some(rec.result)
        }
        None => None,
    };

    let output = ScenarioComparison {
        year: input.year,
        shares: shares.result,
        annual_consumption,
        monthly_consumption,
        baseline,
        depreciated,
        depreciation_cost,
        breakdown_min,
        breakdown_max,
        budget,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Formula retail price vs administered price under baseline and depreciated USD/IDR",
        &serde_json::json!({
            "year": input.year,
            "depreciation": input.depreciation.to_string(),
            "eoy_usdidr_baseline": config.pricing.eoy_usdidr.to_string(),
            "eoy_usdidr_depreciated": depreciated_config.pricing.eoy_usdidr.to_string(),
            "scale_factor": config.subsidy.scale_factor.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
