use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fuel_subsidy_core::config::FormulaConfig;
use fuel_subsidy_core::subsidy::budget::BudgetInput;
use fuel_subsidy_core::subsidy::engine::{estimate_subsidy, SubsidyInput, SubsidyReport};
use fuel_subsidy_core::subsidy::scenario::{compare_scenarios, ScenarioInput};

use crate::commands::pricing::MarketArgs;
use crate::commands::with_view;
use crate::input;

/// Which part of a subsidy report to print
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SubsidyView {
    /// Per-grade totals plus the grand total
    Summary,
    /// One row per month and grade
    Records,
    /// The complete report
    Full,
}

/// Arguments for a standalone subsidy estimate
#[derive(Args)]
pub struct SubsidyArgs {
    /// Path to JSON input file (price table, schedule, shares, consumption)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, value_enum, default_value = "summary")]
    pub view: SubsidyView,
}

/// Which part of the scenario comparison to print
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScenarioView {
    /// Baseline, depreciated and difference totals
    Summary,
    /// Monthly totals of both scenarios
    Monthly,
    /// Baseline grade totals sorted ascending
    Breakdown,
    Full,
}

/// Arguments for the baseline vs depreciation comparison
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to JSON input file (overrides CSV flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Calendar year to estimate
    #[arg(long)]
    pub year: Option<i32>,

    #[command(flatten)]
    pub market: MarketArgs,

    /// Historical consumption CSV (year,RON88,RON90,...)
    #[arg(long)]
    pub consumption: Option<String>,

    /// Administered price CSV (effective_date,grade,price); 2022 Jakarta prices if omitted
    #[arg(long)]
    pub schedule: Option<String>,

    /// Rupiah depreciation for the second scenario (e.g. 0.05 for 5%)
    #[arg(long, default_value = "0.05")]
    pub depreciation: Decimal,

    /// Reconcile the baseline total with the 2022 state budget
    #[arg(long)]
    pub with_budget: bool,

    #[arg(long, value_enum, default_value = "summary")]
    pub view: ScenarioView,
}

pub fn run_subsidy(args: SubsidyArgs, config: &FormulaConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let subsidy_input: SubsidyInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        input::stdin::read_stdin()?.ok_or("--input is required (or pipe JSON on stdin)")?
    };

    let output = estimate_subsidy(&subsidy_input, &config.subsidy)?;
    match args.view {
        SubsidyView::Summary => with_view(&output, grade_summary(&output.result)),
        SubsidyView::Records => with_view(&output, record_rows(&output.result)),
        SubsidyView::Full => Ok(serde_json::to_value(output)?),
    }
}

pub fn run_scenario(args: ScenarioArgs, config: &FormulaConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario_input: ScenarioInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.market.spot.is_none() {
        input::stdin::read_stdin()?.ok_or("--spot is required (or provide --input)")?
    } else {
        let consumption_path = args
            .consumption
            .as_deref()
            .ok_or("--consumption is required (or provide --input)")?;
        ScenarioInput {
            year: args.year.ok_or("--year is required (or provide --input)")?,
            market: args.market.load()?,
            consumption: input::csv_in::read_csv(consumption_path)?,
            schedule: match args.schedule.as_deref() {
                Some(p) => Some(input::csv_in::read_csv(p)?),
                None => None,
            },
            depreciation: args.depreciation,
            budget: args.with_budget.then(BudgetInput::apbn_2022),
        }
    };

    let output = compare_scenarios(&scenario_input, config)?;
    let r = &output.result;

    let view = match args.view {
        ScenarioView::Full => return Ok(serde_json::to_value(&output)?),
        ScenarioView::Summary => {
            let mut rows = vec![
                json!({
                    "scenario": r.baseline.name,
                    "eoy_usdidr": r.baseline.eoy_usdidr,
                    "total_min": r.baseline.subsidy.total.min,
                    "total_max": r.baseline.subsidy.total.max,
                }),
                json!({
                    "scenario": r.depreciated.name,
                    "eoy_usdidr": r.depreciated.eoy_usdidr,
                    "total_min": r.depreciated.subsidy.total.min,
                    "total_max": r.depreciated.subsidy.total.max,
                }),
                json!({
                    "scenario": "difference",
                    "eoy_usdidr": r.depreciated.eoy_usdidr - r.baseline.eoy_usdidr,
                    "total_min": r.depreciation_cost.min,
                    "total_max": r.depreciation_cost.max,
                }),
            ];
            if let Some(b) = &r.budget {
                if let Some(implied) = b.implied_energy_subsidy {
                    rows.push(json!({
                        "scenario": "implied_energy_subsidy",
                        "eoy_usdidr": r.baseline.eoy_usdidr,
                        "total_min": implied.min,
                        "total_max": implied.max,
                    }));
                }
            }
            Value::Array(rows)
        }
        ScenarioView::Monthly => Value::Array(
            r.baseline
                .subsidy
                .by_month
                .iter()
                .zip(r.depreciated.subsidy.by_month.iter())
                .map(|(b, d)| {
                    json!({
                        "month": b.month,
                        "baseline_min": b.total.min,
                        "baseline_max": b.total.max,
                        "depreciated_min": d.total.min,
                        "depreciated_max": d.total.max,
                    })
                })
                .collect(),
        ),
        ScenarioView::Breakdown => Value::Array(
            r.breakdown_max
                .iter()
                .map(|g| {
                    json!({
                        "grade": g.grade,
                        "min": r.baseline.subsidy.by_grade.get(g.grade).min,
                        "max": g.amount,
                    })
                })
                .collect(),
        ),
    };
    with_view(&output, view)
}

fn grade_summary(report: &SubsidyReport) -> Value {
    let mut rows: Vec<Value> = report
        .by_grade
        .iter()
        .map(|(grade, b)| json!({ "grade": grade, "min": b.min, "max": b.max }))
        .collect();
    rows.push(json!({ "grade": "total", "min": report.total.min, "max": report.total.max }));
    Value::Array(rows)
}

fn record_rows(report: &SubsidyReport) -> Value {
    Value::Array(
        report
            .records
            .iter()
            .map(|r| {
                json!({
                    "month": r.month,
                    "grade": r.grade,
                    "administered": r.administered_price,
                    "retail_min": r.retail_price.min,
                    "retail_max": r.retail_price.max,
                    "unit_min": r.unit_subsidy.min,
                    "unit_max": r.unit_subsidy.max,
                    "consumption": r.consumption,
                    "total_min": r.total_subsidy.min,
                    "total_max": r.total_subsidy.max,
                })
            })
            .collect(),
    )
}
