use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fuel_subsidy_core::subsidy::budget::{reconcile_budget, BudgetInput};
use fuel_subsidy_core::Bounds;

use crate::input;

/// Arguments for the budget reconciliation
#[derive(Args)]
pub struct BudgetArgs {
    /// Path to JSON budget input; the 2022 state budget if omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Minimum estimated fuel subsidy (IDR billion)
    #[arg(long, requires = "estimate_max")]
    pub estimate_min: Option<Decimal>,

    /// Maximum estimated fuel subsidy (IDR billion)
    #[arg(long, requires = "estimate_min")]
    pub estimate_max: Option<Decimal>,
}

pub fn run_budget(args: BudgetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut budget: BudgetInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        BudgetInput::apbn_2022()
    };

    if let (Some(min), Some(max)) = (args.estimate_min, args.estimate_max) {
        budget.estimated_fuel_subsidy = Some(Bounds { min, max });
    }

    let result = reconcile_budget(&budget)?;
    Ok(serde_json::to_value(result)?)
}
