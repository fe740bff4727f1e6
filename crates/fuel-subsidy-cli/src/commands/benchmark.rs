use clap::Args;
use serde_json::Value;

use fuel_subsidy_core::benchmark::us_retail::{us_benchmark, UsBenchmarkInput};

use crate::input;

/// Arguments for the US retail price cross-check
#[derive(Args)]
pub struct UsBenchmarkArgs {
    /// Weekly US retail CSV (date,gasoline,diesel) in USD/gallon
    #[arg(long)]
    pub retail: Option<String>,

    /// USD/IDR CSV (date,usdidr)
    #[arg(long)]
    pub fx: Option<String>,

    /// Formula price table JSON (from `prices --view full`) to set alongside
    #[arg(long)]
    pub prices: Option<String>,

    /// Path to JSON input file (overrides CSV flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_us_benchmark(args: UsBenchmarkArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bench_input: UsBenchmarkInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        let retail = args
            .retail
            .as_deref()
            .ok_or("--retail is required (or provide --input)")?;
        let fx = args.fx.as_deref().ok_or("--fx is required (or provide --input)")?;
        let prices = match args.prices.as_deref() {
            Some(p) => {
                let envelope: Value = input::file::read_json(p)?;
                // Accept either a bare table or a full `prices` envelope
                let table = envelope.get("result").cloned().unwrap_or(envelope);
                Some(serde_json::from_value(table)?)
            }
            None => None,
        };
        UsBenchmarkInput {
            retail: input::csv_in::read_csv(retail)?,
            fx: input::csv_in::read_csv(fx)?,
            prices,
        }
    };

    let result = us_benchmark(&bench_input)?;
    Ok(serde_json::to_value(result)?)
}
