use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use fuel_subsidy_core::aggregation::monthly::{build_monthly_market_data, MarketDataInput};
use fuel_subsidy_core::config::FormulaConfig;
use fuel_subsidy_core::pricing::formula::{quote_grade, GradeQuoteInput};
use fuel_subsidy_core::pricing::price_table::build_price_table;
use fuel_subsidy_core::{FuelGrade, ReferencePeriod};

use crate::commands::with_view;
use crate::input;

/// Arguments for a single-grade price quote
#[derive(Args)]
pub struct QuoteArgs {
    /// Fuel grade (pertalite, pertamax, turbo, pertadex, dexlite, biosolar)
    #[arg(long)]
    pub grade: Option<FuelGrade>,

    /// MOPS price of the grade's reference product (USD/bbl)
    #[arg(long, alias = "mops")]
    pub commodity_price: Option<Decimal>,

    /// USD/IDR exchange rate
    #[arg(long)]
    pub usdidr: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Which price table `prices` prints
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriceView {
    Retail,
    Base,
    Full,
}

/// Shared market data sources: a JSON document or three CSV files
#[derive(Args)]
pub struct MarketArgs {
    /// Daily USD/IDR CSV (date,usdidr)
    #[arg(long)]
    pub fx: Option<String>,

    /// Daily MOPS CSV (date,mogas_92,mogas_95,gasoil_10,gasoil_500)
    #[arg(long)]
    pub spot: Option<String>,

    /// Futures CSV keyed by contract month (month,mogas_92,...)
    #[arg(long)]
    pub futures: Option<String>,
}

impl MarketArgs {
    pub fn load(&self) -> Result<MarketDataInput, Box<dyn std::error::Error>> {
        let spot_path = self
            .spot
            .as_deref()
            .ok_or("--spot is required (or provide --input)")?;
        Ok(MarketDataInput {
            fx: input::csv_in::read_csv_opt(self.fx.as_deref())?,
            spot: input::csv_in::read_csv(spot_path)?,
            futures: input::csv_in::read_csv_opt(self.futures.as_deref())?,
        })
    }
}

/// Arguments for the monthly price table
#[derive(Args)]
pub struct PricesArgs {
    /// Calendar year to price
    #[arg(long)]
    pub year: Option<i32>,

    #[command(flatten)]
    pub market: MarketArgs,

    /// Path to JSON input file with year and market data
    #[arg(long)]
    pub input: Option<String>,

    /// Table to print
    #[arg(long, value_enum, default_value = "retail")]
    pub view: PriceView,
}

#[derive(Deserialize)]
struct PricesInput {
    year: i32,
    #[serde(flatten)]
    market: MarketDataInput,
}

pub fn run_quote(args: QuoteArgs, config: &FormulaConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let quote_input: GradeQuoteInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        GradeQuoteInput {
            grade: args.grade.ok_or("--grade is required (or provide --input)")?,
            commodity_price: args
                .commodity_price
                .ok_or("--commodity-price is required (or provide --input)")?,
            usdidr: args.usdidr.ok_or("--usdidr is required (or provide --input)")?,
        }
    };
    let result = quote_grade(&quote_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_prices(args: PricesArgs, config: &FormulaConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let prices_input: PricesInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.market.spot.is_none() {
        input::stdin::read_stdin()?.ok_or("--spot is required (or provide --input)")?
    } else {
        PricesInput {
            year: args.year.ok_or("--year is required (or provide --input)")?,
            market: args.market.load()?,
        }
    };

    let horizon = ReferencePeriod::calendar_year(prices_input.year);
    let monthly = build_monthly_market_data(&prices_input.market, &horizon, &config.pricing)?;
    let mut table = build_price_table(&monthly.result, &horizon, config)?;

    let mut warnings = monthly.warnings;
    warnings.append(&mut table.warnings);
    table.warnings = warnings;

    let view = match args.view {
        PriceView::Retail => serde_json::to_value(table.result.retail_rows())?,
        PriceView::Base => serde_json::to_value(table.result.base_rows())?,
        PriceView::Full => return Ok(serde_json::to_value(&table)?),
    };
    with_view(&table, view)
}
