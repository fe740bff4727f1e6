mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use fuel_subsidy_core::config::FormulaConfig;

use commands::benchmark::UsBenchmarkArgs;
use commands::budget::BudgetArgs;
use commands::calendar::ReferenceMonthArgs;
use commands::pricing::{PricesArgs, QuoteArgs};
use commands::subsidy::{ScenarioArgs, SubsidyArgs};

/// Indonesian fuel price formula and implicit subsidy estimator
#[derive(Parser)]
#[command(
    name = "fsub",
    version,
    about = "Statutory fuel price formula and implicit subsidy estimation",
    long_about = "Computes statutory base and retail fuel prices from MOPS benchmarks and \
                  USD/IDR, compares them with administered pump prices and estimates the \
                  implicit subsidy under baseline and depreciated exchange rates."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// TOML file overriding the statutory constants
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log engine progress to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the reference month an observation date is averaged into
    ReferenceMonth(ReferenceMonthArgs),
    /// Base and retail price bounds for one grade
    Quote(QuoteArgs),
    /// Monthly base and retail price table for a calendar year
    Prices(PricesArgs),
    /// Implicit subsidy from a precomputed price table
    Subsidy(SubsidyArgs),
    /// Baseline vs depreciated-Rupiah subsidy comparison
    Scenario(ScenarioArgs),
    /// Reconcile the subsidy estimate with the state budget
    Budget(BudgetArgs),
    /// Convert US retail gasoline and diesel prices to IDR/litre
    UsBenchmark(UsBenchmarkArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn load_config(path: Option<&str>) -> Result<FormulaConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(FormulaConfig::from_file(p)?),
        None => Ok(FormulaConfig::default()),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ReferenceMonth(args) => commands::calendar::run_reference_month(args),
        Commands::Quote(args) => commands::pricing::run_quote(args, &config),
        Commands::Prices(args) => commands::pricing::run_prices(args, &config),
        Commands::Subsidy(args) => commands::subsidy::run_subsidy(args, &config),
        Commands::Scenario(args) => commands::subsidy::run_scenario(args, &config),
        Commands::Budget(args) => commands::budget::run_budget(args),
        Commands::UsBenchmark(args) => commands::benchmark::run_us_benchmark(args),
        Commands::Version => {
            println!("fsub {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result.and_then(|value| output::format_output(&cli.output, &value)) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
