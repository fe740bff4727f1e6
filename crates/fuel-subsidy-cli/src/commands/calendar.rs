use chrono::{Datelike, NaiveDate};
use clap::Args;
use serde_json::Value;
use std::time::Instant;

use fuel_subsidy_core::calendar::reference_month::{
    matching_rule, resolve, resolve_futures_month, WINDOW_START_DAY,
};
use fuel_subsidy_core::with_metadata;

/// Arguments for reference-month resolution
#[derive(Args)]
pub struct ReferenceMonthArgs {
    /// Observation date (YYYY-MM-DD)
    #[arg(long, conflicts_with_all = ["day", "month", "year"])]
    pub date: Option<NaiveDate>,

    /// Day of month
    #[arg(long, requires_all = ["month", "year"])]
    pub day: Option<u32>,

    /// Month (1-12)
    #[arg(long)]
    pub month: Option<u32>,

    /// Four-digit year
    #[arg(long)]
    pub year: Option<i32>,

    /// Treat the month as a futures contract month instead of an observation date
    #[arg(long)]
    pub futures: bool,
}

pub fn run_reference_month(args: ReferenceMonthArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let (day, month, year) = match args.date {
        Some(d) => (d.day(), d.month(), d.year()),
        None => (
            args.day.unwrap_or(1),
            args.month.ok_or("--month is required (or provide --date)")?,
            args.year.ok_or("--year is required (or provide --date)")?,
        ),
    };

    let (period, rule) = if args.futures {
        (resolve_futures_month(month, year)?, "futures_contract")
    } else {
        let period = resolve(day, month, year)?;
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or("date was validated by resolve")?;
        (period, matching_rule(date))
    };

    let result = serde_json::json!({
        "reference_period": period.to_string(),
        "ref_month": period.month(),
        "ref_year": period.year(),
        "rule": rule,
    });

    let output = with_metadata(
        "Window for reference month X runs from the 25th of X-2 to the 24th of X-1",
        &serde_json::json!({
            "day": day,
            "month": month,
            "year": year,
            "window_start_day": WINDOW_START_DAY,
            "futures": args.futures,
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
