pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use colored::Colorize;
use serde_json::Value;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
///
/// CSV and minimal output drop the envelope, so its warnings go to stderr.
pub fn format_output(format: &OutputFormat, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => json::print_json(value)?,
        OutputFormat::Table => table::print_table(value)?,
        OutputFormat::Csv => {
            csv_out::print_csv(value)?;
            print_warnings(value);
        }
        OutputFormat::Minimal => {
            minimal::print_minimal(value)?;
            print_warnings(value);
        }
    }
    Ok(())
}

fn print_warnings(value: &Value) {
    let warnings = value
        .get("warnings")
        .and_then(Value::as_array)
        .map(|w| w.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();
    for w in warnings {
        eprintln!("{}: {}", "warning".yellow().bold(), w);
    }
}
