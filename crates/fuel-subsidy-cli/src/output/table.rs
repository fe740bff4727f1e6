use colored::Colorize;
use serde_json::Value;
use std::io::{self, Write};
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_table(&mut out, value)?;
    out.flush()
}

pub fn write_table<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    match value {
        Value::Object(map) => {
            // Check if "result" key holds the primary data
            if let Some(result) = map.get("result") {
                write_result_table(out, result, map)
            } else {
                write_flat_object(out, value)
            }
        }
        Value::Array(arr) => write_array_table(out, arr),
        _ => writeln!(out, "{}", value),
    }
}

fn write_result_table<W: Write>(
    out: &mut W,
    result: &Value,
    envelope: &serde_json::Map<String, Value>,
) -> io::Result<()> {
    match result {
        Value::Object(res_map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in res_map {
                builder.push_record([key.as_str(), &format_value(val)]);
            }
            writeln!(out, "{}", Table::from(builder))?;
        }
        // Price rows, subsidy records and scenario summaries
        Value::Array(rows) => write_array_table(out, rows)?,
        _ => write_flat_object(out, &Value::Object(envelope.clone()))?,
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            writeln!(out, "\n{}", "Warnings:".yellow().bold())?;
            for w in warnings.iter().filter_map(Value::as_str) {
                writeln!(out, "  - {}", w)?;
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        writeln!(out, "\nMethodology: {}", meth)?;
    }
    Ok(())
}

fn write_flat_object<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        writeln!(out, "{}", Table::from(builder))?;
    }
    Ok(())
}

fn write_array_table<W: Write>(out: &mut W, arr: &[Value]) -> io::Result<()> {
    if arr.is_empty() {
        return writeln!(out, "(empty)");
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        writeln!(out, "{}", Table::from(builder))
    } else {
        for item in arr {
            writeln!(out, "{}", format_value(item))?;
        }
        Ok(())
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
