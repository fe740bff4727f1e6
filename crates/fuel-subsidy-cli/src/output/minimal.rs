use serde_json::Value;
use std::io::{self, Write};

/// Fields that answer each command, in order of preference.
const PRIORITY_KEYS: [&str; 7] = [
    "reference_period",
    "retail",
    "depreciation_cost",
    "implied_energy_subsidy",
    "total_energy_subsidy",
    "total",
    "gasoline_idr_litre",
];

/// Print just the key answer from the output.
///
/// Object results print the first priority field present (else the first
/// field); row results print one tab-separated line per row.
pub fn print_minimal(value: &Value) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let hit = PRIORITY_KEYS
                .iter()
                .find_map(|k| map.get(*k).filter(|v| !v.is_null()));
            match hit {
                Some(val) => writeln!(out, "{}", format_minimal(val))?,
                None => {
                    if let Some((key, val)) = map.iter().next() {
                        writeln!(out, "{}: {}", key, format_minimal(val))?;
                    }
                }
            }
        }
        Value::Array(rows) => {
            for row in rows {
                match row {
                    Value::Object(map) => {
                        let line: Vec<String> = map.values().map(format_minimal).collect();
                        writeln!(out, "{}", line.join("\t"))?;
                    }
                    other => writeln!(out, "{}", format_minimal(other))?,
                }
            }
        }
        other => writeln!(out, "{}", format_minimal(other))?,
    }
    out.flush()
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        // Bounds print as "min..max"
        Value::Object(m) if m.contains_key("min") && m.contains_key("max") => format!(
            "{}..{}",
            m.get("min").map(format_minimal).unwrap_or_default(),
            m.get("max").map(format_minimal).unwrap_or_default()
        ),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
