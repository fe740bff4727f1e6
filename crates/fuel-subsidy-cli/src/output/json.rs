use serde_json::Value;
use std::io::{self, Write};

/// JSON to stdout: pretty on a terminal, one line when piped.
pub fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = if atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", rendered)?;
    out.flush()?;
    Ok(())
}
