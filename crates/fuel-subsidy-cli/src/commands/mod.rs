pub mod benchmark;
pub mod budget;
pub mod calendar;
pub mod pricing;
pub mod subsidy;

use serde::Serialize;
use serde_json::Value;

use fuel_subsidy_core::ComputationOutput;

/// Serialise an envelope with its `result` replaced by a flattened view.
pub(crate) fn with_view<T: Serialize>(
    output: &ComputationOutput<T>,
    view: Value,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut value = serde_json::to_value(output)?;
    if let Value::Object(map) = &mut value {
        map.insert("result".to_string(), view);
    }
    Ok(value)
}
