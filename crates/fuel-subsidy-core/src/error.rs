use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FuelSubsidyError {
    #[error("Invalid date: {day:02}-{month:02}-{year} is not a calendar date")]
    InvalidDate { day: u32, month: u32, year: i32 },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing data: no value for {variable} in period {period}")]
    MissingPeriodData { variable: String, period: String },

    #[error("Consumption shares for year {year} sum to {sum}, expected 1 within {tolerance}")]
    ShareSumViolation {
        year: i32,
        sum: Decimal,
        tolerance: Decimal,
    },

    #[error("Non-positive {bound} price for {grade} in {period}: {price}")]
    NegativeRetailPrice {
        grade: String,
        period: String,
        bound: String,
        price: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FuelSubsidyError {
    fn from(e: serde_json::Error) -> Self {
        FuelSubsidyError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for FuelSubsidyError {
    fn from(e: toml::de::Error) -> Self {
        FuelSubsidyError::Config(e.to_string())
    }
}
