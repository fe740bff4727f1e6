pub mod aggregation;
pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "pricing")]
pub mod pricing;

#[cfg(feature = "subsidy")]
pub mod subsidy;

#[cfg(feature = "benchmark")]
pub mod benchmark;

pub use error::FuelSubsidyError;
pub use types::*;

/// Standard result type for all fuel-subsidy operations
pub type FuelSubsidyResult<T> = Result<T, FuelSubsidyError>;
