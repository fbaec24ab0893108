//! Error types for the forecast and valuation pipeline.

use crate::scenarios::Scenario;
use thiserror::Error;

/// Result type for valuation operations.
pub type Result<T> = std::result::Result<T, MemoError>;

/// Errors that can occur while building drivers, forecasts, or valuations.
#[derive(Debug, Error)]
pub enum MemoError {
    /// Invalid scenario or forecast configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Empty, insufficient, or inconsistent historical data
    #[error("Data error: {0}")]
    Data(String),

    /// Missing required column in the canonical table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Column present with the wrong data type
    #[error("Column '{column}' must be {expected}, found {found}")]
    InvalidColumnType {
        /// Column name
        column: String,
        /// Expected data type
        expected: String,
        /// Data type found in the table
        found: String,
    },

    /// Discount rate does not exceed terminal growth
    #[error(
        "Numerical degeneracy: discount rate {discount_rate} must exceed terminal growth {terminal_growth}"
    )]
    NumericalDegeneracy {
        /// Discount rate (WACC)
        discount_rate: f64,
        /// Perpetuity growth rate
        terminal_growth: f64,
    },

    /// Failure inside a single named scenario
    #[error("Scenario '{scenario}' failed: {source}")]
    Scenario {
        /// Scenario that failed
        scenario: Scenario,
        /// Underlying error
        #[source]
        source: Box<MemoError>,
    },

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MemoError {
    /// Tag an error with the scenario it occurred in.
    pub fn in_scenario(self, scenario: Scenario) -> Self {
        Self::Scenario {
            scenario,
            source: Box::new(self),
        }
    }
}
