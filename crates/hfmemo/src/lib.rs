#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hfmemo/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod drivers;
pub mod error;
pub mod forecast;
pub mod scenarios;
pub mod schema;
pub mod valuation;

// Re-export core types
pub use config::{ForecastConfig, MarginSpec, RateSpec, ScenarioConfig, load_config};
pub use drivers::{BalanceInputs, HistoricalDrivers, extract_drivers};
pub use error::{MemoError, Result};
pub use forecast::{
    CFO_TO_OPERATING_INCOME, CashFlowBridge, ForecastEngine, ForecastRow, ForecastSeries,
    OperatingIncomeMultiple, project,
};
pub use scenarios::{Scenario, ScenarioResult, ScenarioResults, ScenarioRunner, run_all};
pub use schema::{LineItem, StandardizedFact, StatementType, facts_to_frame, validate_standard_frame};
pub use valuation::{DcfResult, EquityResult, FcffSeries, dcf, equity_value, fcff};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
