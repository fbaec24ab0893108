//! Scenario and forecast configuration.
//!
//! Assumptions are validated eagerly: rate bounds and the margin source when a
//! [`ScenarioConfig`] is built, the horizon and list lengths when the three
//! scenarios are combined into a [`ForecastConfig`]. Nothing invalid reaches
//! the forecast or valuation engines.

pub mod forecast;
pub mod loader;
pub mod rate;
pub mod scenario;

pub use forecast::{
    DEFAULT_HORIZON_YEARS, ForecastConfig, MAX_HORIZON_YEARS, MIN_HORIZON_YEARS, RawForecastConfig,
};
pub use loader::{config_from_yaml, load_config};
pub use rate::{MarginSpec, RateFn, RateSpec};
pub use scenario::{
    DISCOUNT_RATE_RANGE, RawScenarioConfig, ScenarioConfig, ScenarioConfigBuilder,
    TERMINAL_GROWTH_RANGE,
};
