//! Forecast horizon and the Base/Bull/Bear scenario set.

use super::scenario::{RawScenarioConfig, ScenarioConfig};
use crate::{MemoError, Result, scenarios::Scenario};
use serde::{Deserialize, Serialize};

/// Shortest supported forecast horizon in years.
pub const MIN_HORIZON_YEARS: usize = 1;

/// Longest supported forecast horizon in years.
pub const MAX_HORIZON_YEARS: usize = 10;

/// Default forecast horizon in years.
pub const DEFAULT_HORIZON_YEARS: usize = 5;

/// Validated forecast configuration for one valuation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawForecastConfig", into = "RawForecastConfig")]
pub struct ForecastConfig {
    horizon_years: usize,
    base: ScenarioConfig,
    bull: ScenarioConfig,
    bear: ScenarioConfig,
}

impl ForecastConfig {
    /// Build a configuration, checking the horizon and every scenario's
    /// per-year lists against it.
    pub fn new(
        horizon_years: usize,
        base: ScenarioConfig,
        bull: ScenarioConfig,
        bear: ScenarioConfig,
    ) -> Result<Self> {
        if !(MIN_HORIZON_YEARS..=MAX_HORIZON_YEARS).contains(&horizon_years) {
            return Err(MemoError::Configuration(format!(
                "horizon_years must be between {MIN_HORIZON_YEARS} and {MAX_HORIZON_YEARS}, got {horizon_years}"
            )));
        }

        let config = Self {
            horizon_years,
            base,
            bull,
            bear,
        };
        for scenario in Scenario::ALL {
            config
                .scenario(scenario)
                .validate_horizon(horizon_years)
                .map_err(|e| in_scenario_block(scenario, e))?;
        }
        Ok(config)
    }

    /// Number of forecast years.
    pub const fn horizon_years(&self) -> usize {
        self.horizon_years
    }

    /// Assumptions for a named scenario.
    pub const fn scenario(&self, scenario: Scenario) -> &ScenarioConfig {
        match scenario {
            Scenario::Base => &self.base,
            Scenario::Bull => &self.bull,
            Scenario::Bear => &self.bear,
        }
    }

    /// Base case assumptions.
    pub const fn base(&self) -> &ScenarioConfig {
        &self.base
    }

    /// Bull case assumptions.
    pub const fn bull(&self) -> &ScenarioConfig {
        &self.bull
    }

    /// Bear case assumptions.
    pub const fn bear(&self) -> &ScenarioConfig {
        &self.bear
    }
}

/// Prefix a configuration error with the scenario block it came from.
fn in_scenario_block(scenario: Scenario, err: MemoError) -> MemoError {
    match err {
        MemoError::Configuration(msg) => {
            MemoError::Configuration(format!("{scenario} scenario: {msg}"))
        }
        other => other,
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            base: ScenarioConfig::default_for(Scenario::Base),
            bull: ScenarioConfig::default_for(Scenario::Bull),
            bear: ScenarioConfig::default_for(Scenario::Bear),
        }
    }
}

/// On-disk shape of a forecast configuration document.
///
/// Every scenario block must be present and name a margin source; keys other
/// than the ones below are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawForecastConfig {
    /// Forecast horizon in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_years: Option<usize>,
    /// Base case block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<RawScenarioConfig>,
    /// Bull case block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bull: Option<RawScenarioConfig>,
    /// Bear case block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bear: Option<RawScenarioConfig>,
}

impl TryFrom<RawForecastConfig> for ForecastConfig {
    type Error = MemoError;

    fn try_from(raw: RawForecastConfig) -> Result<Self> {
        let resolve = |block: Option<RawScenarioConfig>, scenario: Scenario| {
            ScenarioConfig::try_from(block.unwrap_or_default())
                .map_err(|e| in_scenario_block(scenario, e))
        };

        Self::new(
            raw.horizon_years.unwrap_or(DEFAULT_HORIZON_YEARS),
            resolve(raw.base, Scenario::Base)?,
            resolve(raw.bull, Scenario::Bull)?,
            resolve(raw.bear, Scenario::Bear)?,
        )
    }
}

impl From<ForecastConfig> for RawForecastConfig {
    fn from(config: ForecastConfig) -> Self {
        Self {
            horizon_years: Some(config.horizon_years),
            base: Some(config.base.into()),
            bull: Some(config.bull.into()),
            bear: Some(config.bear.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateSpec;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = ForecastConfig::default();
        assert_eq!(config.horizon_years(), 5);
        for scenario in Scenario::ALL {
            assert!(config.scenario(scenario).validate_horizon(5).is_ok());
        }
        assert_eq!(config.bull().discount_rate(), 0.09);
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    fn test_horizon_bounds(#[case] horizon: usize) {
        let err = ForecastConfig::new(
            horizon,
            ScenarioConfig::default_for(Scenario::Base),
            ScenarioConfig::default_for(Scenario::Bull),
            ScenarioConfig::default_for(Scenario::Bear),
        )
        .unwrap_err();
        assert!(err.to_string().contains("horizon_years"));
    }

    #[test]
    fn test_list_length_mismatch_names_scenario() {
        let bear = ScenarioConfig::builder()
            .revenue_growth(vec![0.02; 3])
            .operating_margin(12.0)
            .build()
            .unwrap();

        let err = ForecastConfig::new(
            5,
            ScenarioConfig::default_for(Scenario::Base),
            ScenarioConfig::default_for(Scenario::Bull),
            bear,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bear scenario"));
        assert!(message.contains("revenue_growth list length (3)"));
    }

    fn block(margin: f64) -> Option<RawScenarioConfig> {
        Some(RawScenarioConfig {
            operating_margin: Some(RateSpec::Scalar(margin)),
            ..RawScenarioConfig::default()
        })
    }

    #[test]
    fn test_missing_block_rejected() {
        let raw = RawForecastConfig {
            horizon_years: Some(3),
            base: block(15.0),
            bull: block(18.0),
            bear: None,
        };
        let err = ForecastConfig::try_from(raw).unwrap_err();

        assert!(matches!(err, MemoError::Configuration(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: bear scenario: either operating_margin or operating_income_pct_revenue must be provided"
        );
    }

    #[test]
    fn test_complete_blocks_use_generic_defaults() {
        let raw = RawForecastConfig {
            horizon_years: Some(3),
            base: block(15.0),
            bull: block(18.0),
            bear: block(12.0),
        };
        let config = ForecastConfig::try_from(raw).unwrap();

        assert_eq!(config.horizon_years(), 3);
        assert_eq!(config.bear().discount_rate(), 0.10);
        assert!(matches!(config.base().revenue_growth(), RateSpec::Scalar(_)));
    }
}
