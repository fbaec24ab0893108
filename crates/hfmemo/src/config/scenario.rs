//! Assumptions for a single valuation scenario.

use super::rate::{MarginSpec, RateSpec};
use crate::{MemoError, Result, scenarios::Scenario};
use serde::{Deserialize, Serialize};

/// Bounds accepted for the discount rate (WACC).
pub const DISCOUNT_RATE_RANGE: (f64, f64) = (0.0, 1.0);

/// Bounds accepted for the terminal growth rate.
pub const TERMINAL_GROWTH_RANGE: (f64, f64) = (0.0, 0.1);

/// Forward assumptions for one scenario.
///
/// Growth, discount and terminal rates are decimals (`0.05` = 5%); margin,
/// capex and working-capital intensities are percentages of revenue
/// (`15.0` = 15%).
///
/// Construct through [`ScenarioConfig::builder`], which validates bounds and
/// requires exactly one margin source. List lengths are checked against the
/// horizon by [`ForecastConfig`](super::ForecastConfig).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawScenarioConfig", into = "RawScenarioConfig")]
pub struct ScenarioConfig {
    discount_rate: f64,
    terminal_growth: f64,
    revenue_growth: RateSpec,
    margin: MarginSpec,
    capex_pct_revenue: RateSpec,
    nwc_pct_revenue: f64,
}

impl ScenarioConfig {
    /// Start building a scenario.
    pub fn builder() -> ScenarioConfigBuilder {
        ScenarioConfigBuilder::default()
    }

    /// Built-in assumptions for a named scenario.
    pub fn default_for(scenario: Scenario) -> Self {
        let (discount_rate, terminal_growth, growth, margin) = match scenario {
            Scenario::Base => (0.10, 0.025, 0.05, 15.0),
            Scenario::Bull => (0.09, 0.03, 0.08, 18.0),
            Scenario::Bear => (0.11, 0.02, 0.02, 12.0),
        };
        Self {
            discount_rate,
            terminal_growth,
            revenue_growth: RateSpec::Scalar(growth),
            margin: MarginSpec::OperatingIncomePct(RateSpec::Scalar(margin)),
            capex_pct_revenue: RateSpec::Scalar(DEFAULT_CAPEX_PCT_REVENUE),
            nwc_pct_revenue: 0.0,
        }
    }

    /// Discount rate (WACC) as a decimal.
    pub const fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    /// Perpetuity growth rate as a decimal.
    pub const fn terminal_growth(&self) -> f64 {
        self.terminal_growth
    }

    /// Revenue growth per year.
    pub const fn revenue_growth(&self) -> &RateSpec {
        &self.revenue_growth
    }

    /// Operating margin source.
    pub const fn margin(&self) -> &MarginSpec {
        &self.margin
    }

    /// Capex as a percentage of revenue per year.
    pub const fn capex_pct_revenue(&self) -> &RateSpec {
        &self.capex_pct_revenue
    }

    /// Net working capital as a percentage of revenue.
    ///
    /// Accepted and carried through, but not yet used by the forecast.
    pub const fn nwc_pct_revenue(&self) -> f64 {
        self.nwc_pct_revenue
    }

    /// Check every per-year input against a forecast horizon.
    pub fn validate_horizon(&self, horizon: usize) -> Result<()> {
        self.revenue_growth.validate(horizon, "revenue_growth")?;
        if let Some(rates) = self.margin.rates() {
            rates.validate(horizon, self.margin.field_name())?;
        }
        self.capex_pct_revenue.validate(horizon, "capex_pct_revenue")
    }
}

const DEFAULT_DISCOUNT_RATE: f64 = 0.10;
const DEFAULT_TERMINAL_GROWTH: f64 = 0.025;
const DEFAULT_REVENUE_GROWTH: f64 = 0.05;
const DEFAULT_CAPEX_PCT_REVENUE: f64 = 5.0;

/// Builder for [`ScenarioConfig`].
#[derive(Debug, Clone, Default)]
pub struct ScenarioConfigBuilder {
    discount_rate: Option<f64>,
    terminal_growth: Option<f64>,
    revenue_growth: Option<RateSpec>,
    operating_margin: Option<RateSpec>,
    operating_income_pct_revenue: Option<RateSpec>,
    trailing_margin: bool,
    capex_pct_revenue: Option<RateSpec>,
    nwc_pct_revenue: Option<f64>,
}

impl ScenarioConfigBuilder {
    /// Discount rate (WACC), default `0.10`.
    pub const fn discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = Some(rate);
        self
    }

    /// Terminal growth rate, default `0.025`.
    pub const fn terminal_growth(mut self, rate: f64) -> Self {
        self.terminal_growth = Some(rate);
        self
    }

    /// Revenue growth, default `0.05` every year.
    pub fn revenue_growth(mut self, rates: impl Into<RateSpec>) -> Self {
        self.revenue_growth = Some(rates.into());
        self
    }

    /// Operating margin in percent.
    pub fn operating_margin(mut self, rates: impl Into<RateSpec>) -> Self {
        self.operating_margin = Some(rates.into());
        self
    }

    /// Operating income as a percentage of revenue.
    pub fn operating_income_pct_revenue(mut self, rates: impl Into<RateSpec>) -> Self {
        self.operating_income_pct_revenue = Some(rates.into());
        self
    }

    /// Use the trailing historical operating margin.
    pub const fn trailing_margin(mut self) -> Self {
        self.trailing_margin = true;
        self
    }

    /// Set the margin source directly.
    pub fn margin(self, margin: MarginSpec) -> Self {
        match margin {
            MarginSpec::Margin(rates) => self.operating_margin(rates),
            MarginSpec::OperatingIncomePct(rates) => self.operating_income_pct_revenue(rates),
            MarginSpec::TrailingAverage => self.trailing_margin(),
        }
    }

    /// Capex as a percentage of revenue, default `5.0` every year.
    pub fn capex_pct_revenue(mut self, rates: impl Into<RateSpec>) -> Self {
        self.capex_pct_revenue = Some(rates.into());
        self
    }

    /// Net working capital as a percentage of revenue, default `0.0`.
    pub const fn nwc_pct_revenue(mut self, pct: f64) -> Self {
        self.nwc_pct_revenue = Some(pct);
        self
    }

    /// Validate and build the scenario.
    ///
    /// # Errors
    ///
    /// Returns [`MemoError::Configuration`] when a rate is out of bounds or
    /// when not exactly one margin source was given.
    pub fn build(self) -> Result<ScenarioConfig> {
        let discount_rate = self.discount_rate.unwrap_or(DEFAULT_DISCOUNT_RATE);
        let terminal_growth = self.terminal_growth.unwrap_or(DEFAULT_TERMINAL_GROWTH);
        check_range("discount_rate", discount_rate, DISCOUNT_RATE_RANGE)?;
        check_range("terminal_growth", terminal_growth, TERMINAL_GROWTH_RANGE)?;

        let nwc_pct_revenue = self.nwc_pct_revenue.unwrap_or(0.0);
        if !nwc_pct_revenue.is_finite() {
            return Err(MemoError::Configuration(format!(
                "nwc_pct_revenue must be finite, got {nwc_pct_revenue}"
            )));
        }

        let mut sources = Vec::new();
        if let Some(rates) = self.operating_income_pct_revenue {
            sources.push(MarginSpec::OperatingIncomePct(rates));
        }
        if let Some(rates) = self.operating_margin {
            sources.push(MarginSpec::Margin(rates));
        }
        if self.trailing_margin {
            sources.push(MarginSpec::TrailingAverage);
        }
        let margin = match sources.len() {
            0 => {
                return Err(MemoError::Configuration(
                    "either operating_margin or operating_income_pct_revenue must be provided"
                        .to_string(),
                ));
            }
            1 => sources.remove(0),
            _ => {
                let names: Vec<_> = sources.iter().map(MarginSpec::field_name).collect();
                return Err(MemoError::Configuration(format!(
                    "exactly one margin source is allowed, got {}",
                    names.join(" and ")
                )));
            }
        };

        Ok(ScenarioConfig {
            discount_rate,
            terminal_growth,
            revenue_growth: self
                .revenue_growth
                .unwrap_or(RateSpec::Scalar(DEFAULT_REVENUE_GROWTH)),
            margin,
            capex_pct_revenue: self
                .capex_pct_revenue
                .unwrap_or(RateSpec::Scalar(DEFAULT_CAPEX_PCT_REVENUE)),
            nwc_pct_revenue,
        })
    }
}

fn check_range(name: &str, value: f64, (lo, hi): (f64, f64)) -> Result<()> {
    if (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(MemoError::Configuration(format!(
            "{name} must be between {lo} and {hi}, got {value}"
        )))
    }
}

/// On-disk shape of a scenario block.
///
/// Unrecognised keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawScenarioConfig {
    /// Discount rate (WACC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<f64>,
    /// Terminal growth rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_growth: Option<f64>,
    /// Revenue growth, scalar or per-year list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<RateSpec>,
    /// Operating margin in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_margin: Option<RateSpec>,
    /// Operating income as a percentage of revenue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_income_pct_revenue: Option<RateSpec>,
    /// Use the trailing historical margin
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub trailing_margin: bool,
    /// Capex as a percentage of revenue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex_pct_revenue: Option<RateSpec>,
    /// Net working capital as a percentage of revenue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nwc_pct_revenue: Option<f64>,
}

impl TryFrom<RawScenarioConfig> for ScenarioConfig {
    type Error = MemoError;

    fn try_from(raw: RawScenarioConfig) -> Result<Self> {
        let mut builder = Self::builder();
        builder.discount_rate = raw.discount_rate;
        builder.terminal_growth = raw.terminal_growth;
        builder.revenue_growth = raw.revenue_growth;
        builder.operating_margin = raw.operating_margin;
        builder.operating_income_pct_revenue = raw.operating_income_pct_revenue;
        builder.trailing_margin = raw.trailing_margin;
        builder.capex_pct_revenue = raw.capex_pct_revenue;
        builder.nwc_pct_revenue = raw.nwc_pct_revenue;
        builder.build()
    }
}

impl From<ScenarioConfig> for RawScenarioConfig {
    fn from(config: ScenarioConfig) -> Self {
        let mut raw = Self {
            discount_rate: Some(config.discount_rate),
            terminal_growth: Some(config.terminal_growth),
            revenue_growth: Some(config.revenue_growth),
            capex_pct_revenue: Some(config.capex_pct_revenue),
            nwc_pct_revenue: Some(config.nwc_pct_revenue),
            ..Self::default()
        };
        match config.margin {
            MarginSpec::Margin(rates) => raw.operating_margin = Some(rates),
            MarginSpec::OperatingIncomePct(rates) => raw.operating_income_pct_revenue = Some(rates),
            MarginSpec::TrailingAverage => raw.trailing_margin = true,
        }
        raw
    }
}
