//! Driver-based forward projection.
//!
//! Revenue compounds from the last historical observation; operating income
//! and capex follow from per-year margin and capex intensity assumptions, and
//! operating cash flow is bridged from operating income.

use crate::{
    MemoError, Result,
    config::{MAX_HORIZON_YEARS, MIN_HORIZON_YEARS, MarginSpec, ScenarioConfig},
    drivers::{HistoricalDrivers, TRAILING_MARGIN_PERIODS},
};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Operating cash flow as a multiple of operating income.
///
/// Stands in for the D&A add-back and working-capital change, which are not
/// modelled separately.
pub const CFO_TO_OPERATING_INCOME: f64 = 1.1;

/// One projected year, as seen by a [`CashFlowBridge`].
#[derive(Debug, Clone, Copy)]
pub struct ForecastStep {
    /// Zero-based forecast year
    pub year_index: usize,
    /// Projected revenue
    pub revenue: f64,
    /// Projected operating income
    pub operating_income: f64,
    /// Projected capex (negative)
    pub capex: f64,
    /// Working capital intensity from the scenario, in percent of revenue
    pub nwc_pct_revenue: f64,
}

/// Derives operating cash flow for a projected year.
pub trait CashFlowBridge: Send + Sync + std::fmt::Debug {
    /// Short identifier for logging.
    fn name(&self) -> &str;

    /// Operating cash flow for the step.
    fn cfo(&self, step: &ForecastStep) -> f64;
}

/// CFO as a fixed multiple of operating income.
///
/// Ignores `nwc_pct_revenue`.
#[derive(Debug, Clone, Copy)]
pub struct OperatingIncomeMultiple {
    /// Multiple applied to operating income
    pub multiple: f64,
}

impl Default for OperatingIncomeMultiple {
    fn default() -> Self {
        Self {
            multiple: CFO_TO_OPERATING_INCOME,
        }
    }
}

impl CashFlowBridge for OperatingIncomeMultiple {
    fn name(&self) -> &str {
        "operating_income_multiple"
    }

    fn cfo(&self, step: &ForecastStep) -> f64 {
        step.operating_income * self.multiple
    }
}

/// One projected period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    /// Start of the forecast year (January 1)
    pub period_end: NaiveDate,
    /// Revenue
    pub revenue: f64,
    /// Operating income
    pub operating_income: f64,
    /// Cash from operations
    pub cfo: f64,
    /// Capital expenditures, always `<= 0`
    pub capex: f64,
}

/// Projected periods in year order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ForecastSeries {
    rows: Vec<ForecastRow>,
}

impl ForecastSeries {
    /// Wrap rows that are already in period order.
    pub const fn from_rows(rows: Vec<ForecastRow>) -> Self {
        Self { rows }
    }

    /// Projected rows.
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Number of projected periods.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no periods were projected.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, ForecastRow> {
        self.rows.iter()
    }

    /// Projected period dates.
    pub fn periods(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.period_end).collect()
    }

    /// Projected revenue.
    pub fn revenue(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.revenue).collect()
    }

    /// Forecast as a table with columns `period_end, revenue,
    /// operating_income, cfo, capex`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = df![
            "period_end" => self.periods(),
            "revenue" => self.revenue(),
            "operating_income" => self.rows.iter().map(|r| r.operating_income).collect::<Vec<_>>(),
            "cfo" => self.rows.iter().map(|r| r.cfo).collect::<Vec<_>>(),
            "capex" => self.rows.iter().map(|r| r.capex).collect::<Vec<_>>(),
        ]?;
        Ok(df)
    }
}

impl<'a> IntoIterator for &'a ForecastSeries {
    type Item = &'a ForecastRow;
    type IntoIter = std::slice::Iter<'a, ForecastRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Projects historical drivers forward under a scenario.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine<B = OperatingIncomeMultiple> {
    bridge: B,
}

impl<B: CashFlowBridge> ForecastEngine<B> {
    /// Engine with a custom cash-flow bridge.
    pub const fn with_bridge(bridge: B) -> Self {
        Self { bridge }
    }

    /// Cash-flow bridge in use.
    pub const fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Project `horizon_years` annual periods after the last historical period.
    ///
    /// Forecast periods are January 1 of each year following the last
    /// historical period end.
    ///
    /// # Formula
    ///
    /// For year `i`, starting from the last historical revenue:
    ///
    /// ```text
    /// revenue[i]          = revenue[i-1] * (1 + growth[i])
    /// operating_income[i] = revenue[i] * margin[i] / 100
    /// capex[i]            = -|revenue[i] * capex_pct[i] / 100|
    /// cfo[i]              = bridge.cfo(step[i])
    /// ```
    ///
    /// The margin comes from `operating_income_pct_revenue`, then
    /// `operating_margin`, then the mean of the last three historical margins
    /// when the scenario asks for the trailing average.
    ///
    /// # Data Requirements
    ///
    /// - at least one historical period with revenue
    /// - per-year lists at least `horizon_years` long
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use hfmemo::{ForecastEngine, ScenarioConfig};
    ///
    /// let scenario = ScenarioConfig::builder()
    ///     .revenue_growth(0.10)
    ///     .operating_margin(15.0)
    ///     .build()?;
    /// let forecast = ForecastEngine::default().project(&drivers, &scenario, 5)?;
    /// assert_eq!(forecast.len(), 5);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`MemoError::Configuration`] when the horizon is out of range or
    /// a per-year list is shorter than the horizon.
    pub fn project(
        &self,
        drivers: &HistoricalDrivers,
        scenario: &ScenarioConfig,
        horizon_years: usize,
    ) -> Result<ForecastSeries> {
        if !(MIN_HORIZON_YEARS..=MAX_HORIZON_YEARS).contains(&horizon_years) {
            return Err(MemoError::Configuration(format!(
                "horizon_years must be between {MIN_HORIZON_YEARS} and {MAX_HORIZON_YEARS}, got {horizon_years}"
            )));
        }

        let growth = scenario
            .revenue_growth()
            .resolve(horizon_years, "revenue_growth")?;
        let margin = match scenario.margin() {
            MarginSpec::OperatingIncomePct(rates) => {
                rates.resolve(horizon_years, "operating_income_pct_revenue")?
            }
            MarginSpec::Margin(rates) => rates.resolve(horizon_years, "operating_margin")?,
            MarginSpec::TrailingAverage => {
                vec![drivers.trailing_margin(TRAILING_MARGIN_PERIODS); horizon_years]
            }
        };
        let capex_pct = scenario
            .capex_pct_revenue()
            .resolve(horizon_years, "capex_pct_revenue")?;

        let first_year = drivers.last_period().year() + 1;
        let mut revenue = drivers.last_revenue();
        let mut rows = Vec::with_capacity(horizon_years);

        for i in 0..horizon_years {
            let year = first_year + i as i32;
            let period_end = NaiveDate::from_ymd_opt(year, 1, 1)
                .ok_or_else(|| MemoError::Data(format!("forecast year {year} out of range")))?;

            revenue *= 1.0 + growth[i];
            let operating_income = revenue * margin[i] / 100.0;
            // Capex stays an outflow whatever the sign of the intensity.
            let capex = -(revenue * capex_pct[i] / 100.0).abs();
            let cfo = self.bridge.cfo(&ForecastStep {
                year_index: i,
                revenue,
                operating_income,
                capex,
                nwc_pct_revenue: scenario.nwc_pct_revenue(),
            });

            rows.push(ForecastRow {
                period_end,
                revenue,
                operating_income,
                cfo,
                capex,
            });
        }

        debug!(
            horizon_years,
            bridge = self.bridge.name(),
            final_revenue = revenue,
            "projected forecast"
        );
        Ok(ForecastSeries { rows })
    }
}

/// Project with the default cash-flow bridge, `cfo = 1.1 * operating_income`.
///
/// See [`ForecastEngine::project`].
pub fn project(
    drivers: &HistoricalDrivers,
    scenario: &ScenarioConfig,
    horizon_years: usize,
) -> Result<ForecastSeries> {
    ForecastEngine::<OperatingIncomeMultiple>::default().project(drivers, scenario, horizon_years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateSpec;
    use approx::assert_relative_eq;

    fn jan1(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    fn three_year_history() -> HistoricalDrivers {
        HistoricalDrivers::from_history(
            vec![jan1(2021), jan1(2022), jan1(2023)],
            vec![1_000.0, 1_100.0, 1_200.0],
            vec![Some(150.0), Some(165.0), Some(180.0)],
            vec![Some(160.0), Some(175.0), Some(190.0)],
            vec![Some(-50.0), Some(-55.0), Some(-60.0)],
        )
        .unwrap()
    }

    fn single_year_history() -> HistoricalDrivers {
        HistoricalDrivers::from_history(
            vec![jan1(2023)],
            vec![1_000.0],
            vec![Some(150.0)],
            vec![Some(160.0)],
            vec![Some(-50.0)],
        )
        .unwrap()
    }

    fn base_scenario() -> ScenarioConfig {
        ScenarioConfig::builder()
            .discount_rate(0.10)
            .terminal_growth(0.025)
            .revenue_growth(vec![0.05; 5])
            .operating_income_pct_revenue(vec![15.0; 5])
            .capex_pct_revenue(5.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_capex_is_outflow() {
        let forecast = project(&three_year_history(), &base_scenario(), 5).unwrap();

        assert_eq!(forecast.len(), 5);
        for row in &forecast {
            assert!(row.capex < 0.0, "capex should be negative, got {}", row.capex);
        }
    }

    #[test]
    fn test_negative_capex_intensity_still_outflow() {
        let scenario = ScenarioConfig::builder()
            .revenue_growth(0.05)
            .operating_margin(15.0)
            .capex_pct_revenue(-5.0)
            .build()
            .unwrap();
        let forecast = project(&three_year_history(), &scenario, 5).unwrap();

        for row in &forecast {
            assert!(row.capex <= 0.0, "capex should be an outflow, got {}", row.capex);
            assert_relative_eq!(row.capex, -row.revenue * 0.05, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_negative_revenue_capex_still_outflow() {
        let history = HistoricalDrivers::from_history(
            vec![jan1(2023)],
            vec![-1_000.0],
            vec![Some(-150.0)],
            vec![None],
            vec![None],
        )
        .unwrap();
        let forecast = project(&history, &base_scenario(), 5).unwrap();

        let first = &forecast.rows()[0];
        assert_relative_eq!(first.revenue, -1_050.0, max_relative = 1e-12);
        assert_relative_eq!(first.capex, -52.5, max_relative = 1e-12);
        assert!(forecast.iter().all(|row| row.capex <= 0.0));
    }

    #[test]
    fn test_revenue_compounds_from_last_observation() {
        let scenario = ScenarioConfig::builder()
            .revenue_growth(vec![0.10, 0.08, 0.06, 0.04, 0.02])
            .operating_income_pct_revenue(vec![15.0; 5])
            .capex_pct_revenue(5.0)
            .build()
            .unwrap();

        let forecast = project(&single_year_history(), &scenario, 5).unwrap();
        let revenue = forecast.revenue();

        assert_eq!(revenue.len(), 5);
        assert_relative_eq!(revenue[0], 1_100.0, epsilon = 1e-9);
        assert_relative_eq!(revenue[1], 1_188.0, epsilon = 1e-9);
    }

    #[test]
    fn test_row_arithmetic() {
        let forecast = project(&single_year_history(), &base_scenario(), 5).unwrap();
        let first = forecast.rows()[0];

        assert_relative_eq!(first.revenue, 1_050.0, epsilon = 1e-9);
        assert_relative_eq!(first.operating_income, 157.5, epsilon = 1e-9);
        assert_relative_eq!(first.capex, -52.5, epsilon = 1e-9);
        assert_relative_eq!(first.cfo, 157.5 * CFO_TO_OPERATING_INCOME, epsilon = 1e-9);
    }

    #[test]
    fn test_periods_start_year_after_history() {
        let history = HistoricalDrivers::from_history(
            vec![NaiveDate::from_ymd_opt(2023, 9, 30).unwrap()],
            vec![500.0],
            vec![None],
            vec![None],
            vec![None],
        )
        .unwrap();
        let forecast = project(&history, &base_scenario(), 3).unwrap();

        assert_eq!(forecast.periods(), vec![jan1(2024), jan1(2025), jan1(2026)]);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let history = three_year_history();
        let scenario = base_scenario();

        let first = project(&history, &scenario, 5).unwrap();
        let second = project(&history, &scenario, 5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_trailing_margin_fallback() {
        let scenario = ScenarioConfig::builder()
            .revenue_growth(0.0)
            .trailing_margin()
            .capex_pct_revenue(0.0)
            .build()
            .unwrap();

        let forecast = project(&three_year_history(), &scenario, 2).unwrap();
        // Historical margins are all 15%.
        for row in &forecast {
            assert_relative_eq!(row.operating_income, 180.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_generator_rates() {
        let scenario = ScenarioConfig::builder()
            .revenue_growth(RateSpec::generator(|i| if i == 0 { 0.5 } else { 0.0 }))
            .operating_margin(RateSpec::generator(|_| 10.0))
            .capex_pct_revenue(RateSpec::generator(|i| i as f64))
            .build()
            .unwrap();

        let forecast = project(&single_year_history(), &scenario, 3).unwrap();
        let rows = forecast.rows();
        assert_relative_eq!(rows[2].revenue, 1_500.0, epsilon = 1e-9);
        assert_relative_eq!(rows[0].operating_income, 150.0, epsilon = 1e-9);
        assert_eq!(rows[0].capex, 0.0);
        assert_relative_eq!(rows[2].capex, -30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_short_list_is_configuration_error() {
        let err = project(&single_year_history(), &base_scenario(), 7).unwrap_err();
        assert!(matches!(err, MemoError::Configuration(_)));
    }

    #[derive(Debug)]
    struct NwcDrag;

    impl CashFlowBridge for NwcDrag {
        fn name(&self) -> &str {
            "nwc_drag"
        }

        fn cfo(&self, step: &ForecastStep) -> f64 {
            step.operating_income - step.revenue * step.nwc_pct_revenue / 100.0
        }
    }

    #[test]
    fn test_custom_bridge() {
        let scenario = ScenarioConfig::builder()
            .revenue_growth(0.0)
            .operating_margin(20.0)
            .nwc_pct_revenue(2.0)
            .build()
            .unwrap();

        let engine = ForecastEngine::with_bridge(NwcDrag);
        let forecast = engine.project(&single_year_history(), &scenario, 1).unwrap();
        assert_relative_eq!(forecast.rows()[0].cfo, 200.0 - 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_to_frame_columns() {
        let forecast = project(&single_year_history(), &base_scenario(), 5).unwrap();
        let df = forecast.to_frame().unwrap();
        assert_eq!(df.shape(), (5, 5));
        assert!(df.column("capex").is_ok());
    }
}
