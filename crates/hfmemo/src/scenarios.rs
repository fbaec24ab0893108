//! Base/Bull/Bear scenario orchestration.
//!
//! Each scenario runs the same pipeline, forecast then FCFF then DCF then the
//! equity bridge, over the shared historical drivers and balance inputs. Runs
//! share no mutable state, so the Base result is identical whether it runs
//! alone or alongside the others.

use crate::{
    Result,
    config::{ForecastConfig, ScenarioConfig},
    drivers::{BalanceInputs, HistoricalDrivers},
    forecast::{CashFlowBridge, ForecastEngine, ForecastSeries, OperatingIncomeMultiple},
    valuation::{DcfResult, EquityResult, FcffSeries, dcf, equity_value, fcff},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

/// Named valuation scenario.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Central case
    #[display("base")]
    Base,
    /// Optimistic case
    #[display("bull")]
    Bull,
    /// Pessimistic case
    #[display("bear")]
    Bear,
}

impl Scenario {
    /// All scenarios in reporting order.
    pub const ALL: [Self; 3] = [Self::Base, Self::Bull, Self::Bear];
}

/// Valuation output for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    /// Scenario this result belongs to
    pub scenario: Scenario,
    /// Projected financials
    pub forecast: ForecastSeries,
    /// FCFF aligned to the forecast periods
    pub fcff: FcffSeries,
    /// DCF components
    pub dcf: DcfResult,
    /// Equity bridge
    pub equity: EquityResult,
}

/// Results for every scenario of a valuation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResults {
    /// Base case
    pub base: ScenarioResult,
    /// Bull case
    pub bull: ScenarioResult,
    /// Bear case
    pub bear: ScenarioResult,
}

impl ScenarioResults {
    /// Result for a named scenario.
    pub const fn get(&self, scenario: Scenario) -> &ScenarioResult {
        match scenario {
            Scenario::Base => &self.base,
            Scenario::Bull => &self.bull,
            Scenario::Bear => &self.bear,
        }
    }

    /// Results in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = &ScenarioResult> {
        Scenario::ALL.into_iter().map(|s| self.get(s))
    }
}

/// Runs scenarios through the forecast and valuation pipeline.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner<B = OperatingIncomeMultiple> {
    engine: ForecastEngine<B>,
}

impl<B: CashFlowBridge> ScenarioRunner<B> {
    /// Runner using a specific forecast engine.
    pub const fn new(engine: ForecastEngine<B>) -> Self {
        Self { engine }
    }

    /// Value a single scenario.
    ///
    /// Errors are tagged with the scenario.
    pub fn run_scenario(
        &self,
        scenario: Scenario,
        drivers: &HistoricalDrivers,
        config: &ScenarioConfig,
        horizon_years: usize,
        balances: BalanceInputs,
        shares_outstanding: Option<f64>,
    ) -> Result<ScenarioResult> {
        let _span = info_span!("scenario", %scenario).entered();

        let result = self
            .value(drivers, config, horizon_years, balances, shares_outstanding)
            .map(|(forecast, fcff, dcf, equity)| ScenarioResult {
                scenario,
                forecast,
                fcff,
                dcf,
                equity,
            })
            .map_err(|e| e.in_scenario(scenario))?;

        debug!(
            enterprise_value = result.dcf.enterprise_value,
            equity_value = result.equity.equity_value,
            "scenario valued"
        );
        Ok(result)
    }

    fn value(
        &self,
        drivers: &HistoricalDrivers,
        config: &ScenarioConfig,
        horizon_years: usize,
        balances: BalanceInputs,
        shares_outstanding: Option<f64>,
    ) -> Result<(ForecastSeries, FcffSeries, DcfResult, EquityResult)> {
        let forecast = self.engine.project(drivers, config, horizon_years)?;
        let fcff = fcff(&forecast);
        let dcf = dcf(&fcff, config.discount_rate(), config.terminal_growth(), None)?;
        let equity = equity_value(
            dcf.enterprise_value,
            balances.cash,
            balances.debt,
            shares_outstanding,
        );
        Ok((forecast, fcff, dcf, equity))
    }

    /// Value Base, Bull and Bear.
    ///
    /// The first failing scenario aborts the run; no partial results are
    /// returned.
    pub fn run_all(
        &self,
        drivers: &HistoricalDrivers,
        config: &ForecastConfig,
        balances: BalanceInputs,
        shares_outstanding: Option<f64>,
    ) -> Result<ScenarioResults> {
        let run = |scenario| {
            self.run_scenario(
                scenario,
                drivers,
                config.scenario(scenario),
                config.horizon_years(),
                balances,
                shares_outstanding,
            )
        };

        let results = ScenarioResults {
            base: run(Scenario::Base)?,
            bull: run(Scenario::Bull)?,
            bear: run(Scenario::Bear)?,
        };
        info!(
            base = results.base.equity.equity_value,
            bull = results.bull.equity.equity_value,
            bear = results.bear.equity.equity_value,
            "completed scenario analysis"
        );
        Ok(results)
    }
}

/// Value Base, Bull and Bear with the default forecast engine.
pub fn run_all(
    drivers: &HistoricalDrivers,
    config: &ForecastConfig,
    cash: f64,
    debt: f64,
    shares_outstanding: Option<f64>,
) -> Result<ScenarioResults> {
    ScenarioRunner::<OperatingIncomeMultiple>::default().run_all(
        drivers,
        config,
        BalanceInputs { cash, debt },
        shares_outstanding,
    )
}
