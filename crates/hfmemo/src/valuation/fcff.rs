//! Free cash flow to firm.
//!
//! FCFF is operating cash flow plus capex; capex is carried as a negative
//! outflow, so the addition subtracts its magnitude.

use crate::{Result, forecast::ForecastSeries};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

/// FCFF for one forecast period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FcffPoint {
    /// Forecast period
    pub period_end: NaiveDate,
    /// Free cash flow to firm
    pub fcff: f64,
}

/// FCFF aligned to the forecast periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FcffSeries {
    points: Vec<FcffPoint>,
}

impl FcffSeries {
    /// Build a series from period/value pairs already in period order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self {
            points: pairs
                .into_iter()
                .map(|(period_end, fcff)| FcffPoint { period_end, fcff })
                .collect(),
        }
    }

    /// Series points.
    pub fn points(&self) -> &[FcffPoint] {
        &self.points
    }

    /// FCFF values in period order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.fcff).collect()
    }

    /// Final-period FCFF.
    pub fn last(&self) -> Option<f64> {
        self.points.last().map(|p| p.fcff)
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no periods.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// FCFF per forecast period: `cfo + capex`.
pub fn fcff(forecast: &ForecastSeries) -> FcffSeries {
    FcffSeries::from_pairs(forecast.iter().map(|row| (row.period_end, row.cfo + row.capex)))
}

/// FCFF over a forecast table.
///
/// Expects `period_end`, `cfo` and `capex` columns and returns `period_end`
/// and `fcff`.
pub fn fcff_frame(forecast: &DataFrame) -> Result<DataFrame> {
    let result = forecast
        .clone()
        .lazy()
        .select([
            col("period_end"),
            (col("cfo") + col("capex")).alias("fcff"),
        ])
        .collect()?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastRow;

    fn jan1(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    fn toy_forecast() -> ForecastSeries {
        let cfo = [100.0, 110.0, 120.0, 130.0, 140.0];
        let capex = [-20.0, -22.0, -24.0, -26.0, -28.0];
        ForecastSeries::from_rows(
            (0..5)
                .map(|i| ForecastRow {
                    period_end: jan1(2024 + i as i32),
                    revenue: 0.0,
                    operating_income: 0.0,
                    cfo: cfo[i],
                    capex: capex[i],
                })
                .collect(),
        )
    }

    #[test]
    fn test_fcff_is_cfo_plus_capex() {
        let series = fcff(&toy_forecast());

        assert_eq!(series.len(), 5);
        assert_eq!(series.values(), vec![80.0, 88.0, 96.0, 104.0, 112.0]);
        assert_eq!(series.points()[0].period_end, jan1(2024));
        assert_eq!(series.last(), Some(112.0));
    }

    #[test]
    fn test_fcff_frame() {
        let df = toy_forecast().to_frame().unwrap();
        let result = fcff_frame(&df).unwrap();

        assert_eq!(result.shape(), (5, 2));
        let values = result.column("fcff").unwrap().f64().unwrap();
        assert_eq!(values.get(0).unwrap(), 80.0);
        assert_eq!(values.get(4).unwrap(), 112.0);
    }
}
