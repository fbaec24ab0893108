//! Historical driver extraction.
//!
//! Turns the canonical long-format table into per-period series of revenue,
//! operating income, operating cash flow and capex, aligned on the revenue
//! periods, together with the derived operating margin and capex intensity.

use crate::{
    MemoError, Result,
    schema::{LineItem, latest_balance_value},
};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

/// Line items consumed by driver extraction.
const DRIVER_ITEMS: [LineItem; 4] = [
    LineItem::Revenue,
    LineItem::OperatingIncome,
    LineItem::Cfo,
    LineItem::Capex,
];

/// Number of trailing observations averaged for the historical margin fallback.
pub const TRAILING_MARGIN_PERIODS: usize = 3;

/// Historical drivers aligned on the revenue periods.
///
/// All series share the index of [`HistoricalDrivers::periods`], sorted
/// ascending. Observations missing for a period are `None`; the derived
/// percentage series are `0.0` wherever the ratio is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalDrivers {
    periods: Vec<NaiveDate>,
    revenue: Vec<f64>,
    operating_income: Vec<Option<f64>>,
    operating_margin: Vec<f64>,
    cfo: Vec<Option<f64>>,
    capex: Vec<Option<f64>>,
    capex_pct_revenue: Vec<f64>,
}

impl HistoricalDrivers {
    /// Build drivers from already-aligned series.
    ///
    /// `periods` must be strictly ascending and every series must have the
    /// same length. Margins are derived exactly as in [`extract_drivers`].
    pub fn from_history(
        periods: Vec<NaiveDate>,
        revenue: Vec<f64>,
        operating_income: Vec<Option<f64>>,
        cfo: Vec<Option<f64>>,
        capex: Vec<Option<f64>>,
    ) -> Result<Self> {
        let n = periods.len();
        if n == 0 {
            return Err(MemoError::Data("no revenue history".to_string()));
        }
        if [revenue.len(), operating_income.len(), cfo.len(), capex.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(MemoError::Data(format!(
                "driver series must all have {n} observations"
            )));
        }
        if periods.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MemoError::Data(
                "periods must be strictly ascending".to_string(),
            ));
        }

        let aligned = df![
            "period_end" => periods,
            "revenue" => revenue,
            "operating_income" => operating_income,
            "cfo" => cfo,
            "capex" => capex,
        ]?;

        Self::from_aligned(with_ratios(aligned.lazy()).collect()?)
    }

    fn from_aligned(df: DataFrame) -> Result<Self> {
        let periods = df
            .column("period_end")?
            .date()?
            .as_date_iter()
            .map(|d| d.ok_or_else(|| MemoError::Data("null period_end".to_string())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            periods,
            revenue: dense(&df, "revenue")?,
            operating_income: sparse(&df, "operating_income")?,
            operating_margin: dense(&df, "operating_margin")?,
            cfo: sparse(&df, "cfo")?,
            capex: sparse(&df, "capex")?,
            capex_pct_revenue: dense(&df, "capex_pct_revenue")?,
        })
    }

    /// Historical period ends, ascending.
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Revenue per period.
    pub fn revenue(&self) -> &[f64] {
        &self.revenue
    }

    /// Operating income per period.
    pub fn operating_income(&self) -> &[Option<f64>] {
        &self.operating_income
    }

    /// Operating margin in percent (`operating_income / revenue * 100`).
    pub fn operating_margin(&self) -> &[f64] {
        &self.operating_margin
    }

    /// Cash from operations per period.
    pub fn cfo(&self) -> &[Option<f64>] {
        &self.cfo
    }

    /// Capital expenditures per period (negative outflows).
    pub fn capex(&self) -> &[Option<f64>] {
        &self.capex
    }

    /// Capex intensity in percent (`|capex| / revenue * 100`).
    pub fn capex_pct_revenue(&self) -> &[f64] {
        &self.capex_pct_revenue
    }

    /// Number of historical periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Always false; construction requires at least one period.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Most recent historical period end.
    pub fn last_period(&self) -> NaiveDate {
        self.periods[self.periods.len() - 1]
    }

    /// Most recent revenue observation.
    pub fn last_revenue(&self) -> f64 {
        self.revenue[self.revenue.len() - 1]
    }

    /// Mean operating margin over the last `n` periods (fewer if history is shorter).
    pub fn trailing_margin(&self, n: usize) -> f64 {
        let start = self.operating_margin.len().saturating_sub(n);
        let window = &self.operating_margin[start..];
        if window.is_empty() {
            return 0.0;
        }
        window.iter().sum::<f64>() / window.len() as f64
    }

    /// Drivers as a wide table, one row per period.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = df![
            "period_end" => self.periods.clone(),
            "revenue" => self.revenue.clone(),
            "operating_income" => self.operating_income.clone(),
            "operating_margin" => self.operating_margin.clone(),
            "cfo" => self.cfo.clone(),
            "capex" => self.capex.clone(),
            "capex_pct_revenue" => self.capex_pct_revenue.clone(),
        ]?;
        Ok(df)
    }
}

/// Extract historical drivers from a canonical long-format table.
///
/// Each consumed line item is filtered out of the table and sorted by
/// `period_end`; operating income, CFO and capex are left-joined onto the
/// revenue periods, so a period without revenue is dropped and a missing
/// observation becomes `None`.
///
/// # Formula
///
/// ```text
/// operating_margin  = operating_income / revenue * 100
/// capex_pct_revenue = |capex| / revenue * 100
/// ```
///
/// A ratio that is not finite (zero revenue, missing input) is recorded as `0.0`.
///
/// # Data Requirements
///
/// - `period_end`: Date or Datetime
/// - `line_item`: `revenue` (required), `operating_income`, `cfo`, `capex`
/// - `value`: numeric
///
/// Balance sheet rows are ignored here; see [`BalanceInputs::from_frame`].
///
/// # Example
///
/// ```rust,ignore
/// use hfmemo::{LineItem, StandardizedFact, extract_drivers, facts_to_frame};
/// use chrono::NaiveDate;
///
/// let fy23 = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
/// let facts = vec![
///     StandardizedFact::new("ACME", fy23, LineItem::Revenue, 1_000.0),
///     StandardizedFact::new("ACME", fy23, LineItem::OperatingIncome, 150.0),
/// ];
/// let drivers = extract_drivers(&facts_to_frame(&facts)?)?;
/// assert_eq!(drivers.operating_margin(), &[15.0]);
/// ```
///
/// # Errors
///
/// Returns [`MemoError::Data`] when no revenue is reported, or when a consumed
/// line item appears twice for the same period.
pub fn extract_drivers(data: &DataFrame) -> Result<HistoricalDrivers> {
    let lazy = data.clone().lazy();

    let mut series = Vec::with_capacity(DRIVER_ITEMS.len());
    for item in DRIVER_ITEMS {
        let df = line_item_series(&lazy, item)?;
        ensure_unique_periods(&df, item)?;
        series.push(df);
    }

    let mut frames = series.into_iter();
    let revenue = frames
        .next()
        .ok_or_else(|| MemoError::Data("no revenue history".to_string()))?;
    if revenue.height() == 0 {
        return Err(MemoError::Data("no revenue history".to_string()));
    }

    let mut aligned = revenue.lazy();
    for other in frames {
        aligned = aligned.left_join(other.lazy(), col("period_end"), col("period_end"));
    }

    let aligned = with_ratios(aligned)
        .sort(["period_end"], SortMultipleOptions::default())
        .collect()?;

    let drivers = HistoricalDrivers::from_aligned(aligned)?;
    debug!(
        periods = drivers.len(),
        last_period = %drivers.last_period(),
        last_revenue = drivers.last_revenue(),
        "extracted historical drivers"
    );
    Ok(drivers)
}

/// One line item as a `period_end`/value table sorted by period.
fn line_item_series(data: &LazyFrame, item: LineItem) -> Result<DataFrame> {
    let result = data
        .clone()
        .filter(
            col("statement")
                .eq(lit(item.statement().as_str()))
                .and(col("line_item").eq(lit(item.as_str()))),
        )
        .sort(["period_end"], SortMultipleOptions::default())
        .select([
            col("period_end").cast(DataType::Date),
            col("value").cast(DataType::Float64).alias(item.as_str()),
        ])
        .collect()?;

    Ok(result)
}

fn ensure_unique_periods(df: &DataFrame, item: LineItem) -> Result<()> {
    let periods: Vec<Option<NaiveDate>> = df.column("period_end")?.date()?.as_date_iter().collect();
    if let Some(pair) = periods.windows(2).find(|w| w[0] == w[1]) {
        let period = pair[0].map_or_else(|| "null".to_string(), |d| d.to_string());
        return Err(MemoError::Data(format!(
            "duplicate '{item}' observations for period {period}"
        )));
    }
    Ok(())
}

/// Add the margin and capex-intensity percentages, zeroing undefined ratios.
fn with_ratios(aligned: LazyFrame) -> LazyFrame {
    aligned.with_columns([
        guarded_pct(col("operating_income")).alias("operating_margin"),
        guarded_pct(col("capex").abs()).alias("capex_pct_revenue"),
    ])
}

fn guarded_pct(numerator: Expr) -> Expr {
    let ratio = numerator / col("revenue") * lit(100.0);
    when(ratio.clone().is_finite())
        .then(ratio)
        .otherwise(lit(0.0))
}

fn dense(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}

fn sparse(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

/// Most recent cash and debt balances used to bridge enterprise to equity value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BalanceInputs {
    /// Cash and cash equivalents
    pub cash: f64,
    /// Total debt
    pub debt: f64,
}

impl BalanceInputs {
    /// Read the latest cash and debt from the canonical table.
    ///
    /// A balance that was never reported defaults to `0.0`.
    pub fn from_frame(data: &DataFrame) -> Result<Self> {
        let cash = latest_balance_value(data, LineItem::CashAndEquivalents)?.unwrap_or_else(|| {
            warn!("no cash data found, using 0");
            0.0
        });
        let debt = latest_balance_value(data, LineItem::TotalDebt)?.unwrap_or_else(|| {
            warn!("no debt data found, using 0");
            0.0
        });
        Ok(Self { cash, debt })
    }
}
