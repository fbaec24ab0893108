//! Canonical long-format schema for standardized financial facts.
//!
//! Every provider is mapped into one row per `(ticker, period_end, statement,
//! line_item)` observation. The table is carried as a polars [`DataFrame`] with
//! the columns listed in [`STANDARD_COLUMNS`].

use crate::{MemoError, Result};
use chrono::NaiveDate;
use derive_more::Display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Columns of the canonical table, in order.
pub const STANDARD_COLUMNS: [&str; 7] = [
    "ticker",
    "period_end",
    "statement",
    "line_item",
    "value",
    "currency",
    "source",
];

/// Financial statement a fact belongs to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementType {
    /// Income statement
    #[display("income")]
    Income,
    /// Balance sheet
    #[display("balance")]
    Balance,
    /// Cash flow statement
    #[display("cashflow")]
    Cashflow,
}

impl StatementType {
    /// All statement types in reporting order.
    pub const ALL: [Self; 3] = [Self::Income, Self::Balance, Self::Cashflow];

    /// Value stored in the `statement` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Balance => "balance",
            Self::Cashflow => "cashflow",
        }
    }
}

/// Recognized canonical line items.
///
/// Providers may emit additional items; only these are consumed downstream.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    /// Total revenue
    #[display("revenue")]
    Revenue,
    /// Operating income (EBIT)
    #[display("operating_income")]
    OperatingIncome,
    /// Net income
    #[display("net_income")]
    NetIncome,
    /// Cash from operations
    #[display("cfo")]
    Cfo,
    /// Capital expenditures, reported as a negative cash flow
    #[display("capex")]
    Capex,
    /// Cash and cash equivalents
    #[display("cash_and_equivalents")]
    CashAndEquivalents,
    /// Total debt
    #[display("total_debt")]
    TotalDebt,
}

impl LineItem {
    /// The full canonical vocabulary.
    pub const ALL: [Self; 7] = [
        Self::Revenue,
        Self::OperatingIncome,
        Self::NetIncome,
        Self::Cfo,
        Self::Capex,
        Self::CashAndEquivalents,
        Self::TotalDebt,
    ];

    /// Value stored in the `line_item` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::OperatingIncome => "operating_income",
            Self::NetIncome => "net_income",
            Self::Cfo => "cfo",
            Self::Capex => "capex",
            Self::CashAndEquivalents => "cash_and_equivalents",
            Self::TotalDebt => "total_debt",
        }
    }

    /// Statement this line item is reported on.
    pub const fn statement(&self) -> StatementType {
        match self {
            Self::Revenue | Self::OperatingIncome | Self::NetIncome => StatementType::Income,
            Self::Cfo | Self::Capex => StatementType::Cashflow,
            Self::CashAndEquivalents | Self::TotalDebt => StatementType::Balance,
        }
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "Total revenue",
            Self::OperatingIncome => "Operating income (EBIT)",
            Self::NetIncome => "Net income",
            Self::Cfo => "Cash from operations",
            Self::Capex => "Capital expenditures",
            Self::CashAndEquivalents => "Cash and cash equivalents",
            Self::TotalDebt => "Total debt",
        }
    }
}

/// One row of the canonical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedFact {
    /// Ticker symbol
    pub ticker: String,
    /// Period end date
    pub period_end: NaiveDate,
    /// Statement the fact was reported on
    pub statement: StatementType,
    /// Canonical line item
    pub line_item: LineItem,
    /// Reported value
    pub value: f64,
    /// ISO currency code
    pub currency: String,
    /// Provider identifier
    pub source: String,
}

impl StandardizedFact {
    /// Build a fact whose statement is implied by the line item.
    pub fn new(
        ticker: impl Into<String>,
        period_end: NaiveDate,
        line_item: LineItem,
        value: f64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            period_end,
            statement: line_item.statement(),
            line_item,
            value,
            currency: "USD".to_string(),
            source: "manual".to_string(),
        }
    }

    /// Override the provider identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Convert facts into a canonical table.
pub fn facts_to_frame(facts: &[StandardizedFact]) -> Result<DataFrame> {
    let tickers: Vec<&str> = facts.iter().map(|f| f.ticker.as_str()).collect();
    let periods: Vec<NaiveDate> = facts.iter().map(|f| f.period_end).collect();
    let statements: Vec<&str> = facts.iter().map(|f| f.statement.as_str()).collect();
    let line_items: Vec<&str> = facts.iter().map(|f| f.line_item.as_str()).collect();
    let values: Vec<f64> = facts.iter().map(|f| f.value).collect();
    let currencies: Vec<&str> = facts.iter().map(|f| f.currency.as_str()).collect();
    let sources: Vec<&str> = facts.iter().map(|f| f.source.as_str()).collect();

    let df = df![
        "ticker" => tickers,
        "period_end" => periods,
        "statement" => statements,
        "line_item" => line_items,
        "value" => values,
        "currency" => currencies,
        "source" => sources,
    ]?;

    Ok(df)
}

/// An empty table with the canonical columns and types.
pub fn empty_standard_frame() -> Result<DataFrame> {
    facts_to_frame(&[])
}

/// Check that a table carries every canonical column with the right type.
pub fn validate_standard_frame(df: &DataFrame) -> Result<()> {
    let missing: Vec<&str> = STANDARD_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();
    if !missing.is_empty() {
        return Err(MemoError::MissingColumn(missing.join(", ")));
    }

    for name in ["ticker", "statement", "line_item", "currency", "source"] {
        expect_dtype(df, name, "string", |dt| matches!(dt, DataType::String))?;
    }
    expect_dtype(df, "period_end", "date", |dt| {
        matches!(dt, DataType::Date | DataType::Datetime(_, _))
    })?;
    expect_dtype(df, "value", "numeric", |dt| {
        matches!(
            dt,
            DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
        )
    })?;

    Ok(())
}

fn expect_dtype(
    df: &DataFrame,
    name: &str,
    expected: &str,
    accepts: impl Fn(&DataType) -> bool,
) -> Result<()> {
    let dtype = df.column(name)?.dtype();
    if accepts(dtype) {
        Ok(())
    } else {
        Err(MemoError::InvalidColumnType {
            column: name.to_string(),
            expected: expected.to_string(),
            found: dtype.to_string(),
        })
    }
}

/// Most recent value of a balance-sheet line item, if any was reported.
pub fn latest_balance_value(df: &DataFrame, item: LineItem) -> Result<Option<f64>> {
    let result = df
        .clone()
        .lazy()
        .filter(
            col("statement")
                .eq(lit(StatementType::Balance.as_str()))
                .and(col("line_item").eq(lit(item.as_str()))),
        )
        .sort(["period_end"], SortMultipleOptions::default())
        .select([col("value").cast(DataType::Float64)])
        .collect()?;

    let values = result.column("value")?.f64()?;
    Ok(values.into_iter().flatten().last())
}
