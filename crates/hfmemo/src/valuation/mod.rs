//! Free cash flow, DCF and equity valuation.

pub mod dcf;
pub mod equity;
pub mod fcff;

pub use dcf::{DcfResult, dcf};
pub use equity::{EquityResult, equity_value};
pub use fcff::{FcffPoint, FcffSeries, fcff, fcff_frame};
