//! Discounted cash flow with a Gordon-growth terminal value.

use super::fcff::FcffSeries;
use crate::{MemoError, Result};
use serde::Serialize;

/// Components of a DCF valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DcfResult {
    /// Present value of the explicit forecast cash flows
    pub pv_explicit: f64,
    /// Terminal value at the end of the horizon
    pub terminal_value: f64,
    /// Present value of the terminal value
    pub pv_terminal: f64,
    /// `pv_explicit + pv_terminal`
    pub enterprise_value: f64,
}

/// Discount an FCFF series to enterprise value.
///
/// Cash flows are discounted at the end of each period, the first one a full
/// period. The terminal value is a Gordon-growth perpetuity on
/// `terminal_fcff`, defaulting to the final FCFF, discounted with the final
/// period's factor.
///
/// # Formula
///
/// ```text
/// pv_explicit      = sum(fcff[i] / (1 + r)^i, i = 1..=n)
/// terminal_value   = terminal_fcff * (1 + g) / (r - g)
/// pv_terminal      = terminal_value / (1 + r)^n
/// enterprise_value = pv_explicit + pv_terminal
/// ```
///
/// # Data Requirements
///
/// - a non-empty FCFF series in period order
/// - `discount_rate > terminal_growth`
///
/// # Example
///
/// ```rust,ignore
/// use hfmemo::{FcffSeries, dcf};
///
/// let fcff = FcffSeries::from_pairs(periods.into_iter().zip([80.0, 88.0, 96.0, 104.0, 112.0]));
/// let result = dcf(&fcff, 0.10, 0.025, None)?;
/// // terminal_value = 112 * 1.025 / 0.075 = 1530.67
/// assert!((result.terminal_value - 1530.67).abs() < 0.01);
/// ```
///
/// # Errors
///
/// Returns [`MemoError::Data`] for an empty series and
/// [`MemoError::NumericalDegeneracy`] unless `discount_rate > terminal_growth`.
pub fn dcf(
    fcff: &FcffSeries,
    discount_rate: f64,
    terminal_growth: f64,
    terminal_fcff: Option<f64>,
) -> Result<DcfResult> {
    let degenerate = || MemoError::NumericalDegeneracy {
        discount_rate,
        terminal_growth,
    };

    let last = fcff
        .last()
        .ok_or_else(|| MemoError::Data("cannot discount an empty FCFF series".to_string()))?;
    if discount_rate <= terminal_growth {
        return Err(degenerate());
    }

    let factor = 1.0 + discount_rate;
    let pv_explicit: f64 = fcff
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| p.fcff / factor.powi(i as i32 + 1))
        .sum();

    let terminal_value =
        terminal_fcff.unwrap_or(last) * (1.0 + terminal_growth) / (discount_rate - terminal_growth);
    if !terminal_value.is_finite() {
        return Err(degenerate());
    }
    let pv_terminal = terminal_value / factor.powi(fcff.len() as i32);

    Ok(DcfResult {
        pv_explicit,
        terminal_value,
        pv_terminal,
        enterprise_value: pv_explicit + pv_terminal,
    })
}
