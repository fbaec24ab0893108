//! Enterprise-to-equity bridge.

use serde::Serialize;

/// Equity value and, when a share count is known, value per share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityResult {
    /// `enterprise_value - debt + cash`
    pub equity_value: f64,
    /// Equity value per share; absent without a positive share count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_share: Option<f64>,
}

/// Convert enterprise value to equity value.
pub fn equity_value(
    enterprise_value: f64,
    cash: f64,
    debt: f64,
    shares_outstanding: Option<f64>,
) -> EquityResult {
    let equity_value = enterprise_value - debt + cash;
    let price_per_share = shares_outstanding
        .filter(|&shares| shares > 0.0)
        .map(|shares| equity_value / shares);

    EquityResult {
        equity_value,
        price_per_share,
    }
}
