//! Per-year rate inputs.
//!
//! Forecast assumptions may be given as a single value broadcast across the
//! horizon, an explicit per-year list, or a generator evaluated at each year
//! index. Every form resolves once, eagerly, to exactly `horizon` values.

use crate::{MemoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Generator evaluated at year indices `0..horizon`.
pub type RateFn = Arc<dyn Fn(usize) -> f64 + Send + Sync>;

/// A per-year rate assumption.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateSpec {
    /// Same value every year
    Scalar(f64),
    /// One value per forecast year
    List(Vec<f64>),
    /// Value computed from the zero-based year index
    #[serde(skip)]
    Generator(RateFn),
}

impl RateSpec {
    /// Wrap a closure as a generator.
    pub fn generator(f: impl Fn(usize) -> f64 + Send + Sync + 'static) -> Self {
        Self::Generator(Arc::new(f))
    }

    /// Check the assumption against a forecast horizon.
    ///
    /// Lists must match the horizon exactly and literal values must be finite.
    /// Generators are only checked when resolved.
    pub fn validate(&self, horizon: usize, name: &str) -> Result<()> {
        match self {
            Self::Scalar(v) if !v.is_finite() => Err(MemoError::Configuration(format!(
                "{name} must be finite, got {v}"
            ))),
            Self::List(values) if values.len() != horizon => {
                Err(MemoError::Configuration(format!(
                    "{name} list length ({}) must match horizon_years ({horizon})",
                    values.len()
                )))
            }
            Self::List(values) if values.iter().any(|v| !v.is_finite()) => Err(
                MemoError::Configuration(format!("{name} values must be finite")),
            ),
            _ => Ok(()),
        }
    }

    /// Resolve to exactly `horizon` values.
    ///
    /// A list shorter than the horizon is a configuration error rather than
    /// being padded with fallback values.
    pub fn resolve(&self, horizon: usize, name: &str) -> Result<Vec<f64>> {
        match self {
            Self::Scalar(v) => Ok(vec![*v; horizon]),
            Self::List(values) if values.len() < horizon => {
                Err(MemoError::Configuration(format!(
                    "{name} has {} values but the horizon is {horizon} years",
                    values.len()
                )))
            }
            Self::List(values) => Ok(values[..horizon].to_vec()),
            Self::Generator(f) => Ok((0..horizon).map(|i| f(i)).collect()),
        }
    }
}

impl fmt::Debug for RateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Self::List(values) => f.debug_tuple("List").field(values).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl From<f64> for RateSpec {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<f64>> for RateSpec {
    fn from(values: Vec<f64>) -> Self {
        Self::List(values)
    }
}

/// Source of the forecast operating margin, in percent of revenue.
///
/// Operating margin and operating income as a percentage of revenue are the
/// same quantity; when building a forecast, an explicit operating income
/// percentage takes priority, then an explicit margin, then the trailing
/// historical average.
#[derive(Debug, Clone)]
pub enum MarginSpec {
    /// Operating margin per year
    Margin(RateSpec),
    /// Operating income as a percentage of revenue per year
    OperatingIncomePct(RateSpec),
    /// Mean of the most recent historical operating margins
    TrailingAverage,
}

impl MarginSpec {
    /// Rates carried by this margin source, if any.
    pub const fn rates(&self) -> Option<&RateSpec> {
        match self {
            Self::Margin(rates) | Self::OperatingIncomePct(rates) => Some(rates),
            Self::TrailingAverage => None,
        }
    }

    /// Configuration key this margin source is read from.
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Margin(_) => "operating_margin",
            Self::OperatingIncomePct(_) => "operating_income_pct_revenue",
            Self::TrailingAverage => "trailing_margin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_broadcasts() {
        let spec = RateSpec::Scalar(0.05);
        assert_eq!(spec.resolve(3, "revenue_growth").unwrap(), vec![0.05; 3]);
    }

    #[test]
    fn test_list_used_as_is() {
        let spec = RateSpec::from(vec![0.10, 0.08, 0.06]);
        assert!(spec.validate(3, "revenue_growth").is_ok());
        assert_eq!(spec.resolve(3, "revenue_growth").unwrap(), vec![0.10, 0.08, 0.06]);
    }

    #[test]
    fn test_generator_evaluated_per_index() {
        let spec = RateSpec::generator(|i| 0.10 - 0.02 * i as f64);
        let rates = spec.resolve(4, "revenue_growth").unwrap();
        assert_eq!(rates.len(), 4);
        assert!((rates[0] - 0.10).abs() < 1e-12);
        assert!((rates[3] - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_short_list_rejected() {
        let spec = RateSpec::List(vec![5.0, 5.0]);
        assert!(spec.validate(5, "capex_pct_revenue").is_err());

        let err = spec.resolve(5, "capex_pct_revenue").unwrap_err();
        assert!(matches!(err, MemoError::Configuration(_)));
    }

    #[test]
    fn test_non_finite_scalar_rejected() {
        assert!(RateSpec::Scalar(f64::NAN).validate(5, "growth").is_err());
    }

    #[test]
    fn test_deserialize_untagged() {
        let scalar: RateSpec = serde_json::from_str("0.05").unwrap();
        assert!(matches!(scalar, RateSpec::Scalar(v) if v == 0.05));

        let list: RateSpec = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert!(matches!(list, RateSpec::List(ref v) if v.len() == 2));
    }

    #[test]
    fn test_margin_spec_field_names() {
        assert_eq!(MarginSpec::Margin(0.0.into()).field_name(), "operating_margin");
        assert!(MarginSpec::TrailingAverage.rates().is_none());
    }
}
