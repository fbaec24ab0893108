//! Loading forecast configuration from YAML or JSON documents.

use super::forecast::{ForecastConfig, RawForecastConfig};
use crate::{MemoError, Result};
use std::path::Path;
use tracing::info;

/// Load a forecast configuration, or the built-in defaults when no path is given.
///
/// The format is chosen by extension: `.yaml`/`.yml` or `.json`. A file must
/// carry a `base`, `bull` and `bear` block, each naming a margin source; the
/// built-in scenario presets apply only when no file is given. Keys the loader
/// does not know are ignored.
///
/// # Errors
///
/// Returns [`MemoError::Io`] when the file cannot be read, a parse error for a
/// malformed document, and [`MemoError::Configuration`] for an unsupported
/// extension or invalid values.
pub fn load_config(path: Option<&Path>) -> Result<ForecastConfig> {
    let Some(path) = path else {
        return Ok(ForecastConfig::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let raw: RawForecastConfig = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)?,
        "json" => serde_json::from_str(&contents)?,
        other => {
            return Err(MemoError::Configuration(format!(
                "unsupported config file format: '.{other}'"
            )));
        }
    };

    let config = ForecastConfig::try_from(raw)?;
    info!(
        path = %path.display(),
        horizon_years = config.horizon_years(),
        "loaded forecast configuration"
    );
    Ok(config)
}

/// Parse a forecast configuration from a YAML string.
pub fn config_from_yaml(yaml: &str) -> Result<ForecastConfig> {
    let raw: RawForecastConfig = serde_yaml::from_str(yaml)?;
    ForecastConfig::try_from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MarginSpec, RateSpec};
    use std::io::Write;

    const YAML: &str = r#"
horizon_years: 3
base:
  discount_rate: 0.095
  terminal_growth: 0.02
  revenue_growth: [0.10, 0.08, 0.06]
  operating_margin: 20.0
  capex_pct_revenue: [4.0, 4.5, 5.0]
  nwc_pct_revenue: 2.0
bull:
  operating_income_pct_revenue: 22.0
bear:
  trailing_margin: true
"#;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_no_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.horizon_years(), 5);
    }

    #[test]
    fn test_load_yaml() {
        let file = write_temp(".yaml", YAML);
        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.horizon_years(), 3);
        assert_eq!(config.base().discount_rate(), 0.095);
        assert_eq!(config.base().nwc_pct_revenue(), 2.0);
        assert!(matches!(config.base().margin(), MarginSpec::Margin(RateSpec::Scalar(m)) if *m == 20.0));
        assert!(matches!(config.bull().margin(), MarginSpec::OperatingIncomePct(_)));
        assert!(matches!(config.bear().margin(), MarginSpec::TrailingAverage));
        // Omitted fields fall back to the generic defaults, not the bull preset.
        assert_eq!(config.bull().discount_rate(), 0.10);
    }

    #[test]
    fn test_load_json() {
        let file = write_temp(
            ".json",
            r#"{
                "horizon_years": 2,
                "base": {"revenue_growth": 0.03, "operating_margin": [10.0, 11.0]},
                "bull": {"operating_margin": 14.0},
                "bear": {"operating_margin": 8.0}
            }"#,
        );
        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.horizon_years(), 2);
        assert_eq!(
            config.base().revenue_growth().resolve(2, "revenue_growth").unwrap(),
            vec![0.03, 0.03]
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".toml", "horizon_years = 5");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("unsupported config file format"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/forecast.yaml"))).unwrap_err();
        assert!(matches!(err, MemoError::Io(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = config_from_yaml("base:\n  discount_rate: 1.5\n  operating_margin: 15.0\n").unwrap_err();
        assert!(err.to_string().contains("discount_rate must be between"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let yaml = format!("name: acme\nnotes: [a, b]\n{YAML}");
        let config = config_from_yaml(&yaml).unwrap();
        assert_eq!(config.horizon_years(), 3);
    }

    #[test]
    fn test_unknown_keys_in_scenario_block_ignored() {
        let yaml = YAML.replace("  nwc_pct_revenue: 2.0\n", "  nwc_pct_revenue: 2.0\n  analyst: jdoe\n");
        let config = config_from_yaml(&yaml).unwrap();
        assert_eq!(config.base().nwc_pct_revenue(), 2.0);
    }

    #[test]
    fn test_missing_scenario_block_rejected() {
        let yaml = YAML.replace("bear:\n  trailing_margin: true\n", "");
        let err = config_from_yaml(&yaml).unwrap_err();

        assert!(matches!(err, MemoError::Configuration(_)));
        assert!(err.to_string().contains(
            "bear scenario: either operating_margin or operating_income_pct_revenue must be provided"
        ));
    }

    #[test]
    fn test_partial_document_does_not_take_presets() {
        assert!(config_from_yaml("").is_err());
        let err = config_from_yaml("horizon_years: 3\n").unwrap_err();
        assert!(err.to_string().contains("base scenario"));
    }

    #[test]
    fn test_non_mapping_document_rejected() {
        assert!(config_from_yaml("- 1\n- 2\n").is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = config_from_yaml(YAML).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let again = config_from_yaml(&yaml).unwrap();
        assert_eq!(again.horizon_years(), 3);
        assert!(matches!(again.bear().margin(), MarginSpec::TrailingAverage));
    }
}
