use crate::adapters::http_catalog::HttpSettings;
use crate::core::ConfigProvider;
use crate::domain::quote::{MarginThresholds, PricingPolicy};
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_range,
    validate_required_field, validate_url, Validate,
};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    pub batch: BatchConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSourceKind {
    Csv,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub source: CatalogSourceKind,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_currency_scale")]
    pub currency_scale: u32,
    #[serde(default = "default_margin_high")]
    pub margin_high: Decimal,
    #[serde(default = "default_margin_medium")]
    pub margin_medium: Decimal,
    #[serde(default)]
    pub strict_price_floor: bool,
}

fn default_currency_scale() -> u32 {
    2
}

fn default_margin_high() -> Decimal {
    MarginThresholds::default().high
}

fn default_margin_medium() -> Decimal {
    MarginThresholds::default().medium
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency_scale: default_currency_scale(),
            margin_high: default_margin_high(),
            margin_medium: default_margin_medium(),
            strict_price_floor: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub requests_file: String,
    pub output_path: String,
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

fn default_archive_name() -> String {
    "quotes.zip".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<LogFormat>,
}

impl TomlConfig {
    /// Loads and parses a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EngineError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EngineError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EngineError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        match self.catalog.source {
            CatalogSourceKind::Http => {
                let endpoint = validate_required_field("catalog.endpoint", &self.catalog.endpoint)?;
                validate_url("catalog.endpoint", endpoint)?;
            }
            CatalogSourceKind::Csv => {
                let path = validate_required_field("catalog.path", &self.catalog.path)?;
                validate_path("catalog.path", path)?;
            }
        }
        if let Some(attempts) = self.catalog.retry_attempts {
            validate_range("catalog.retry_attempts", attempts, 1, 10)?;
        }

        validate_range("pricing.currency_scale", self.pricing.currency_scale, 0, 6)?;
        validate_range(
            "pricing.margin_medium",
            self.pricing.margin_medium,
            Decimal::ZERO,
            self.pricing.margin_high,
        )?;

        validate_path("batch.requests_file", &self.batch.requests_file)?;
        validate_file_extensions(
            "batch.requests_file",
            std::slice::from_ref(&self.batch.requests_file),
            &["csv"],
        )?;
        validate_path("batch.output_path", &self.batch.output_path)?;
        validate_non_empty_string("batch.archive_name", &self.batch.archive_name)?;

        Ok(())
    }

    pub fn catalog_endpoint(&self) -> Option<&str> {
        match self.catalog.source {
            CatalogSourceKind::Http => self.catalog.endpoint.as_deref(),
            CatalogSourceKind::Csv => None,
        }
    }

    pub fn catalog_dir(&self) -> &str {
        self.catalog.path.as_deref().unwrap_or("./catalog")
    }

    pub fn http_settings(&self) -> HttpSettings {
        let defaults = HttpSettings::default();
        HttpSettings {
            timeout: self
                .catalog
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retry_attempts: self.catalog.retry_attempts.unwrap_or(defaults.retry_attempts),
            retry_delay: self
                .catalog
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_format(&self) -> LogFormat {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format)
            .unwrap_or(LogFormat::Compact)
    }
}

impl ConfigProvider for TomlConfig {
    fn requests_file(&self) -> &str {
        &self.batch.requests_file
    }

    fn output_path(&self) -> &str {
        &self.batch.output_path
    }

    fn archive_name(&self) -> &str {
        &self.batch.archive_name
    }

    fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            currency_scale: self.pricing.currency_scale,
            margin_thresholds: MarginThresholds {
                high: self.pricing.margin_high,
                medium: self.pricing.margin_medium,
            },
            strict_price_floor: self.pricing.strict_price_floor,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[catalog]
source = "csv"
path = "./catalog"

[pricing]
currency_scale = 2
margin_high = 12
margin_medium = "4.5"
strict_price_floor = true

[batch]
requests_file = "requests.csv"
output_path = "./out"
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.catalog.source, CatalogSourceKind::Csv);
        assert_eq!(config.catalog_endpoint(), None);
        assert_eq!(config.catalog_dir(), "./catalog");
        assert_eq!(config.archive_name(), "quotes.zip");

        let policy = config.pricing_policy();
        assert_eq!(policy.margin_thresholds.high, Decimal::from(12));
        assert_eq!(policy.margin_thresholds.medium, Decimal::new(45, 1));
        assert!(policy.strict_price_floor);
        assert!(config.validate().is_ok());
        assert!(!config.monitoring_enabled());
        assert_eq!(config.log_format(), LogFormat::Compact);
    }

    #[test]
    fn test_pricing_section_is_optional() {
        let config = TomlConfig::from_toml_str(
            r#"
[catalog]
source = "csv"
path = "./catalog"

[batch]
requests_file = "requests.csv"
output_path = "./out"
"#,
        )
        .unwrap();

        assert_eq!(config.pricing_policy(), PricingPolicy::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RATE_ENGINE_TEST_BACKEND", "https://backend.test/api");

        let config = TomlConfig::from_toml_str(
            r#"
[catalog]
source = "http"
endpoint = "${RATE_ENGINE_TEST_BACKEND}"
retry_attempts = 2
retry_delay_ms = 10

[batch]
requests_file = "requests.csv"
output_path = "./out"
"#,
        )
        .unwrap();

        assert_eq!(config.catalog_endpoint(), Some("https://backend.test/api"));
        assert_eq!(config.http_settings().retry_attempts, 2);
        assert_eq!(config.http_settings().retry_delay, Duration::from_millis(10));
        assert!(config.validate().is_ok());

        std::env::remove_var("RATE_ENGINE_TEST_BACKEND");
    }

    #[test]
    fn test_http_source_requires_endpoint() {
        let config = TomlConfig::from_toml_str(
            r#"
[catalog]
source = "http"

[batch]
requests_file = "requests.csv"
output_path = "./out"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(EngineError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_inverted_margin_thresholds_are_rejected() {
        let config = TomlConfig::from_toml_str(&BASIC.replace("margin_medium = \"4.5\"", "margin_medium = 20")).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.requests_file(), "requests.csv");
        assert_eq!(config.output_path(), "./out");
    }
}
