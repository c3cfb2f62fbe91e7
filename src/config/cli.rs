use crate::adapters::http_catalog::HttpSettings;
use crate::core::ConfigProvider;
use crate::domain::quote::PricingPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_range,
    validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "rate-engine")]
#[command(about = "Price a batch of shipments against a carrier rate catalog")]
pub struct CliConfig {
    #[arg(long, default_value = "./catalog", help = "Directory holding carriers.csv, services.csv and rates.csv")]
    pub catalog_dir: String,

    #[arg(long, help = "Backend base URL; overrides --catalog-dir when set")]
    pub catalog_endpoint: Option<String>,

    #[arg(long, default_value = "requests.csv")]
    pub requests: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "quotes.zip")]
    pub archive_name: String,

    #[arg(long, help = "Reject quotes whose discounts exceed the price instead of clamping")]
    pub strict_price_floor: bool,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "3")]
    pub retry_attempts: u32,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl CliConfig {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_seconds),
            retry_attempts: self.retry_attempts,
            ..HttpSettings::default()
        }
    }
}

impl ConfigProvider for CliConfig {
    fn requests_file(&self) -> &str {
        &self.requests
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn archive_name(&self) -> &str {
        &self.archive_name
    }

    fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            strict_price_floor: self.strict_price_floor,
            ..PricingPolicy::default()
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match &self.catalog_endpoint {
            Some(endpoint) => validate_url("catalog_endpoint", endpoint)?,
            None => validate_path("catalog_dir", &self.catalog_dir)?,
        }
        validate_path("requests", &self.requests)?;
        validate_file_extensions("requests", std::slice::from_ref(&self.requests), &["csv"])?;
        validate_path("output_path", &self.output_path)?;
        validate_non_empty_string("archive_name", &self.archive_name)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 600)?;
        validate_range("retry_attempts", self.retry_attempts, 1, 10)?;
        Ok(())
    }
}
