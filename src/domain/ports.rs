use crate::domain::catalog::Catalog;
use crate::domain::model::{BatchResult, QuoteLine};
use crate::domain::quote::PricingPolicy;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn requests_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn archive_name(&self) -> &str;
    fn pricing_policy(&self) -> PricingPolicy;
}

/// Supplies the carrier/service/rate data the engine prices against.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Catalog>;

    /// Human-readable origin for log lines.
    fn describe(&self) -> String;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<QuoteLine>>;
    async fn transform(&self, lines: Vec<QuoteLine>) -> Result<BatchResult>;
    async fn load(&self, result: BatchResult) -> Result<String>;
}
