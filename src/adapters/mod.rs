// Adapters layer: concrete implementations of the domain ports (storage, catalog sources).

pub mod csv_catalog;
pub mod http_catalog;
pub mod storage;

use crate::core::CatalogSource;
use crate::utils::error::Result;
use csv_catalog::CsvCatalogSource;
use http_catalog::{HttpCatalogSource, HttpSettings};
use storage::LocalStorage;

/// Picks the backend when an endpoint is configured, the CSV export otherwise.
pub fn catalog_source(
    endpoint: Option<&str>,
    catalog_dir: &str,
    settings: HttpSettings,
) -> Result<Box<dyn CatalogSource>> {
    match endpoint {
        Some(endpoint) => Ok(Box::new(HttpCatalogSource::new(endpoint, settings)?)),
        None => Ok(Box::new(CsvCatalogSource::new(
            LocalStorage::new("."),
            catalog_dir,
        ))),
    }
}
