pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::storage::LocalStorage;
pub use core::{
    batch::BatchQuotePipeline,
    catalog::{CatalogHandle, CatalogSnapshot},
    engine::QuoteEngine,
    resolver::RateResolver,
};
pub use domain::catalog::{Carrier, Catalog, RateBand, Service};
pub use domain::quote::{MarginPercentage, PricingPolicy, Quote, ResolutionRequest};
pub use utils::error::{EngineError, PricingError, ResolutionFailure, Result};
