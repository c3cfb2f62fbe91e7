pub mod adjustments;
pub mod band_index;
pub mod batch;
pub mod catalog;
pub mod engine;
pub mod margin;
pub mod resolver;

pub use crate::domain::model::{BatchResult, BatchSummary, QuoteLine, QuoteOutcome};
pub use crate::domain::ports::{CatalogSource, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
