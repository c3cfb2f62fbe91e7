use crate::core::band_index::BandIndex;
use crate::domain::catalog::{Carrier, Catalog, RateBand, Service};
use crate::domain::ports::CatalogSource;
use crate::utils::error::{PricingError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Validated, read-only view of a catalog. Band sets are indexed per
/// service at build time; a service whose bands fail validation keeps the
/// error so only that service stops pricing.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    carriers: HashMap<String, Carrier>,
    services: HashMap<String, Service>,
    indexes: HashMap<String, std::result::Result<BandIndex, PricingError>>,
}

impl CatalogSnapshot {
    pub fn build(catalog: Catalog) -> Self {
        let mut carriers = HashMap::with_capacity(catalog.carriers.len());
        for carrier in catalog.carriers {
            if let Some(previous) = carriers.insert(carrier.id.clone(), carrier) {
                tracing::warn!(carrier = %previous.id, "Duplicate carrier id, keeping the last one");
            }
        }

        let mut services = HashMap::with_capacity(catalog.services.len());
        for service in catalog.services {
            if !carriers.contains_key(&service.carrier_id) {
                tracing::warn!(
                    service = %service.id,
                    carrier = %service.carrier_id,
                    "Service references an unknown carrier"
                );
            }
            if let Some(previous) = services.insert(service.id.clone(), service) {
                tracing::warn!(service = %previous.id, "Duplicate service id, keeping the last one");
            }
        }

        let mut grouped: HashMap<String, Vec<RateBand>> = HashMap::new();
        for band in catalog.rates {
            if !services.contains_key(&band.service_id) {
                tracing::warn!(service = %band.service_id, "Dropping rate band of unknown service");
                continue;
            }
            if band.is_active && band.purchase_price > band.retail_price {
                tracing::warn!(
                    service = %band.service_id,
                    bounds = %band.bounds(),
                    "Rate band sells below purchase price"
                );
            }
            grouped.entry(band.service_id.clone()).or_default().push(band);
        }

        let indexes = services
            .keys()
            .map(|service_id| {
                let bands = grouped.remove(service_id).unwrap_or_default();
                let index = BandIndex::build(service_id, bands);
                if let Err(e) = &index {
                    tracing::warn!("{}", e);
                }
                (service_id.clone(), index)
            })
            .collect();

        tracing::debug!(
            carriers = carriers.len(),
            services = services.len(),
            "Catalog snapshot built"
        );

        Self {
            carriers,
            services,
            indexes,
        }
    }

    pub fn carrier(&self, carrier_id: &str) -> Option<&Carrier> {
        self.carriers.get(carrier_id)
    }

    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.get(service_id)
    }

    pub fn band_index(&self, service_id: &str) -> std::result::Result<&BandIndex, PricingError> {
        match self.indexes.get(service_id) {
            Some(Ok(index)) => Ok(index),
            Some(Err(e)) => Err(e.clone()),
            None => Err(PricingError::UnknownService {
                service_id: service_id.to_string(),
            }),
        }
    }

    pub fn carrier_count(&self) -> usize {
        self.carriers.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Services that cannot be priced because their band sets are invalid,
    /// sorted by service id.
    pub fn invalid_band_sets(&self) -> Vec<&PricingError> {
        let mut errors: Vec<(&String, &PricingError)> = self
            .indexes
            .iter()
            .filter_map(|(id, index)| index.as_ref().err().map(|e| (id, e)))
            .collect();
        errors.sort_by(|a, b| a.0.cmp(b.0));
        errors.into_iter().map(|(_, e)| e).collect()
    }
}

/// Shared pointer to the current snapshot. Publishing builds the new
/// snapshot first and then swaps it in; readers holding an older `Arc` keep
/// a consistent view until they call `current` again.
#[derive(Debug, Clone, Default)]
pub struct CatalogHandle {
    current: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

impl CatalogHandle {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    pub fn current(&self) -> Arc<CatalogSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn publish(&self, catalog: Catalog) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(CatalogSnapshot::build(catalog));
        match self.current.write() {
            Ok(mut guard) => *guard = Arc::clone(&snapshot),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&snapshot),
        }
        snapshot
    }

    pub async fn refresh(&self, source: &dyn CatalogSource) -> Result<Arc<CatalogSnapshot>> {
        tracing::info!("📥 Loading catalog from {}", source.describe());
        let catalog = source.fetch_catalog().await?;
        tracing::info!(
            "Fetched {} carriers, {} services, {} rate bands",
            catalog.carriers.len(),
            catalog.services.len(),
            catalog.rates.len()
        );
        Ok(self.publish(catalog))
    }
}
