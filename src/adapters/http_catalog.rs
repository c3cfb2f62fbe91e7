use crate::core::CatalogSource;
use crate::domain::catalog::Catalog;
use crate::utils::error::{EngineError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// The backend answers either with a bare array or with `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Wrapped { data: items } => items,
        }
    }
}

/// Pulls carriers, services and rates from the backend's REST endpoints.
pub struct HttpCatalogSource {
    client: Client,
    base_url: Url,
    settings: HttpSettings,
}

impl HttpCatalogSource {
    pub fn new(endpoint: &str, settings: HttpSettings) -> Result<Self> {
        let mut base_url = Url::parse(endpoint).map_err(|e| EngineError::InvalidConfigValueError {
            field: "catalog.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        // keep the last path segment when joining resources
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    async fn get_listing<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>> {
        let url = self
            .base_url
            .join(resource)
            .map_err(|e| EngineError::ConfigError {
                message: format!("Cannot build URL for {}: {}", resource, e),
            })?;

        let attempts = self.settings.retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            tracing::debug!("GET {} (attempt {}/{})", url, attempt, attempts);

            let outcome = match self.client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    let listing: Listing<T> = response.json().await?;
                    return Ok(listing.into_items());
                }
                Ok(response) if is_retryable(response.status()) => {
                    EngineError::CatalogError {
                        message: format!("{} answered {}", url, response.status()),
                    }
                }
                Ok(response) => {
                    return Err(EngineError::CatalogError {
                        message: format!("{} answered {}", url, response.status()),
                    });
                }
                Err(e) => EngineError::HttpError(e),
            };

            if attempt >= attempts {
                return Err(outcome);
            }
            tracing::warn!("{}; retrying in {:?}", outcome, self.settings.retry_delay);
            tokio::time::sleep(self.settings.retry_delay).await;
            attempt += 1;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_catalog(&self) -> Result<Catalog> {
        let carriers = self.get_listing("carriers").await?;
        let services = self.get_listing("services").await?;
        let rates = self.get_listing("rates").await?;

        Ok(Catalog {
            carriers,
            services,
            rates,
        })
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}
