//! Catalog import from the three CSV files the admin console exports:
//! `carriers.csv`, `services.csv` and `rates.csv`.

use crate::core::{CatalogSource, Storage};
use crate::domain::catalog::{Carrier, Catalog, Destination, Promotion, RateBand, Service, VolumeDiscount};
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{
    parse_bool_field, parse_decimal_field, parse_optional_decimal_field, validate_non_empty_string,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const CARRIERS_FILE: &str = "carriers.csv";
pub const SERVICES_FILE: &str = "services.csv";
pub const RATES_FILE: &str = "rates.csv";

#[derive(Debug, Deserialize)]
struct CarrierRow {
    id: String,
    name: Option<String>,
    is_active: Option<String>,
    fuel_surcharge_pct: Option<String>,
    is_volumetric: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceRow {
    id: String,
    carrier_id: String,
    code: Option<String>,
    name: Option<String>,
    description: Option<String>,
    delivery_days_min: Option<u32>,
    delivery_days_max: Option<u32>,
    destination_scope: Option<String>,
    destination_country: Option<String>,
    is_active: Option<String>,
    volume_minimum: Option<String>,
    volume_discount_pct: Option<String>,
    promotion_pct: Option<String>,
    promotion_active: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RateRow {
    service_id: String,
    weight_min: String,
    weight_max: String,
    purchase_price: String,
    retail_price: String,
    is_active: Option<String>,
}

pub struct CsvCatalogSource<S: Storage> {
    storage: S,
    directory: String,
}

impl<S: Storage> CsvCatalogSource<S> {
    pub fn new(storage: S, directory: impl Into<String>) -> Self {
        Self {
            storage,
            directory: directory.into(),
        }
    }

    async fn read_rows<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<(usize, T)>> {
        let path = format!("{}/{}", self.directory, file);
        let data = self.storage.read_file(&path).await?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_slice());

        let mut rows = Vec::new();
        for (idx, row) in reader.deserialize::<T>().enumerate() {
            rows.push((idx + 2, row?));
        }
        tracing::debug!("Read {} rows from {}", rows.len(), path);
        Ok(rows)
    }
}

fn carrier_from_row(line: usize, row: CarrierRow) -> Result<Carrier> {
    let at = |column: &str| format!("{}:{} {}", CARRIERS_FILE, line, column);
    validate_non_empty_string(&at("id"), &row.id)?;

    Ok(Carrier {
        name: row.name.unwrap_or_else(|| row.id.clone()),
        is_active: parse_bool_field(&at("is_active"), row.is_active.as_deref(), true)?,
        fuel_surcharge_pct: parse_optional_decimal_field(
            &at("fuel_surcharge_pct"),
            row.fuel_surcharge_pct.as_deref(),
        )?
        .unwrap_or_default(),
        is_volumetric: parse_bool_field(&at("is_volumetric"), row.is_volumetric.as_deref(), false)?,
        id: row.id,
    })
}

fn service_from_row(line: usize, row: ServiceRow) -> Result<Service> {
    let at = |column: &str| format!("{}:{} {}", SERVICES_FILE, line, column);
    validate_non_empty_string(&at("id"), &row.id)?;
    validate_non_empty_string(&at("carrier_id"), &row.carrier_id)?;

    let destination = match row.destination_scope.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("national") => Destination::National,
        Some("international") => Destination::International {
            country: row.destination_country.unwrap_or_default(),
        },
        Some(other) => {
            return Err(EngineError::ValidationError {
                message: format!("{}: unknown destination scope '{}'", at("destination_scope"), other),
            })
        }
    };

    let volume_minimum =
        parse_optional_decimal_field(&at("volume_minimum"), row.volume_minimum.as_deref())?;
    let volume_pct =
        parse_optional_decimal_field(&at("volume_discount_pct"), row.volume_discount_pct.as_deref())?;
    let volume_discount = match (volume_minimum, volume_pct) {
        (Some(minimum_volume), Some(percentage)) => Some(VolumeDiscount {
            minimum_volume,
            percentage,
        }),
        (None, None) => None,
        _ => {
            return Err(EngineError::ValidationError {
                message: format!(
                    "{}: volume_minimum and volume_discount_pct must be set together",
                    at("volume_discount_pct")
                ),
            })
        }
    };

    let promotion = parse_optional_decimal_field(&at("promotion_pct"), row.promotion_pct.as_deref())?
        .map(|percentage| {
            parse_bool_field(&at("promotion_active"), row.promotion_active.as_deref(), true)
                .map(|is_active| Promotion {
                    percentage,
                    is_active,
                })
        })
        .transpose()?;

    Ok(Service {
        code: row.code.unwrap_or_default(),
        name: row.name.unwrap_or_default(),
        description: row.description.unwrap_or_default(),
        delivery_days_min: row.delivery_days_min,
        delivery_days_max: row.delivery_days_max,
        destination,
        is_active: parse_bool_field(&at("is_active"), row.is_active.as_deref(), true)?,
        volume_discount,
        promotion,
        id: row.id,
        carrier_id: row.carrier_id,
    })
}

fn rate_from_row(line: usize, row: RateRow) -> Result<RateBand> {
    let at = |column: &str| format!("{}:{} {}", RATES_FILE, line, column);
    validate_non_empty_string(&at("service_id"), &row.service_id)?;

    Ok(RateBand {
        weight_min: parse_decimal_field(&at("weight_min"), &row.weight_min)?,
        weight_max: parse_decimal_field(&at("weight_max"), &row.weight_max)?,
        purchase_price: parse_decimal_field(&at("purchase_price"), &row.purchase_price)?,
        retail_price: parse_decimal_field(&at("retail_price"), &row.retail_price)?,
        is_active: parse_bool_field(&at("is_active"), row.is_active.as_deref(), true)?,
        service_id: row.service_id,
    })
}

#[async_trait]
impl<S: Storage> CatalogSource for CsvCatalogSource<S> {
    async fn fetch_catalog(&self) -> Result<Catalog> {
        let carriers = self
            .read_rows::<CarrierRow>(CARRIERS_FILE)
            .await?
            .into_iter()
            .map(|(line, row)| carrier_from_row(line, row))
            .collect::<Result<Vec<_>>>()?;

        let services = self
            .read_rows::<ServiceRow>(SERVICES_FILE)
            .await?
            .into_iter()
            .map(|(line, row)| service_from_row(line, row))
            .collect::<Result<Vec<_>>>()?;

        let rates = self
            .read_rows::<RateRow>(RATES_FILE)
            .await?
            .into_iter()
            .map(|(line, row)| rate_from_row(line, row))
            .collect::<Result<Vec<_>>>()?;

        Ok(Catalog {
            carriers,
            services,
            rates,
        })
    }

    fn describe(&self) -> String {
        format!("CSV files in {}", self.directory)
    }
}
