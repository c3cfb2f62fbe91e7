use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
    #[serde(default, alias = "fuelSurcharge", alias = "fuelSurchargePct")]
    pub fuel_surcharge_pct: Decimal,
    #[serde(default, alias = "isVolumetric")]
    pub is_volumetric: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Destination {
    #[default]
    National,
    International { country: String },
}

/// Percentage off once a shipment reaches `minimum_volume`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDiscount {
    #[serde(alias = "minimumVolume")]
    pub minimum_volume: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub percentage: Decimal,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(alias = "carrierId")]
    pub carrier_id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "deliveryTimeMin")]
    pub delivery_days_min: Option<u32>,
    #[serde(default, alias = "deliveryTimeMax")]
    pub delivery_days_max: Option<u32>,
    #[serde(default)]
    pub destination: Destination,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
    #[serde(default, alias = "volumeDiscount")]
    pub volume_discount: Option<VolumeDiscount>,
    #[serde(default)]
    pub promotion: Option<Promotion>,
}

/// Half-open weight interval `[weight_min, weight_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandBounds {
    pub weight_min: Decimal,
    pub weight_max: Decimal,
}

impl fmt::Display for BandBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.weight_min, self.weight_max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBand {
    #[serde(alias = "serviceId")]
    pub service_id: String,
    #[serde(alias = "weightMin")]
    pub weight_min: Decimal,
    #[serde(alias = "weightMax")]
    pub weight_max: Decimal,
    #[serde(alias = "purchasePrice")]
    pub purchase_price: Decimal,
    #[serde(alias = "retailPrice")]
    pub retail_price: Decimal,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
}

impl RateBand {
    pub fn bounds(&self) -> BandBounds {
        BandBounds {
            weight_min: self.weight_min,
            weight_max: self.weight_max,
        }
    }

    pub fn contains(&self, weight: Decimal) -> bool {
        self.weight_min <= weight && weight < self.weight_max
    }

    /// Retail minus purchase before any surcharge or discount.
    pub fn list_margin(&self) -> Decimal {
        self.retail_price - self.purchase_price
    }
}

/// Raw catalog input as supplied by the backend or an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub carriers: Vec<Carrier>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub rates: Vec<RateBand>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_band_accepts_backend_field_names() {
        let band: RateBand = serde_json::from_value(serde_json::json!({
            "serviceId": "std",
            "weightMin": 0,
            "weightMax": "2",
            "purchasePrice": 5.6,
            "retailPrice": "7.00"
        }))
        .unwrap();

        assert_eq!(band.service_id, "std");
        assert_eq!(band.weight_max, Decimal::from(2));
        assert_eq!(band.purchase_price, Decimal::new(56, 1));
        assert!(band.is_active);
        assert!(band.contains(Decimal::ZERO));
        assert!(!band.contains(Decimal::from(2)));
        assert_eq!(band.list_margin(), Decimal::new(140, 2));
    }

    #[test]
    fn test_destination_is_tagged_by_scope() {
        let service: Service = serde_json::from_value(serde_json::json!({
            "id": "intl",
            "carrier_id": "dhl",
            "destination": {"scope": "international", "country": "FR"}
        }))
        .unwrap();

        assert_eq!(
            service.destination,
            Destination::International {
                country: "FR".to_string()
            }
        );
        assert!(service.is_active);
        assert!(service.promotion.is_none());
    }
}
