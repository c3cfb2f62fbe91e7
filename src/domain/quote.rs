use crate::domain::catalog::RateBand;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    pub service_id: String,
    pub weight: Decimal,
    /// Shipment quantity, compared against a service's volume discount threshold.
    #[serde(default)]
    pub volume: Option<Decimal>,
    /// Chargeable weight derived from dimensions by the caller.
    #[serde(default)]
    pub volumetric_weight: Option<Decimal>,
    #[serde(default)]
    pub promotional_discount_pct: Option<Decimal>,
}

impl ResolutionRequest {
    pub fn new(service_id: impl Into<String>, weight: Decimal) -> Self {
        Self {
            service_id: service_id.into(),
            weight,
            volume: None,
            volumetric_weight: None,
            promotional_discount_pct: None,
        }
    }

    pub fn with_volume(mut self, volume: Decimal) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_volumetric_weight(mut self, volumetric_weight: Decimal) -> Self {
        self.volumetric_weight = Some(volumetric_weight);
        self
    }

    pub fn with_promotion(mut self, percentage: Decimal) -> Self {
        self.promotional_discount_pct = Some(percentage);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightBasis {
    Actual,
    Volumetric,
}

impl WeightBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightBasis::Actual => "actual",
            WeightBasis::Volumetric => "volumetric",
        }
    }
}

/// Record of a final price that had to be floored at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceClamp {
    pub unclamped_price: Decimal,
}

/// Every adjustment applied to the band's retail price, in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: Decimal,
    pub fuel_surcharge_applied: Decimal,
    pub volume_discount_applied: Decimal,
    pub promotional_discount_applied: Decimal,
    pub final_price: Decimal,
    pub clamp: Option<PriceClamp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginPercentage {
    Percent(Decimal),
    /// The price charged is zero, so no ratio exists.
    NotApplicable,
}

impl MarginPercentage {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            MarginPercentage::Percent(value) => Some(*value),
            MarginPercentage::NotApplicable => None,
        }
    }

    pub fn is_comparable(&self) -> bool {
        matches!(self, MarginPercentage::Percent(_))
    }
}

impl fmt::Display for MarginPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginPercentage::Percent(value) => write!(f, "{:.2}", value),
            MarginPercentage::NotApplicable => f.write_str("n/a"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginClass {
    Low,
    Medium,
    High,
}

impl MarginClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarginClass::Low => "low",
            MarginClass::Medium => "medium",
            MarginClass::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginThresholds {
    pub high: Decimal,
    pub medium: Decimal,
}

impl MarginThresholds {
    pub fn classify(&self, margin: Decimal) -> MarginClass {
        if margin >= self.high {
            MarginClass::High
        } else if margin >= self.medium {
            MarginClass::Medium
        } else {
            MarginClass::Low
        }
    }
}

impl Default for MarginThresholds {
    fn default() -> Self {
        Self {
            high: Decimal::TEN,
            medium: Decimal::new(5, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginSummary {
    pub margin: Decimal,
    pub percentage: MarginPercentage,
    pub class: MarginClass,
}

/// Knobs the resolver reads; everything else about a quote comes from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Decimal places money amounts are rounded to.
    pub currency_scale: u32,
    pub margin_thresholds: MarginThresholds,
    /// Reject instead of clamping when discounts exceed the price.
    pub strict_price_floor: bool,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            currency_scale: 2,
            margin_thresholds: MarginThresholds::default(),
            strict_price_floor: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum PricingNotice {
    PriceClampedToZero { unclamped_price: Decimal },
    NegativeBandMargin {
        purchase_price: Decimal,
        retail_price: Decimal,
    },
}

/// A fully priced shipment. Holds copies of the catalog data it was priced
/// from, so republishing the catalog never changes an issued quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub service_id: String,
    pub carrier_id: String,
    pub requested_weight: Decimal,
    pub effective_weight: Decimal,
    pub weight_basis: WeightBasis,
    pub band: RateBand,
    pub pricing: PriceBreakdown,
    pub margin: MarginSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<PricingNotice>,
}

impl Quote {
    pub fn purchase_price(&self) -> Decimal {
        self.band.purchase_price
    }

    pub fn final_price(&self) -> Decimal {
        self.pricing.final_price
    }

    pub fn was_clamped(&self) -> bool {
        self.pricing.clamp.is_some()
    }
}
