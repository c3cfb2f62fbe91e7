use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::domain::catalog::BandBounds;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Catalog error: {message}")]
    CatalogError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Quote resolution failed: {0}")]
    Resolution(#[from] ResolutionFailure),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Storage,
    Network,
    Data,
    Configuration,
    Pricing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::ZipError(_) | EngineError::IoError(_) => ErrorCategory::Storage,
            EngineError::HttpError(_) => ErrorCategory::Network,
            EngineError::CsvError(_)
            | EngineError::SerializationError(_)
            | EngineError::CatalogError { .. }
            | EngineError::ProcessingError { .. }
            | EngineError::ValidationError { .. } => ErrorCategory::Data,
            EngineError::ConfigError { .. }
            | EngineError::InvalidConfigValueError { .. }
            | EngineError::MissingConfigError { .. }
            | EngineError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EngineError::Resolution(_) => ErrorCategory::Pricing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::HttpError(_) => ErrorSeverity::Medium,
            EngineError::ZipError(_) | EngineError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EngineError::HttpError(_) => {
                "Check that the catalog backend is reachable and retry".to_string()
            }
            EngineError::IoError(_) | EngineError::ZipError(_) => {
                "Check file permissions and free disk space for the output path".to_string()
            }
            EngineError::CsvError(_) | EngineError::ValidationError { .. } => {
                "Fix the offending CSV row (see the line number above) and rerun".to_string()
            }
            EngineError::SerializationError(_) => {
                "The backend returned data in an unexpected shape; verify the API version"
                    .to_string()
            }
            EngineError::CatalogError { .. } => {
                "Review the carriers, services and rates data for consistency".to_string()
            }
            EngineError::ProcessingError { .. } => "Rerun with --verbose for details".to_string(),
            EngineError::ConfigError { .. }
            | EngineError::InvalidConfigValueError { .. }
            | EngineError::MissingConfigError { .. }
            | EngineError::ConfigValidationError { .. } => {
                "Correct the configuration value and try again".to_string()
            }
            EngineError::Resolution(failure) => failure.error.recovery_suggestion(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EngineError::HttpError(_) => "Could not download the rate catalog".to_string(),
            EngineError::IoError(e) => format!("File access failed: {}", e),
            EngineError::Resolution(failure) => failure.error.to_string(),
            other => other.to_string(),
        }
    }
}

/// Pricing adjustment a percentage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    FuelSurcharge,
    VolumeDiscount,
    PromotionalDiscount,
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdjustmentKind::FuelSurcharge => "fuel surcharge",
            AdjustmentKind::VolumeDiscount => "volume discount",
            AdjustmentKind::PromotionalDiscount => "promotional discount",
        };
        f.write_str(name)
    }
}

/// Business and data failures raised while pricing a shipment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("service '{service_id}' has an invalid rate band set: {reason}")]
    InvalidBandSet { service_id: String, reason: String },

    #[error("no rate band of service '{service_id}' covers weight {weight} (covered {covered}, nearest band {nearest})")]
    NoBandForWeight {
        service_id: String,
        weight: Decimal,
        covered: BandBounds,
        nearest: BandBounds,
    },

    #[error("carrier '{carrier_id}' of service '{service_id}' is inactive")]
    CarrierInactive {
        carrier_id: String,
        service_id: String,
    },

    #[error("{component} percentage {value} is out of range")]
    InvalidDiscount {
        component: AdjustmentKind,
        value: Decimal,
    },

    #[error("discounts drive the price to {unclamped_price}, below zero")]
    NegativePrice { unclamped_price: Decimal },

    #[error("service '{service_id}' does not exist")]
    UnknownService { service_id: String },

    #[error("carrier '{carrier_id}' referenced by service '{service_id}' does not exist")]
    UnknownCarrier {
        carrier_id: String,
        service_id: String,
    },

    #[error("service '{service_id}' is inactive")]
    ServiceInactive { service_id: String },

    #[error("invalid {field}: {reason}")]
    InvalidRequest { field: String, reason: String },

    #[error("amount overflow computing {operation}")]
    AmountOverflow { operation: String },
}

impl PricingError {
    /// Stable machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            PricingError::InvalidBandSet { .. } => "invalid_band_set",
            PricingError::NoBandForWeight { .. } => "no_band_for_weight",
            PricingError::CarrierInactive { .. } => "carrier_inactive",
            PricingError::InvalidDiscount { .. } => "invalid_discount",
            PricingError::NegativePrice { .. } => "negative_price",
            PricingError::UnknownService { .. } => "unknown_service",
            PricingError::UnknownCarrier { .. } => "unknown_carrier",
            PricingError::ServiceInactive { .. } => "service_inactive",
            PricingError::InvalidRequest { .. } => "invalid_request",
            PricingError::AmountOverflow { .. } => "amount_overflow",
        }
    }

    /// Whether a caller can fix the request and retry. Catalog integrity
    /// problems need the data corrected first.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PricingError::InvalidBandSet { .. }
                | PricingError::UnknownCarrier { .. }
                | PricingError::AmountOverflow { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PricingError::InvalidBandSet { .. } => {
                "Fix the gaps or overlaps in this service's rate bands".to_string()
            }
            PricingError::NoBandForWeight { nearest, .. } => {
                format!("Offer the nearest band {} or reject the shipment", nearest)
            }
            PricingError::CarrierInactive { .. } | PricingError::ServiceInactive { .. } => {
                "Choose an active service".to_string()
            }
            PricingError::InvalidDiscount { .. } => {
                "Discount percentages must be between 0 and 100".to_string()
            }
            PricingError::NegativePrice { .. } => {
                "Reduce the stacked discounts for this shipment".to_string()
            }
            PricingError::UnknownService { .. } | PricingError::UnknownCarrier { .. } => {
                "Refresh the catalog or check the service identifier".to_string()
            }
            PricingError::InvalidRequest { .. } => {
                "Weights and volumes must be zero or positive".to_string()
            }
            PricingError::AmountOverflow { .. } => {
                "Check the band prices and surcharge of this service for implausible values"
                    .to_string()
            }
        }
    }
}

/// Stage of the resolution pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStep {
    ServiceLookup,
    CarrierCheck,
    EffectiveWeight,
    BandLookup,
    Adjustments,
    Margin,
}

impl ResolutionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStep::ServiceLookup => "service_lookup",
            ResolutionStep::CarrierCheck => "carrier_check",
            ResolutionStep::EffectiveWeight => "effective_weight",
            ResolutionStep::BandLookup => "band_lookup",
            ResolutionStep::Adjustments => "adjustments",
            ResolutionStep::Margin => "margin",
        }
    }
}

impl fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only failure the resolver hands back: which step stopped the
/// pipeline and why.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{step} failed: {error}")]
pub struct ResolutionFailure {
    pub step: ResolutionStep,
    pub error: PricingError,
}

/// Wire shape of a [`ResolutionFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub step_failed: ResolutionStep,
    pub error_kind: String,
    pub message: String,
}

impl ResolutionFailure {
    pub fn new(step: ResolutionStep, error: PricingError) -> Self {
        Self { step, error }
    }

    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }

    pub fn report(&self) -> FailureReport {
        FailureReport {
            step_failed: self.step,
            error_kind: self.kind().to_string(),
            message: self.error.to_string(),
        }
    }
}

impl Serialize for ResolutionFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.report().serialize(serializer)
    }
}
