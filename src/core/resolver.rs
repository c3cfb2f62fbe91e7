use crate::core::adjustments::{apply_adjustments, effective_weight, Adjustments};
use crate::core::catalog::CatalogSnapshot;
use crate::core::margin::compute_margin;
use crate::domain::quote::{PricingNotice, PricingPolicy, Quote, ResolutionRequest};
use crate::utils::error::{PricingError, ResolutionFailure, ResolutionStep};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Entry point for pricing a single shipment against one catalog snapshot.
///
/// Resolution is a strict chain: service and carrier checks, request
/// validation and effective weight, band lookup, surcharge and discounts,
/// margin. Arithmetic is checked, so implausible catalog amounts fail the
/// step they overflow in instead of panicking. The first failing step ends the chain and is named in the
/// returned [`ResolutionFailure`]. Holds no mutable state, so one resolver
/// can serve any number of threads.
#[derive(Debug, Clone)]
pub struct RateResolver {
    snapshot: Arc<CatalogSnapshot>,
    policy: PricingPolicy,
}

impl RateResolver {
    pub fn new(snapshot: Arc<CatalogSnapshot>, policy: PricingPolicy) -> Self {
        Self { snapshot, policy }
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    pub fn resolve(&self, request: &ResolutionRequest) -> Result<Quote, ResolutionFailure> {
        let fail = |step: ResolutionStep| move |error: PricingError| ResolutionFailure::new(step, error);

        let service = self
            .snapshot
            .service(&request.service_id)
            .ok_or_else(|| PricingError::UnknownService {
                service_id: request.service_id.clone(),
            })
            .map_err(fail(ResolutionStep::ServiceLookup))?;
        if !service.is_active {
            return Err(fail(ResolutionStep::ServiceLookup)(
                PricingError::ServiceInactive {
                    service_id: service.id.clone(),
                },
            ));
        }

        let carrier = self
            .snapshot
            .carrier(&service.carrier_id)
            .ok_or_else(|| PricingError::UnknownCarrier {
                carrier_id: service.carrier_id.clone(),
                service_id: service.id.clone(),
            })
            .map_err(fail(ResolutionStep::CarrierCheck))?;
        if !carrier.is_active {
            return Err(fail(ResolutionStep::CarrierCheck)(
                PricingError::CarrierInactive {
                    carrier_id: carrier.id.clone(),
                    service_id: service.id.clone(),
                },
            ));
        }

        validate_request(request).map_err(fail(ResolutionStep::EffectiveWeight))?;
        let (weight, weight_basis) = effective_weight(carrier, request);

        let band = self
            .snapshot
            .band_index(&service.id)
            .and_then(|index| index.find_band(weight))
            .map_err(fail(ResolutionStep::BandLookup))?
            .clone();

        // an explicit percentage on the request overrides the catalog promotion
        let promotional_discount_pct = request.promotional_discount_pct.or_else(|| {
            service
                .promotion
                .as_ref()
                .filter(|promotion| promotion.is_active)
                .map(|promotion| promotion.percentage)
        });

        let adjustments = Adjustments {
            fuel_surcharge_pct: carrier.fuel_surcharge_pct,
            volume_discount: service.volume_discount.clone(),
            shipment_volume: request.volume,
            promotional_discount_pct,
        };
        let pricing = apply_adjustments(band.retail_price, &adjustments, &self.policy)
            .map_err(fail(ResolutionStep::Adjustments))?;

        let margin = compute_margin(pricing.final_price, band.purchase_price, &self.policy)
            .map_err(fail(ResolutionStep::Margin))?;

        let mut notices = Vec::new();
        if let Some(clamp) = pricing.clamp {
            notices.push(PricingNotice::PriceClampedToZero {
                unclamped_price: clamp.unclamped_price,
            });
        }
        if band.purchase_price > band.retail_price {
            notices.push(PricingNotice::NegativeBandMargin {
                purchase_price: band.purchase_price,
                retail_price: band.retail_price,
            });
        }

        tracing::debug!(
            service = %service.id,
            weight = %weight,
            basis = weight_basis.as_str(),
            final_price = %pricing.final_price,
            margin = %margin.margin,
            "Resolved quote"
        );

        Ok(Quote {
            service_id: service.id.clone(),
            carrier_id: carrier.id.clone(),
            requested_weight: request.weight,
            effective_weight: weight,
            weight_basis,
            band,
            pricing,
            margin,
            notices,
        })
    }
}

fn validate_request(request: &ResolutionRequest) -> Result<(), PricingError> {
    let negative = |field: &str| PricingError::InvalidRequest {
        field: field.to_string(),
        reason: "must not be negative".to_string(),
    };

    if request.weight < Decimal::ZERO {
        return Err(negative("weight"));
    }
    if request.volume.is_some_and(|v| v < Decimal::ZERO) {
        return Err(negative("volume"));
    }
    if request.volumetric_weight.is_some_and(|v| v < Decimal::ZERO) {
        return Err(negative("volumetric_weight"));
    }
    Ok(())
}
