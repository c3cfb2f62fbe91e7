//! Surcharge and discount resolution.
//!
//! Order is fixed: volumetric weight substitution (before band lookup), fuel
//! surcharge, volume discount, promotional discount. Both discounts are
//! taken as a share of the surcharged price and subtracted, so stacked
//! discounts above 100% push the price below zero and trigger the floor.

use crate::domain::catalog::{Carrier, VolumeDiscount};
use crate::domain::quote::{PriceBreakdown, PriceClamp, PricingPolicy, ResolutionRequest, WeightBasis};
use crate::utils::error::{AdjustmentKind, PricingError};
use rust_decimal::{Decimal, RoundingStrategy};

/// Inputs to [`apply_adjustments`] once the catalog and request have been
/// reconciled by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjustments {
    pub fuel_surcharge_pct: Decimal,
    pub volume_discount: Option<VolumeDiscount>,
    pub shipment_volume: Option<Decimal>,
    pub promotional_discount_pct: Option<Decimal>,
}

/// Weight handed to the band index. Volumetric weight only counts for
/// volumetric carriers and only when it exceeds the actual weight.
pub fn effective_weight(carrier: &Carrier, request: &ResolutionRequest) -> (Decimal, WeightBasis) {
    match request.volumetric_weight {
        Some(volumetric) if carrier.is_volumetric && volumetric > request.weight => {
            (volumetric, WeightBasis::Volumetric)
        }
        _ => (request.weight, WeightBasis::Actual),
    }
}

pub fn apply_adjustments(
    base_price: Decimal,
    adjustments: &Adjustments,
    policy: &PricingPolicy,
) -> Result<PriceBreakdown, PricingError> {
    check_percentage(
        AdjustmentKind::FuelSurcharge,
        adjustments.fuel_surcharge_pct,
        None,
    )?;
    if let Some(discount) = &adjustments.volume_discount {
        check_percentage(
            AdjustmentKind::VolumeDiscount,
            discount.percentage,
            Some(Decimal::ONE_HUNDRED),
        )?;
    }
    if let Some(pct) = adjustments.promotional_discount_pct {
        check_percentage(
            AdjustmentKind::PromotionalDiscount,
            pct,
            Some(Decimal::ONE_HUNDRED),
        )?;
    }

    let scale = policy.currency_scale;
    let base_price = round_money(base_price, scale);
    let fuel_surcharge_applied = share(base_price, adjustments.fuel_surcharge_pct, scale)
        .ok_or_else(|| overflow("fuel surcharge"))?;
    let surcharged = base_price
        .checked_add(fuel_surcharge_applied)
        .ok_or_else(|| overflow("surcharged price"))?;

    let volume_discount_applied = match (&adjustments.volume_discount, adjustments.shipment_volume)
    {
        (Some(discount), Some(volume)) if volume >= discount.minimum_volume => {
            share(surcharged, discount.percentage, scale)
                .ok_or_else(|| overflow("volume discount"))?
        }
        _ => Decimal::ZERO,
    };

    let promotional_discount_applied = match adjustments.promotional_discount_pct {
        Some(pct) => share(surcharged, pct, scale).ok_or_else(|| overflow("promotional discount"))?,
        None => Decimal::ZERO,
    };

    let unclamped = surcharged
        .checked_sub(volume_discount_applied)
        .and_then(|price| price.checked_sub(promotional_discount_applied))
        .ok_or_else(|| overflow("discounted price"))?;
    let (final_price, clamp) = if unclamped < Decimal::ZERO {
        if policy.strict_price_floor {
            return Err(PricingError::NegativePrice {
                unclamped_price: unclamped,
            });
        }
        tracing::warn!(
            base = %base_price,
            unclamped = %unclamped,
            "Stacked discounts exceed the price, clamping to zero"
        );
        (
            Decimal::ZERO,
            Some(PriceClamp {
                unclamped_price: unclamped,
            }),
        )
    } else {
        (unclamped, None)
    };

    Ok(PriceBreakdown {
        base_price,
        fuel_surcharge_applied,
        volume_discount_applied,
        promotional_discount_applied,
        final_price,
        clamp,
    })
}

fn check_percentage(
    component: AdjustmentKind,
    value: Decimal,
    max: Option<Decimal>,
) -> Result<(), PricingError> {
    let above_max = max.map(|max| value > max).unwrap_or(false);
    if value < Decimal::ZERO || above_max {
        return Err(PricingError::InvalidDiscount { component, value });
    }
    Ok(())
}

/// `pct` percent of `amount`, rounded to `scale`; `None` on overflow.
fn share(amount: Decimal, pct: Decimal, scale: u32) -> Option<Decimal> {
    amount
        .checked_mul(pct)?
        .checked_div(Decimal::ONE_HUNDRED)
        .map(|value| round_money(value, scale))
}

pub fn round_money(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

fn overflow(operation: &str) -> PricingError {
    PricingError::AmountOverflow {
        operation: operation.to_string(),
    }
}
