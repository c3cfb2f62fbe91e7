use crate::core::adjustments::round_money;
use crate::domain::quote::{MarginPercentage, MarginSummary, PricingPolicy};
use crate::utils::error::PricingError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Margin against the price charged, not against cost. A zero price yields
/// the `NotApplicable` sentinel instead of a division by zero.
pub fn compute_margin(
    final_price: Decimal,
    purchase_price: Decimal,
    policy: &PricingPolicy,
) -> Result<MarginSummary, PricingError> {
    let overflow = |operation: &str| PricingError::AmountOverflow {
        operation: operation.to_string(),
    };

    let margin = final_price
        .checked_sub(purchase_price)
        .map(|margin| round_money(margin, policy.currency_scale))
        .ok_or_else(|| overflow("margin"))?;

    let percentage = if final_price.is_zero() {
        MarginPercentage::NotApplicable
    } else {
        let ratio = margin
            .checked_div(final_price)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| overflow("margin percentage"))?;
        MarginPercentage::Percent(ratio.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    };

    Ok(MarginSummary {
        margin,
        percentage,
        class: policy.margin_thresholds.classify(margin),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quote::MarginClass;

    fn margin_of(final_price: Decimal, purchase_price: Decimal) -> MarginSummary {
        compute_margin(final_price, purchase_price, &PricingPolicy::default()).unwrap()
    }

    #[test]
    fn test_margin_relative_to_price_charged() {
        let summary = margin_of(Decimal::new(700, 2), Decimal::new(560, 2));
        assert_eq!(summary.margin, Decimal::new(140, 2));
        assert_eq!(summary.percentage, MarginPercentage::Percent(Decimal::from(20)));
        assert_eq!(summary.class, MarginClass::Low);
    }

    #[test]
    fn test_zero_price_yields_sentinel() {
        let summary = margin_of(Decimal::ZERO, Decimal::new(560, 2));
        assert_eq!(summary.percentage, MarginPercentage::NotApplicable);
        assert_eq!(summary.margin, Decimal::new(-560, 2));
    }

    #[test]
    fn test_negative_margin_percentage() {
        let summary = margin_of(Decimal::from(8), Decimal::from(10));
        assert_eq!(summary.percentage, MarginPercentage::Percent(Decimal::from(-25)));
    }

    #[test]
    fn test_margin_rounded_to_currency_scale() {
        // purchase price carries a third decimal from the catalog
        let summary = margin_of(Decimal::new(701, 2), Decimal::new(5595, 3));
        assert_eq!(summary.margin, Decimal::new(142, 2));
    }

    #[test]
    fn test_classification_uses_absolute_margin() {
        assert_eq!(margin_of(Decimal::from(40), Decimal::from(30)).class, MarginClass::High);
        assert_eq!(margin_of(Decimal::from(40), Decimal::from(34)).class, MarginClass::Medium);
    }

    #[test]
    fn test_ratio_overflow_is_an_error() {
        let err = compute_margin(
            Decimal::new(1, 4),
            Decimal::from_i128_with_scale(10_i128.pow(25), 0),
            &PricingPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "amount_overflow");
    }
}
