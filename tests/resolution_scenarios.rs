use rate_engine::utils::error::ResolutionStep;
use rate_engine::{
    Catalog, CatalogSnapshot, MarginPercentage, PricingError, PricingPolicy, RateResolver,
    ResolutionRequest,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn catalog(fuel_surcharge_pct: &str, carrier_active: bool) -> Catalog {
    serde_json::from_value(serde_json::json!({
        "carriers": [
            {"id": "gls", "name": "GLS", "fuel_surcharge_pct": fuel_surcharge_pct, "is_active": carrier_active}
        ],
        "services": [
            {
                "id": "std",
                "carrier_id": "gls",
                "code": "STD",
                "name": "Standard",
                "volume_discount": {"minimum_volume": "10", "percentage": "60"}
            }
        ],
        "rates": [
            {"service_id": "std", "weight_min": "0", "weight_max": "2", "purchase_price": "5.60", "retail_price": "7.00"},
            {"service_id": "std", "weight_min": "2", "weight_max": "5", "purchase_price": "6.10", "retail_price": "8.50"},
            {"service_id": "std", "weight_min": "5", "weight_max": "10", "purchase_price": "8.00", "retail_price": "11.00"}
        ]
    }))
    .unwrap()
}

fn resolver_with(catalog: Catalog, policy: PricingPolicy) -> RateResolver {
    RateResolver::new(Arc::new(CatalogSnapshot::build(catalog)), policy)
}

fn resolver(fuel_surcharge_pct: &str) -> RateResolver {
    resolver_with(catalog(fuel_surcharge_pct, true), PricingPolicy::default())
}

#[test]
fn test_plain_band_price() {
    let quote = resolver("0")
        .resolve(&ResolutionRequest::new("std", dec!(1)))
        .unwrap();

    assert_eq!(quote.pricing.base_price, dec!(7.00));
    assert_eq!(quote.final_price(), dec!(7.00));
    assert_eq!(quote.margin.margin, dec!(1.40));
    assert_eq!(quote.margin.percentage, MarginPercentage::Percent(dec!(20)));
    assert!(quote.notices.is_empty());
}

#[test]
fn test_fuel_surcharge_applied_to_band_price() {
    let quote = resolver("10")
        .resolve(&ResolutionRequest::new("std", dec!(1)))
        .unwrap();

    assert_eq!(quote.pricing.base_price, dec!(7.00));
    assert_eq!(quote.pricing.fuel_surcharge_applied, dec!(0.70));
    assert_eq!(quote.final_price(), dec!(7.70));
    assert_eq!(quote.margin.margin, dec!(2.10));
    assert_eq!(quote.margin.percentage, MarginPercentage::Percent(dec!(27.27)));
}

#[test]
fn test_weight_beyond_last_band_fails_at_band_lookup() {
    let failure = resolver("0")
        .resolve(&ResolutionRequest::new("std", dec!(15)))
        .unwrap_err();

    assert_eq!(failure.step, ResolutionStep::BandLookup);
    match failure.error {
        PricingError::NoBandForWeight {
            weight,
            covered,
            nearest,
            ..
        } => {
            assert_eq!(weight, dec!(15));
            assert_eq!(covered.weight_min, Decimal::ZERO);
            assert_eq!(covered.weight_max, dec!(10));
            assert_eq!(nearest.weight_max, dec!(10));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_upper_bound_is_exclusive() {
    let quote = resolver("0")
        .resolve(&ResolutionRequest::new("std", dec!(2)))
        .unwrap();
    assert_eq!(quote.band.weight_min, dec!(2));
    assert_eq!(quote.final_price(), dec!(8.50));

    let failure = resolver("0")
        .resolve(&ResolutionRequest::new("std", dec!(10)))
        .unwrap_err();
    assert_eq!(failure.kind(), "no_band_for_weight");
}

#[test]
fn test_promotion_over_hundred_percent_is_rejected() {
    let failure = resolver("0")
        .resolve(&ResolutionRequest::new("std", dec!(1)).with_promotion(dec!(150)))
        .unwrap_err();

    assert_eq!(failure.step, ResolutionStep::Adjustments);
    assert!(matches!(
        failure.error,
        PricingError::InvalidDiscount { value, .. } if value == dec!(150)
    ));
}

#[test]
fn test_inactive_carrier_blocks_every_quote() {
    let resolver = resolver_with(catalog("0", false), PricingPolicy::default());

    for weight in [dec!(0), dec!(1), dec!(4.5), dec!(9.99)] {
        let failure = resolver
            .resolve(&ResolutionRequest::new("std", weight))
            .unwrap_err();
        assert_eq!(failure.step, ResolutionStep::CarrierCheck);
        assert_eq!(failure.kind(), "carrier_inactive");
    }
}

#[test]
fn test_resolution_is_idempotent() {
    let resolver = resolver("10");
    let request = ResolutionRequest::new("std", dec!(3))
        .with_volume(dec!(12))
        .with_promotion(dec!(5));

    let first = resolver.resolve(&request).unwrap();
    let second = resolver.resolve(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_stacked_discounts_clamp_to_zero_with_sentinel() {
    let quote = resolver("0")
        .resolve(
            &ResolutionRequest::new("std", dec!(1))
                .with_volume(dec!(10))
                .with_promotion(dec!(50)),
        )
        .unwrap();

    assert_eq!(quote.pricing.volume_discount_applied, dec!(4.20));
    assert_eq!(quote.pricing.promotional_discount_applied, dec!(3.50));
    assert_eq!(quote.final_price(), Decimal::ZERO);
    assert!(quote.was_clamped());
    assert_eq!(quote.pricing.clamp.unwrap().unclamped_price, dec!(-0.70));
    assert_eq!(quote.margin.percentage, MarginPercentage::NotApplicable);
    assert_eq!(quote.margin.percentage.to_string(), "n/a");
}

#[test]
fn test_strict_floor_rejects_instead_of_clamping() {
    let policy = PricingPolicy {
        strict_price_floor: true,
        ..PricingPolicy::default()
    };
    let failure = resolver_with(catalog("0", true), policy)
        .resolve(
            &ResolutionRequest::new("std", dec!(1))
                .with_volume(dec!(10))
                .with_promotion(dec!(50)),
        )
        .unwrap_err();

    assert_eq!(failure.step, ResolutionStep::Adjustments);
    assert!(matches!(
        failure.error,
        PricingError::NegativePrice { unclamped_price } if unclamped_price == dec!(-0.70)
    ));
}

#[test]
fn test_failure_report_names_step_and_kind() {
    let failure = resolver("0")
        .resolve(&ResolutionRequest::new("express", dec!(1)))
        .unwrap_err();

    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json["step_failed"], "service_lookup");
    assert_eq!(json["error_kind"], "unknown_service");
    assert!(json["message"].as_str().unwrap().contains("express"));
}

#[test]
fn test_issued_quote_survives_catalog_changes() {
    let resolver = resolver("0");
    let quote = resolver
        .resolve(&ResolutionRequest::new("std", dec!(1)))
        .unwrap();

    let updated = resolver_with(catalog("25", true), PricingPolicy::default());
    let repriced = updated
        .resolve(&ResolutionRequest::new("std", dec!(1)))
        .unwrap();

    assert_eq!(quote.final_price(), dec!(7.00));
    assert_eq!(repriced.final_price(), dec!(8.75));
}

fn single_band_catalog(fuel_surcharge_pct: &str, purchase: &str, retail: &str) -> Catalog {
    serde_json::from_value(serde_json::json!({
        "carriers": [{"id": "gls", "name": "GLS", "fuel_surcharge_pct": fuel_surcharge_pct}],
        "services": [{"id": "std", "carrier_id": "gls", "code": "STD", "name": "Standard"}],
        "rates": [
            {"service_id": "std", "weight_min": "0", "weight_max": "2", "purchase_price": purchase, "retail_price": retail}
        ]
    }))
    .unwrap()
}

#[test]
fn test_surcharge_overflow_fails_instead_of_panicking() {
    let resolver = resolver_with(
        single_band_catalog("1000", "1", "10000000000000000000000000000"),
        PricingPolicy::default(),
    );

    let failure = resolver
        .resolve(&ResolutionRequest::new("std", dec!(1)))
        .unwrap_err();
    assert_eq!(failure.step, ResolutionStep::Adjustments);
    assert_eq!(failure.kind(), "amount_overflow");

    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json["error_kind"], "amount_overflow");
}

#[test]
fn test_margin_overflow_fails_instead_of_panicking() {
    let resolver = resolver_with(
        single_band_catalog("0", "1000000000000000000000000000", "0.01"),
        PricingPolicy::default(),
    );

    let failure = resolver
        .resolve(&ResolutionRequest::new("std", dec!(1)))
        .unwrap_err();
    assert_eq!(failure.step, ResolutionStep::Margin);
    assert_eq!(failure.kind(), "amount_overflow");
}

#[test]
fn test_sub_cent_retail_price_rounds_before_pricing() {
    let quote = resolver_with(single_band_catalog("0", "5.60", "7.005"), PricingPolicy::default())
        .resolve(&ResolutionRequest::new("std", dec!(1)))
        .unwrap();

    assert_eq!(quote.pricing.base_price, dec!(7.01));
    assert_eq!(quote.final_price(), dec!(7.01));
    assert_eq!(quote.margin.margin, dec!(1.41));
    assert_eq!(quote.margin.percentage, MarginPercentage::Percent(dec!(20.11)));
    // the issued quote keeps the catalog band as published
    assert_eq!(quote.band.retail_price, dec!(7.005));
}
