use crate::domain::quote::{MarginClass, Quote, ResolutionRequest};
use crate::utils::error::ResolutionFailure;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a batch request file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub reference: String,
    pub request: ResolutionRequest,
}

#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub reference: String,
    pub service_id: String,
    pub result: std::result::Result<Quote, ResolutionFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Utc>,
    pub requested: usize,
    pub quoted: usize,
    pub failed: usize,
    pub clamped: usize,
    pub total_revenue: Decimal,
    pub total_margin: Decimal,
    pub margin_classes: BTreeMap<MarginClass, usize>,
    pub failures_by_kind: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[QuoteOutcome], generated_at: DateTime<Utc>) -> Self {
        let mut summary = BatchSummary {
            generated_at,
            requested: outcomes.len(),
            ..Default::default()
        };

        for outcome in outcomes {
            match &outcome.result {
                Ok(quote) => {
                    summary.quoted += 1;
                    if quote.was_clamped() {
                        summary.clamped += 1;
                    }
                    summary.total_revenue += quote.final_price();
                    summary.total_margin += quote.margin.margin;
                    *summary.margin_classes.entry(quote.margin.class).or_insert(0) += 1;
                }
                Err(failure) => {
                    summary.failed += 1;
                    *summary
                        .failures_by_kind
                        .entry(failure.kind().to_string())
                        .or_insert(0) += 1;
                }
            }
        }

        summary
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub outcomes: Vec<QuoteOutcome>,
    pub quotes_csv: String,
    pub failures_csv: String,
    pub summary: BatchSummary,
}
