use crate::domain::catalog::{BandBounds, RateBand};
use crate::utils::error::PricingError;
use rust_decimal::Decimal;

/// Active weight bands of one service, sorted and checked for gaps and
/// overlaps. Immutable after `build`; a catalog change builds a new index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandIndex {
    service_id: String,
    bands: Vec<RateBand>,
}

impl BandIndex {
    /// Inactive bands are dropped before the gap check, so deactivating a
    /// middle band leaves a gap and the whole service fails with
    /// `InvalidBandSet` instead of only the weights that band covered.
    /// To withdraw a tier, replace it with an adjacent band's price.
    pub fn build<I>(service_id: &str, bands: I) -> Result<Self, PricingError>
    where
        I: IntoIterator<Item = RateBand>,
    {
        let invalid = |reason: String| PricingError::InvalidBandSet {
            service_id: service_id.to_string(),
            reason,
        };

        let mut bands: Vec<RateBand> = bands.into_iter().filter(|b| b.is_active).collect();
        if bands.is_empty() {
            return Err(invalid("no active rate bands".to_string()));
        }

        for band in &bands {
            if band.weight_min < Decimal::ZERO {
                return Err(invalid(format!(
                    "band {} starts below zero",
                    band.bounds()
                )));
            }
            if band.weight_min >= band.weight_max {
                return Err(invalid(format!("band {} is empty", band.bounds())));
            }
        }

        bands.sort_by(|a, b| a.weight_min.cmp(&b.weight_min));

        for pair in bands.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.weight_min < lower.weight_max {
                return Err(invalid(format!(
                    "bands {} and {} overlap",
                    lower.bounds(),
                    upper.bounds()
                )));
            }
            if upper.weight_min > lower.weight_max {
                return Err(invalid(format!(
                    "gap between {} and {}",
                    lower.bounds(),
                    upper.bounds()
                )));
            }
        }

        Ok(Self {
            service_id: service_id.to_string(),
            bands,
        })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn bands(&self) -> &[RateBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// `[lowest weight_min, highest weight_max)`.
    pub fn coverage(&self) -> BandBounds {
        // build() guarantees at least one band
        BandBounds {
            weight_min: self.bands[0].weight_min,
            weight_max: self.bands[self.bands.len() - 1].weight_max,
        }
    }

    /// Binary search for the band with `weight_min <= weight < weight_max`.
    pub fn find_band(&self, weight: Decimal) -> Result<&RateBand, PricingError> {
        let idx = self.bands.partition_point(|b| b.weight_min <= weight);
        if idx > 0 {
            let band = &self.bands[idx - 1];
            if weight < band.weight_max {
                return Ok(band);
            }
        }

        Err(PricingError::NoBandForWeight {
            service_id: self.service_id.clone(),
            weight,
            covered: self.coverage(),
            nearest: self.nearest(weight),
        })
    }

    fn nearest(&self, weight: Decimal) -> BandBounds {
        let first = &self.bands[0];
        if weight < first.weight_min {
            first.bounds()
        } else {
            self.bands[self.bands.len() - 1].bounds()
        }
    }
}
