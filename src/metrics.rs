//! Per-row revenue and yield derivation.

use crate::error::{PipelineError, Result};
use crate::model::{EnrichedRecord, OperationalRecord, SurveyRecord};

/// VAT share deducted from revenue to obtain yield.
pub const DEFAULT_VAT_RATE: f64 = 0.20;

/// Validated VAT rate in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VatRate(f64);

impl VatRate {
    pub fn new(rate: f64) -> Result<Self> {
        if rate.is_finite() && (0.0..1.0).contains(&rate) {
            Ok(Self(rate))
        } else {
            Err(PipelineError::InvalidVatRate(rate))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for VatRate {
    fn default() -> Self {
        Self(DEFAULT_VAT_RATE)
    }
}

/// `price_paid × trip_count`.
pub fn revenue(price_paid: f64, trip_count: u32) -> f64 {
    price_paid * f64::from(trip_count)
}

/// Revenue net of VAT.
pub fn yield_amount(revenue: f64, vat: VatRate) -> f64 {
    revenue * (1.0 - vat.value())
}

/// Divides a yield by an operational quantity. A missing or zero divisor
/// yields `None`, which the aggregator treats as non-aggregable.
pub fn per_unit(yield_amount: f64, divisor: Option<f64>) -> Option<f64> {
    let divisor = divisor?;
    if divisor == 0.0 {
        return None;
    }
    let ratio = yield_amount / divisor;
    ratio.is_finite().then_some(ratio)
}

/// Derives the revenue metrics for one joined row.
pub fn enrich(
    survey: SurveyRecord,
    operational: Option<OperationalRecord>,
    vat: VatRate,
) -> EnrichedRecord {
    let revenue = revenue(survey.price_paid, survey.trip_count);
    let yield_amount = yield_amount(revenue, vat);

    let (yield_per_km, yield_per_vehicle) = match &operational {
        Some(op) => (
            per_unit(yield_amount, op.kilometers_operated),
            per_unit(yield_amount, op.vehicle_count.map(f64::from)),
        ),
        None => (None, None),
    };

    EnrichedRecord {
        survey,
        operational,
        revenue,
        yield_amount,
        yield_per_km,
        yield_per_vehicle,
    }
}
