//! Risk scoring strategies and the normalization applied to their output

use crate::data::CustomerRecord;
use ndarray::Array1;

/// Lowest probability a scored customer can carry after clipping
pub const MIN_PROBABILITY: f64 = 0.05;
/// Highest probability a scored customer can carry after clipping
pub const MAX_PROBABILITY: f64 = 0.95;
/// Normalized value used when every raw score is identical
pub const DEGENERATE_PROBABILITY: f64 = 0.5;

/// Contract label that raises the simulated risk
pub const MONTH_TO_MONTH: &str = "Month-to-month";

/// A source of raw, unnormalized risk scores.
///
/// Implementations only rank customers against each other; the scores are
/// min-max normalized over the whole table and clipped afterwards, so their
/// absolute scale does not matter.
pub trait RiskModel {
    fn name(&self) -> &str;

    fn raw_score(&self, record: &CustomerRecord) -> f64;
}

/// Placeholder scoring formula standing in for a trained model
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedRiskModel;

impl RiskModel for SimulatedRiskModel {
    fn name(&self) -> &str {
        "simulated"
    }

    fn raw_score(&self, record: &CustomerRecord) -> f64 {
        let total = record.total_charges.unwrap_or(0.0);
        let month_to_month = if record.contract == MONTH_TO_MONTH { 1.0 } else { 0.0 };

        (total / 10_000.0 + f64::from(record.tenure) / 100.0 - month_to_month * 0.3).abs()
    }
}

/// Compute raw scores for every record with the given model
pub fn raw_scores(records: &[CustomerRecord], model: &dyn RiskModel) -> Array1<f64> {
    records.iter().map(|record| model.raw_score(record)).collect()
}

/// Rescale values linearly so the minimum maps to 0 and the maximum to 1
///
/// Only finite values take part in the min/max; NaN and infinite entries map
/// to 0. A zero-width input (all values equal, or a single value) maps every
/// entry to [`DEGENERATE_PROBABILITY`].
pub fn min_max_normalize(raw: &Array1<f64>) -> Array1<f64> {
    let finite = raw.iter().copied().filter(|value| value.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
        (lo.min(value), hi.max(value))
    });
    let span = max - min;

    if !span.is_finite() || span <= 0.0 {
        return Array1::from_elem(raw.len(), DEGENERATE_PROBABILITY);
    }

    raw.mapv(|value| {
        if value.is_finite() {
            (value - min) / span
        } else {
            0.0
        }
    })
}

/// Clamp a normalized score into the displayable probability band
pub fn clip_probability(value: f64) -> f64 {
    value.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

/// Full scoring pipeline: raw scores, normalization, clipping
pub fn score_probabilities(records: &[CustomerRecord], model: &dyn RiskModel) -> Array1<f64> {
    let normalized = min_max_normalize(&raw_scores(records, model));
    normalized.mapv(clip_probability)
}
