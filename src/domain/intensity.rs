// Emission intensity - emissions per unit of business activity
use super::record::RawRecord;
use super::resolver::{resolve_magnitude, resolve_number, METRIC_VALUE_FIELDS};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Intensity {
    /// kgCO2e per unit; `None` when there is no business metric to divide by.
    pub intensity: Option<f64>,
    pub emissions: f64,
    pub metric_total: f64,
}

/// Total emissions over the total business metric value, rounded to 2 decimals.
pub fn compute_intensity(emissions: &[RawRecord], metrics: &[RawRecord]) -> Intensity {
    let emissions_total = sorted_sum(emissions.iter().map(resolve_magnitude));
    let metric_total = sorted_sum(metrics.iter().map(|r| resolve_number(r, METRIC_VALUE_FIELDS)));

    let intensity = (metric_total > 0.0).then(|| round2(emissions_total / metric_total));

    Intensity {
        intensity,
        emissions: emissions_total,
        metric_total,
    }
}

fn sorted_sum(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.iter().sum()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
