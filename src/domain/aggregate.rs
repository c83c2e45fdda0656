// Aggregation - folds resolved observations into (temporal key, category) buckets
use super::record::RawRecord;
use super::resolver::{
    resolve_category, resolve_magnitude, resolve_temporal_key, CategoryAxis, Granularity,
};
use std::collections::{BTreeMap, BTreeSet};

/// Column of the yearly totals series, as read by the year-over-year chart.
pub const YEARLY_COLUMN: &str = "emission";
/// Column of the hotspot ranking, as read by the hotspot donut.
pub const HOTSPOT_COLUMN: &str = "total_emission";
/// Temporal key used when a mode has no time axis.
pub const ALL_TIME_KEY: &str = "all";
/// Activity bucket for records that name no activity.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationMode {
    YearlyTotal,
    YearMonthByScope,
    ActivityTotal,
}

impl AggregationMode {
    pub fn granularity(self) -> Option<Granularity> {
        match self {
            AggregationMode::YearlyTotal => Some(Granularity::Year),
            AggregationMode::YearMonthByScope => Some(Granularity::Month),
            AggregationMode::ActivityTotal => None,
        }
    }

    pub fn axis(self) -> Option<CategoryAxis> {
        match self {
            AggregationMode::YearlyTotal => None,
            AggregationMode::YearMonthByScope => Some(CategoryAxis::Scope),
            AggregationMode::ActivityTotal => Some(CategoryAxis::Activity),
        }
    }

    /// Name of the row key field in materialized series.
    pub fn key_field(self) -> &'static str {
        match self {
            AggregationMode::YearlyTotal => "year",
            AggregationMode::YearMonthByScope => "date",
            AggregationMode::ActivityTotal => "activity",
        }
    }

    /// Bucket column for an observation's category, or `None` when the
    /// mode requires a category and the observation has none.
    fn bucket_category(self, category: Option<&str>) -> Option<String> {
        match self {
            AggregationMode::YearlyTotal => Some(YEARLY_COLUMN.to_string()),
            AggregationMode::YearMonthByScope => category.map(str::to_string),
            AggregationMode::ActivityTotal => {
                Some(category.unwrap_or(UNCATEGORIZED).to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObservation {
    pub temporal_key: String,
    pub category: Option<String>,
    /// Always finite and `>= 0`.
    pub magnitude: f64,
}

/// Outcome of resolving one record for a given mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Observed(ResolvedObservation),
    /// No usable temporal key.
    Dropped,
    /// The mode requires a category the record does not carry.
    Excluded,
}

/// Resolves a raw record into an observation for `mode`.
pub fn observe(record: &RawRecord, mode: AggregationMode) -> Resolution {
    let temporal_key = match mode.granularity() {
        Some(granularity) => match resolve_temporal_key(record, granularity) {
            Some(key) => key,
            None => return Resolution::Dropped,
        },
        None => ALL_TIME_KEY.to_string(),
    };

    let category = mode.axis().and_then(|axis| resolve_category(record, axis));
    if mode.bucket_category(category.as_deref()).is_none() {
        return Resolution::Excluded;
    }

    Resolution::Observed(ResolvedObservation {
        temporal_key,
        category,
        magnitude: resolve_magnitude(record),
    })
}

/// Accumulator for one (temporal key, category) pair.
///
/// Contributions are buffered until [`AggregateBucket::seal`], which sums
/// them in sorted order and releases the buffer. The sorted sum is
/// independent of input order down to the last bit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateBucket {
    pending: Vec<f64>,
    total: f64,
}

impl AggregateBucket {
    fn add(&mut self, magnitude: f64) {
        self.pending.push(magnitude);
    }

    fn seal(&mut self) {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by(f64::total_cmp);
        self.total += pending.iter().sum::<f64>();
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Buckets keyed by temporal key first, category second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    inner: BTreeMap<String, BTreeMap<String, AggregateBucket>>,
}

impl Buckets {
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn temporal_keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Union of categories across all temporal keys.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.inner
            .values()
            .flat_map(|by_category| by_category.keys().map(String::as_str))
            .collect()
    }

    /// Summed magnitude for a pair, `0` when the pair was never observed.
    pub fn total(&self, temporal_key: &str, category: &str) -> f64 {
        self.inner
            .get(temporal_key)
            .and_then(|by_category| by_category.get(category))
            .map(AggregateBucket::total)
            .unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn totals(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.inner
            .iter()
            .map(|(key, by_category)| {
                let totals = by_category
                    .iter()
                    .map(|(category, bucket)| (category.clone(), bucket.total()))
                    .collect();
                (key.clone(), totals)
            })
            .collect()
    }

    fn add(&mut self, temporal_key: String, category: String, magnitude: f64) {
        self.inner
            .entry(temporal_key)
            .or_default()
            .entry(category)
            .or_default()
            .add(magnitude);
    }

    fn seal(&mut self) {
        for bucket in self.inner.values_mut().flat_map(BTreeMap::values_mut) {
            bucket.seal();
        }
    }
}

/// Folds observations into buckets for `mode`.
///
/// Observations without a category are skipped for modes that need one.
/// Activity mode collapses every observation onto [`ALL_TIME_KEY`].
pub fn aggregate<I>(observations: I, mode: AggregationMode) -> Buckets
where
    I: IntoIterator<Item = ResolvedObservation>,
{
    let mut buckets = Buckets::default();

    for observation in observations {
        let Some(category) = mode.bucket_category(observation.category.as_deref()) else {
            continue;
        };
        let temporal_key = match mode.granularity() {
            Some(_) => observation.temporal_key,
            None => ALL_TIME_KEY.to_string(),
        };
        buckets.add(temporal_key, category, observation.magnitude);
    }
    buckets.seal();

    buckets
}
