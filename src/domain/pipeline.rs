// Analytics pipeline - intake, resolution, aggregation, materialization
use super::aggregate::{aggregate, observe, AggregationMode, Resolution};
use super::record::RawRecord;
use super::series::{materialize, ChartSeries};
use serde::Serialize;

/// Counters describing what happened to the input records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub records_seen: usize,
    /// Records with no usable temporal key.
    pub records_dropped: usize,
    /// Records missing a category the mode requires.
    pub observations_excluded: usize,
}

/// Runs the full pipeline for one mode over already adapted records.
pub fn run(
    records: &[RawRecord],
    mode: AggregationMode,
    top_n: Option<usize>,
) -> (ChartSeries, PipelineReport) {
    let mut report = PipelineReport {
        records_seen: records.len(),
        ..Default::default()
    };

    let mut observations = Vec::with_capacity(records.len());
    for record in records {
        match observe(record, mode) {
            Resolution::Observed(observation) => observations.push(observation),
            Resolution::Dropped => report.records_dropped += 1,
            Resolution::Excluded => report.observations_excluded += 1,
        }
    }

    let buckets = aggregate(observations, mode);
    (materialize(&buckets, mode, top_n), report)
}
